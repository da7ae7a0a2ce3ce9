//! SQLite-backed document store.
//!
//! Every record lives in the `documents` table as JSON text keyed by
//! `(collection, id)`; field queries use SQLite's `json_extract`.

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

use super::documents::{is_valid_field, BatchOp, Collection, DocumentStore, WriteBatch};
use super::{data_dir, migrations, Config};
use crate::error::{CoreError, DatabaseError, Result};

/// SQLite database holding every collection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database file named in `config` inside the data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_at(data_dir()?.join(&config.storage.database_file))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn parse_body(collection: Collection, id: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|source| {
        CoreError::from(DatabaseError::CorruptDocument {
            collection: collection.as_str(),
            id: id.to_string(),
            source,
        })
    })
}

fn collect_rows(
    collection: Collection,
    rows: impl Iterator<Item = rusqlite::Result<(String, String)>>,
) -> Result<Vec<(String, Value)>> {
    let mut docs = Vec::new();
    for row in rows {
        let (id, body) = row?;
        let value = parse_body(collection, &id, &body)?;
        docs.push((id, value));
    }
    Ok(docs)
}

fn upsert(conn: &Connection, collection: Collection, id: &str, body: &Value) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO documents (collection, id, body, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![
            collection.as_str(),
            id,
            body.to_string(),
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

impl DocumentStore for Database {
    fn get_raw(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| parse_body(collection, id, &b)).transpose()
    }

    fn put_raw(&self, collection: Collection, id: &str, body: &Value) -> Result<()> {
        upsert(&self.conn, collection, id, body)?;
        Ok(())
    }

    fn delete_raw(&self, collection: Collection, id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection.as_str(), id],
        )?;
        Ok(n > 0)
    }

    fn list_raw(&self, collection: Collection) -> Result<Vec<(String, Value)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![collection.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        collect_rows(collection, rows)
    }

    fn query_raw(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>> {
        if !is_valid_field(field) {
            return Err(DatabaseError::InvalidField(field.to_string()).into());
        }

        // The path is spliced in so expression indexes on json_extract can match.
        let (sql, bound) = match value {
            Value::Null => (
                format!(
                    "SELECT id, body FROM documents
                     WHERE collection = ?1 AND json_extract(body, '$.{field}') IS NULL
                     ORDER BY id"
                ),
                None,
            ),
            other => (
                format!(
                    "SELECT id, body FROM documents
                     WHERE collection = ?1 AND json_extract(body, '$.{field}') = ?2
                     ORDER BY id"
                ),
                Some(to_sql_value(other)),
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        };
        match bound {
            Some(v) => {
                let rows = stmt.query_map(params![collection.as_str(), v], map_row)?;
                collect_rows(collection, rows)
            }
            None => {
                let rows = stmt.query_map(params![collection.as_str()], map_row)?;
                collect_rows(collection, rows)
            }
        }
    }

    fn count(&self, collection: Collection) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    fn clear(&self, collection: Collection) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection.as_str()],
        )?;
        Ok(n)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put {
                    collection,
                    id,
                    body,
                } => upsert(&tx, collection, &id, &body)?,
                BatchOp::Delete { collection, id } => {
                    tx.execute(
                        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                        params![collection.as_str(), id],
                    )?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_get_overwrite() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_raw(Collection::Users, "u1").unwrap().is_none());

        db.put_raw(Collection::Users, "u1", &json!({"id": "u1", "name": "A"}))
            .unwrap();
        db.put_raw(Collection::Users, "u1", &json!({"id": "u1", "name": "B"}))
            .unwrap();

        let doc = db.get_raw(Collection::Users, "u1").unwrap().unwrap();
        assert_eq!(doc["name"], "B");
        assert_eq!(db.count(Collection::Users).unwrap(), 1);
    }

    #[test]
    fn collections_are_isolated() {
        let db = Database::open_memory().unwrap();
        db.put_raw(Collection::Users, "x", &json!({"id": "x"})).unwrap();
        assert!(db.get_raw(Collection::Positions, "x").unwrap().is_none());
        assert_eq!(db.clear(Collection::Positions).unwrap(), 0);
        assert_eq!(db.clear(Collection::Users).unwrap(), 1);
    }

    #[test]
    fn query_by_string_bool_and_null() {
        let db = Database::open_memory().unwrap();
        db.put_raw(
            Collection::Users,
            "a",
            &json!({"id": "a", "department_id": "legal", "is_supervisor": true, "supervisor_id": null}),
        )
        .unwrap();
        db.put_raw(
            Collection::Users,
            "b",
            &json!({"id": "b", "department_id": "legal", "is_supervisor": false, "supervisor_id": "a"}),
        )
        .unwrap();
        db.put_raw(
            Collection::Users,
            "c",
            &json!({"id": "c", "department_id": "fag", "is_supervisor": false, "supervisor_id": "a"}),
        )
        .unwrap();

        let legal = db
            .query_raw(Collection::Users, "department_id", &json!("legal"))
            .unwrap();
        assert_eq!(legal.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(), ["a", "b"]);

        let sups = db
            .query_raw(Collection::Users, "is_supervisor", &json!(true))
            .unwrap();
        assert_eq!(sups.len(), 1);

        let top = db
            .query_raw(Collection::Users, "supervisor_id", &Value::Null)
            .unwrap();
        assert_eq!(top[0].0, "a");
    }

    #[test]
    fn query_rejects_path_injection() {
        let db = Database::open_memory().unwrap();
        let err = db
            .query_raw(Collection::Users, "a' OR '1'='1", &json!("x"))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid query field"));
    }

    #[test]
    fn commit_applies_puts_and_deletes() {
        use crate::storage::DocumentStoreExt;

        let db = Database::open_memory().unwrap();
        db.put_raw(Collection::AssessmentRatings, "old", &json!({"id": "old"}))
            .unwrap();

        let mut batch = WriteBatch::new();
        batch.delete::<crate::model::Rating>("old");
        let now = Utc::now();
        let rating = crate::model::Rating::pending_peer("a1", "p1", now);
        batch.put(&rating).unwrap();
        db.commit(batch).unwrap();

        assert!(db.get_raw(Collection::AssessmentRatings, "old").unwrap().is_none());
        let stored: crate::model::Rating = db.get(&rating.id).unwrap().unwrap();
        assert_eq!(stored.rater_id, "p1");
    }

    #[test]
    fn file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.put_raw(Collection::Departments, "d", &json!({"id": "d"}))
                .unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert!(db.get_raw(Collection::Departments, "d").unwrap().is_some());
    }
}
