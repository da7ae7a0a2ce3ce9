//! Embedded reference catalog: competencies, positions, departments and
//! org-unit mappings, plus seeding into a document store.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Competency, Department, OrgUnitMapping, Position};
use crate::storage::{Collection, Document, DocumentStore, WriteBatch};

const CATALOG_JSON: &str = include_str!("../../data/catalog.json");

/// Collections owned by the catalog.
pub const CATALOG_COLLECTIONS: [Collection; 4] = [
    Collection::Competencies,
    Collection::Positions,
    Collection::Departments,
    Collection::OrgUnitMappings,
];

/// The reference data shipped with the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub competencies: Vec<Competency>,
    pub positions: Vec<Position>,
    pub departments: Vec<Department>,
    pub org_units: Vec<OrgUnitMapping>,
}

impl Catalog {
    /// Parse the embedded catalog.
    pub fn embedded() -> Result<Self> {
        Ok(serde_json::from_str(CATALOG_JSON)?)
    }
}

/// Documents written per catalog collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub competencies: usize,
    pub positions: usize,
    pub departments: usize,
    pub org_unit_mappings: usize,
}

impl SeedSummary {
    pub fn total(&self) -> usize {
        self.competencies + self.positions + self.departments + self.org_unit_mappings
    }
}

fn put_all<T: Document>(batch: &mut WriteBatch, docs: &[T]) -> Result<usize> {
    for doc in docs {
        batch.put(doc)?;
    }
    Ok(docs.len())
}

/// Fill every empty catalog collection. Collections that already hold data are left alone.
pub fn seed<S: DocumentStore + ?Sized>(store: &S, catalog: &Catalog) -> Result<SeedSummary> {
    let mut batch = WriteBatch::new();
    let mut summary = SeedSummary::default();

    if store.count(Collection::Competencies)? == 0 {
        summary.competencies = put_all(&mut batch, &catalog.competencies)?;
    }
    if store.count(Collection::Positions)? == 0 {
        summary.positions = put_all(&mut batch, &catalog.positions)?;
    }
    if store.count(Collection::Departments)? == 0 {
        summary.departments = put_all(&mut batch, &catalog.departments)?;
    }
    if store.count(Collection::OrgUnitMappings)? == 0 {
        summary.org_unit_mappings = put_all(&mut batch, &catalog.org_units)?;
    }

    if batch.is_empty() {
        tracing::debug!("catalog already seeded");
        return Ok(summary);
    }
    store.commit(batch)?;
    tracing::info!(documents = summary.total(), "seeded catalog");
    Ok(summary)
}

/// Replace the catalog collections with `catalog` in one transaction.
pub fn force_seed<S: DocumentStore + ?Sized>(store: &S, catalog: &Catalog) -> Result<SeedSummary> {
    let mut batch = WriteBatch::new();
    for collection in CATALOG_COLLECTIONS {
        for (id, _) in store.list_raw(collection)? {
            batch.delete_in(collection, &id);
        }
    }

    let summary = SeedSummary {
        competencies: put_all(&mut batch, &catalog.competencies)?,
        positions: put_all(&mut batch, &catalog.positions)?,
        departments: put_all(&mut batch, &catalog.departments)?,
        org_unit_mappings: put_all(&mut batch, &catalog.org_units)?,
    };
    store.commit(batch)?;
    tracing::info!(documents = summary.total(), "force-seeded catalog");
    Ok(summary)
}

/// Delete the catalog collections, returning how many documents each held.
pub fn clear<S: DocumentStore + ?Sized>(store: &S) -> Result<SeedSummary> {
    let summary = SeedSummary {
        competencies: store.clear(Collection::Competencies)?,
        positions: store.clear(Collection::Positions)?,
        departments: store.clear(Collection::Departments)?,
        org_unit_mappings: store.clear(Collection::OrgUnitMappings)?,
    };
    tracing::info!(documents = summary.total(), "cleared catalog");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CompetencyType;
    use crate::storage::{Database, DocumentStoreExt};

    #[test]
    fn embedded_catalog_shape() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.competencies.len(), 13);
        assert_eq!(catalog.positions.len(), 32);
        assert_eq!(catalog.departments.len(), 10);
        assert_eq!(catalog.org_units.len(), 6);

        let count = |t: CompetencyType| {
            catalog
                .competencies
                .iter()
                .filter(|c| c.competency_type == t)
                .count()
        };
        assert_eq!(count(CompetencyType::Core), 5);
        assert_eq!(count(CompetencyType::Leadership), 5);
        assert_eq!(count(CompetencyType::Functional), 3);
        assert!(catalog
            .competencies
            .iter()
            .all(|c| c.proficiency_levels.len() == 4));
    }

    #[test]
    fn positions_reference_known_departments_and_competencies() {
        let catalog = Catalog::embedded().unwrap();
        for position in &catalog.positions {
            assert!(
                catalog
                    .departments
                    .iter()
                    .any(|d| d.id == position.department_id),
                "{} has unknown department",
                position.id
            );
            for cid in &position.competency_ids {
                assert!(catalog.competencies.iter().any(|c| &c.id == cid));
            }
        }
        for dept in &catalog.departments {
            assert!(dept.min_peer_raters <= dept.max_peer_raters);
        }
    }

    #[test]
    fn seed_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let catalog = Catalog::embedded().unwrap();

        let first = seed(&db, &catalog).unwrap();
        assert_eq!(first.total(), 13 + 32 + 10 + 6);

        let second = seed(&db, &catalog).unwrap();
        assert_eq!(second.total(), 0);
        assert_eq!(db.count(Collection::Competencies).unwrap(), 13);
    }

    #[test]
    fn seed_fills_only_empty_collections() {
        let db = Database::open_memory().unwrap();
        let catalog = Catalog::embedded().unwrap();
        db.put(&catalog.positions[0]).unwrap();

        let summary = seed(&db, &catalog).unwrap();
        assert_eq!(summary.positions, 0);
        assert_eq!(summary.competencies, 13);
        assert_eq!(db.count(Collection::Positions).unwrap(), 1);
    }

    #[test]
    fn force_seed_restores_edited_data() {
        let db = Database::open_memory().unwrap();
        let catalog = Catalog::embedded().unwrap();
        seed(&db, &catalog).unwrap();

        let mut dept: Department = db.get("legal-unit").unwrap().unwrap();
        dept.max_peer_raters = 9;
        db.put(&dept).unwrap();
        db.put_raw(
            Collection::Positions,
            "stray",
            &serde_json::json!({"id": "stray"}),
        )
        .unwrap();

        force_seed(&db, &catalog).unwrap();
        let dept: Department = db.get("legal-unit").unwrap().unwrap();
        assert_eq!(dept.max_peer_raters, 3);
        assert!(db.get_raw(Collection::Positions, "stray").unwrap().is_none());
    }

    #[test]
    fn clear_leaves_non_catalog_collections() {
        let db = Database::open_memory().unwrap();
        seed(&db, &Catalog::embedded().unwrap()).unwrap();
        db.put_raw(Collection::Users, "u1", &serde_json::json!({"id": "u1"}))
            .unwrap();

        let removed = clear(&db).unwrap();
        assert_eq!(removed.departments, 10);
        for collection in CATALOG_COLLECTIONS {
            assert_eq!(db.count(collection).unwrap(), 0);
        }
        assert_eq!(db.count(Collection::Users).unwrap(), 1);
    }
}
