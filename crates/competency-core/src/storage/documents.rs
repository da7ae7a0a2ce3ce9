//! Document-store abstraction.
//!
//! Records are JSON documents addressed by `(collection, id)`. The base
//! [`DocumentStore`] trait works on raw JSON so it stays object safe; typed
//! access goes through [`DocumentStoreExt`], implemented for every store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, DatabaseError, Result};
use crate::model::{
    Assessment, AssessmentCycle, Competency, Department, DevelopmentPlan, OrgUnitMapping,
    Position, Rating, User,
};

/// Named collections of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Competencies,
    Positions,
    Departments,
    OrgUnitMappings,
    Users,
    AssessmentCycles,
    Assessments,
    AssessmentRatings,
    DevelopmentPlans,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Competencies,
        Collection::Positions,
        Collection::Departments,
        Collection::OrgUnitMappings,
        Collection::Users,
        Collection::AssessmentCycles,
        Collection::Assessments,
        Collection::AssessmentRatings,
        Collection::DevelopmentPlans,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Competencies => "competencies",
            Collection::Positions => "positions",
            Collection::Departments => "departments",
            Collection::OrgUnitMappings => "org_unit_mappings",
            Collection::Users => "users",
            Collection::AssessmentCycles => "assessment_cycles",
            Collection::Assessments => "assessments",
            Collection::AssessmentRatings => "assessment_ratings",
            Collection::DevelopmentPlans => "development_plans",
        }
    }
}

/// A record type stored in one collection.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

macro_rules! impl_document {
    ($($ty:ty => $collection:ident),* $(,)?) => {
        $(
            impl Document for $ty {
                const COLLECTION: Collection = Collection::$collection;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_document! {
    Competency => Competencies,
    Position => Positions,
    Department => Departments,
    OrgUnitMapping => OrgUnitMappings,
    User => Users,
    AssessmentCycle => AssessmentCycles,
    Assessment => Assessments,
    Rating => AssessmentRatings,
    DevelopmentPlan => DevelopmentPlans,
}

/// One write in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put {
        collection: Collection,
        id: String,
        body: Value,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

/// Writes applied atomically by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Document>(&mut self, doc: &T) -> Result<&mut Self> {
        self.ops.push(BatchOp::Put {
            collection: T::COLLECTION,
            id: doc.id().to_string(),
            body: serde_json::to_value(doc)?,
        });
        Ok(self)
    }

    pub fn delete<T: Document>(&mut self, id: &str) -> &mut Self {
        self.ops.push(BatchOp::Delete {
            collection: T::COLLECTION,
            id: id.to_string(),
        });
        self
    }

    /// Delete by collection name, for ids known only from raw listings.
    pub fn delete_in(&mut self, collection: Collection, id: &str) -> &mut Self {
        self.ops.push(BatchOp::Delete {
            collection,
            id: id.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Raw JSON document storage.
pub trait DocumentStore {
    fn get_raw(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Insert or overwrite.
    fn put_raw(&self, collection: Collection, id: &str, body: &Value) -> Result<()>;

    /// Returns whether a document was removed.
    fn delete_raw(&self, collection: Collection, id: &str) -> Result<bool>;

    /// All documents of a collection, ordered by id.
    fn list_raw(&self, collection: Collection) -> Result<Vec<(String, Value)>>;

    /// Documents whose top-level `field` equals `value`, ordered by id.
    fn query_raw(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>>;

    fn count(&self, collection: Collection) -> Result<usize>;

    /// Remove every document of a collection, returning how many were removed.
    fn clear(&self, collection: Collection) -> Result<usize>;

    /// Apply all writes or none.
    fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Typed helpers over any [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    fn get<T: Document>(&self, id: &str) -> Result<Option<T>> {
        self.get_raw(T::COLLECTION, id)?
            .map(|body| decode::<T>(id, body))
            .transpose()
    }

    fn put<T: Document>(&self, doc: &T) -> Result<()> {
        let body = serde_json::to_value(doc)?;
        self.put_raw(T::COLLECTION, doc.id(), &body)
    }

    fn delete<T: Document>(&self, id: &str) -> Result<bool> {
        self.delete_raw(T::COLLECTION, id)
    }

    fn list<T: Document>(&self) -> Result<Vec<T>> {
        self.list_raw(T::COLLECTION)?
            .into_iter()
            .map(|(id, body)| decode::<T>(&id, body))
            .collect()
    }

    fn query<T: Document>(&self, field: &str, value: impl Into<Value>) -> Result<Vec<T>> {
        self.query_raw(T::COLLECTION, field, &value.into())?
            .into_iter()
            .map(|(id, body)| decode::<T>(&id, body))
            .collect()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

fn decode<T: Document>(id: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|source| {
        CoreError::from(DatabaseError::CorruptDocument {
            collection: T::COLLECTION.as_str(),
            id: id.to_string(),
            source,
        })
    })
}

/// Whether a name is safe to splice into a JSON path.
pub fn is_valid_field(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
