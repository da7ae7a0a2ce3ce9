//! Core error types for competency-core.
//!
//! Lookups that may legitimately miss return `Ok(None)`; operations that
//! need the referenced document fail with [`CoreError::NotFound`].

use std::path::PathBuf;
use thiserror::Error;

use crate::access::Role;

/// Core error type for competency-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors, raised before anything is written
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Access control errors
    #[error("Access denied: {0}")]
    Access(#[from] AccessError),

    /// A referenced document does not exist
    #[error("{collection} '{id}' not found")]
    NotFound { collection: &'static str, id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            collection,
            id: id.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Field name not usable in a document query
    #[error("Invalid query field: {0}")]
    InvalidField(String),

    /// Stored document does not match the expected shape
    #[error("Corrupt document {collection}/{id}: {source}")]
    CorruptDocument {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Proficiency level outside 1..=4
    #[error("Level {0} is out of range (expected 1-4)")]
    LevelOutOfRange(i64),

    /// Required competencies left unrated
    #[error("Missing ratings for: {}", .0.join(", "))]
    MissingRatings(Vec<String>),

    /// Ratings given for competencies not under assessment
    #[error("Unexpected ratings for: {}", .0.join(", "))]
    UnexpectedRatings(Vec<String>),

    /// Peer roster size outside the department range
    #[error("{department} requires between {min} and {max} peer raters, got {count}")]
    PeerRosterSize {
        department: String,
        min: u32,
        max: u32,
        count: usize,
    },

    /// Rater listed more than once
    #[error("Peer rater '{0}' assigned more than once")]
    DuplicatePeerRater(String),

    /// Subject listed as their own peer
    #[error("User '{0}' cannot be assigned as their own peer rater")]
    SelfAsPeer(String),

    /// Peer range with no required rater, or min above max
    #[error("Invalid peer range: min ({min}) must be at least 1 and not exceed max ({max})")]
    InvalidPeerRange { min: u32, max: u32 },

    /// Invalid date range
    #[error("Invalid date range: end date ({end}) must be after start date ({start})")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Cycle is not accepting assessments
    #[error("Assessment cycle '{0}' is not active")]
    CycleNotActive(String),

    /// No active cycle to default to
    #[error("No active assessment cycle")]
    NoActiveCycle,

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Activity targets outside the plan's development needs
    #[error("Not a development need of this plan: {}", .0.join(", "))]
    UnknownTargets(Vec<String>),

    /// Weight triple unusable for scoring
    #[error("Invalid rater weights: {0}")]
    InvalidWeights(String),

    /// Plan or activity status change not allowed from the current state
    #[error("Cannot move {entity} from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Access control errors.
#[derive(Error, Debug, PartialEq)]
pub enum AccessError {
    /// Role may not perform the action
    #[error("{role} may not {action}")]
    Forbidden { role: Role, action: String },

    /// Principal is not on the peer roster for the assessment
    #[error("'{rater}' is not an assigned peer rater for assessment '{assessment}'")]
    NotAssignedPeer { rater: String, assessment: String },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
