mod config;
pub mod database;
pub mod documents;
pub mod migrations;

pub use config::{Config, LoggingConfig, PeersConfig, ScoringConfig, StorageConfig};
pub use database::Database;
pub use documents::{BatchOp, Collection, Document, DocumentStore, DocumentStoreExt, WriteBatch};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/competency[-dev]/` based on COMPETENCY_ENV.
///
/// Set COMPETENCY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("COMPETENCY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("competency-dev")
    } else {
        base_dir.join("competency")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
