//! # Competency Core Library
//!
//! This library provides the business logic for a 360-degree competency
//! assessment system. Employees are rated on their competencies by themselves,
//! by assigned peers and by their supervisor; the weighted result is compared
//! with the level their position requires to find development needs.
//!
//! ## Architecture
//!
//! - **Scoring**: Weighted gap engine renormalized over the rater sources present
//! - **Completion**: Status trackers re-derived from a fresh read of all ratings
//! - **Access**: Role-based authorization over a closed set of actions
//! - **Storage**: SQLite document store and TOML-based configuration
//! - **Service**: Application operations on top of a [`DocumentStore`]
//!
//! ## Key Components
//!
//! - [`App`]: Application state passed to every operation
//! - [`Database`]: SQLite-backed document store
//! - [`Config`]: Application configuration management
//! - [`analyze`]: Per-competency gap scoring

pub mod access;
pub mod catalog;
pub mod completion;
pub mod error;
pub mod model;
pub mod reports;
pub mod scoring;
pub mod service;
pub mod storage;

pub use access::{authorize, Action, Principal, Role};
pub use error::{AccessError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use model::{
    Assessment, AssessmentCycle, AssessmentStatus, Competency, CompetencyType, Department,
    DevelopmentPlan, Level, PeerStatus, Position, RaterType, Rating, RatingMap, User, UserRole,
};
pub use reports::{CompletionReport, DepartmentReport, GapSummary, IndividualReport};
pub use scoring::{analyze, GapResult, GapStatus, RaterWeights};
pub use service::{App, GapAnalysis};
pub use storage::{Config, Database, DocumentStore, DocumentStoreExt};
