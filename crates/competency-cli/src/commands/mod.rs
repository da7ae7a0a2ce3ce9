pub mod assess;
pub mod catalog;
pub mod config;
pub mod cycle;
pub mod gap;
pub mod plan;
pub mod report;
pub mod user;
