//! # Cohortlens
//!
//! Heart-failure cohort comparison dashboard.
//!
//! This crate provides:
//! - A comparison aggregator that groups patients by survival outcome and
//!   diabetes status and reports per-group medians
//! - Headline metrics (cohort size, median age, survival rate)
//! - Per-group distributions of a selected clinical metric
//! - Terminal UI for browsing the results
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, ComparisonRow, HeadlineMetrics)
//! - `ports`: The `CohortSource` trait and the query it executes
//! - `adapters`: Concrete sources (SQLite warehouse, in-memory) and log redaction
//! - `application`: The comparison service orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::{ComparisonService, DashboardSnapshot};
pub use domain::{ComparisonRow, HeadlineMetrics, MetricChoice, PatientRecord};
pub use ports::{CohortSource, ExecutionMode};

/// Result type for Cohortlens operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Main error type for Cohortlens
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Cohort source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid cohort data: {0}")]
    Validation(String),

    #[error("Cohort is empty: {0} is undefined")]
    EmptyCohort(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<adapters::SourceError> for DashboardError {
    fn from(e: adapters::SourceError) -> Self {
        if e.is_invalid_data() {
            Self::Validation(e.to_string())
        } else {
            Self::SourceUnavailable(e.to_string())
        }
    }
}

impl From<std::convert::Infallible> for DashboardError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}
