//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with the cohort source port to
//! produce the dashboard figures.

mod comparison;
mod snapshot;

pub use comparison::ComparisonService;
pub use snapshot::DashboardSnapshot;
