//! Domain layer: Core cohort types and statistics.
//!
//! This module contains pure Rust types with no I/O.
//! All types are serializable; the `stats` helpers are shared by every
//! execution path so results do not depend on where a query ran.

mod comparison;
mod patient;
pub mod stats;

pub use comparison::{
    group_order, BoxSummary, ComparisonRow, DiabetesLabel, HeadlineMetrics, MetricChoice,
    MetricDistribution, SurvivalLabel,
};
pub use patient::{Column, Indicator, PatientRecord};
