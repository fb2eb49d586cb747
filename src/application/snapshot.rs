//! Dashboard snapshot: everything one render cycle needs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ComparisonRow, HeadlineMetrics, MetricDistribution};
use crate::ports::ExecutionMode;

/// Output of one dashboard load. Never cached or persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Label of the cohort source
    pub source: String,

    /// Where the aggregation ran
    pub mode: ExecutionMode,

    /// Summary statistics table
    pub comparison: Vec<ComparisonRow>,

    /// Key values
    pub metrics: HeadlineMetrics,

    /// Distribution of the selected metric
    pub distribution: MetricDistribution,

    /// When the snapshot was computed
    pub loaded_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Pretty-printed JSON for non-interactive output.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, crate::DashboardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
