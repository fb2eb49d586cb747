//! Cohort source port: Trait for reading the patient cohort.
//!
//! This trait abstracts the warehouse connector from the aggregation logic.
//! A source can always be materialized; pushdown-capable sources also run
//! a [`CohortQuery`] remotely instead of shipping every record.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::query::{evaluate, CohortQuery, QueryOutput};
use crate::domain::PatientRecord;
use crate::DashboardError;

/// Where grouping and aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Materialize the full table, then compute locally.
    Eager,
    /// Defer computation to the source.
    #[default]
    Pushdown,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "pushdown" | "lazy" => Ok(Self::Pushdown),
            other => Err(format!("Unknown execution mode: {other}")),
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Pushdown => write!(f, "pushdown"),
        }
    }
}

/// Read-only access to the cohort table.
pub trait CohortSource: Send + Sync {
    /// Error type for source operations.
    ///
    /// The conversion decides which failures are bad data (`Validation`)
    /// and which mean the source could not be read.
    type Error: std::error::Error + Send + Sync + Into<DashboardError> + 'static;

    /// Short label for logs and the dashboard header.
    fn describe(&self) -> String;

    /// Fetch every patient record.
    ///
    /// # Errors
    /// Returns error if the source cannot be reached or read.
    fn materialize(&self) -> Result<Vec<PatientRecord>, Self::Error>;

    /// Whether [`CohortSource::execute`] runs remotely.
    fn supports_pushdown(&self) -> bool {
        false
    }

    /// Execute a grouped aggregation.
    ///
    /// The default materializes and evaluates in memory. Implementations
    /// that override it must return rows ordered by ascending key tuple and
    /// one row for an ungrouped query.
    ///
    /// # Errors
    /// Returns error if the source cannot be reached or the query fails.
    fn execute(&self, query: &CohortQuery) -> Result<QueryOutput, Self::Error> {
        let records = self.materialize()?;
        Ok(evaluate(query, &records))
    }

    /// Execute several queries against one state of the table.
    ///
    /// The default runs [`CohortSource::execute`] per query; sources that can
    /// change underneath a reader should override it to run the batch in a
    /// single read transaction.
    ///
    /// # Errors
    /// Returns the first error of any query; no partial output.
    fn execute_all(&self, queries: &[CohortQuery]) -> Result<Vec<QueryOutput>, Self::Error> {
        queries.iter().map(|query| self.execute(query)).collect()
    }
}
