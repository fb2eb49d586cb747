//! In-memory adapter: a fixed set of records behind the CohortSource port.
//!
//! Has no pushdown; every query is evaluated over the stored records.

use std::convert::Infallible;

use crate::domain::PatientRecord;
use crate::ports::CohortSource;

/// Cohort held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCohort {
    records: Vec<PatientRecord>,
}

impl MemoryCohort {
    #[must_use]
    pub fn new(records: Vec<PatientRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<PatientRecord>> for MemoryCohort {
    fn from(records: Vec<PatientRecord>) -> Self {
        Self::new(records)
    }
}

impl CohortSource for MemoryCohort {
    type Error = Infallible;

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }

    fn materialize(&self) -> Result<Vec<PatientRecord>, Self::Error> {
        Ok(self.records.clone())
    }
}
