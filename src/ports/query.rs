//! Cohort query description and its in-memory evaluator.
//!
//! A [`CohortQuery`] is the deferred form of a computation: a partition over
//! indicator columns plus a list of aggregates. Pushdown-capable sources
//! translate it for remote execution; everything else runs it through
//! [`evaluate`] over materialized records.

use std::collections::BTreeMap;

use crate::domain::{stats, Column, Indicator, PatientRecord};

/// An aggregate expression over one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    /// Number of records
    Count,
    /// Arithmetic mean of a column
    Mean(Column),
    /// Smallest value of a column
    Min(Column),
    /// Largest value of a column
    Max(Column),
    /// Linearly interpolated quantile of a column (`q` in `[0, 1]`)
    Quantile(Column, f64),
}

impl Aggregate {
    /// Median of a column.
    #[must_use]
    pub fn median(column: Column) -> Self {
        Self::Quantile(column, 0.5)
    }
}

/// A grouped aggregation over the cohort table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortQuery {
    /// Partition keys. Empty means a single group over the whole cohort.
    pub group_by: Vec<Indicator>,

    /// Aggregates computed per group, in output order.
    pub aggregates: Vec<Aggregate>,
}

impl CohortQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition key.
    #[must_use]
    pub fn group_by(mut self, indicator: Indicator) -> Self {
        self.group_by.push(indicator);
        self
    }

    /// Add an aggregate to the output.
    #[must_use]
    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    #[must_use]
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }
}

/// One output group.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    /// Raw key values, in `group_by` order
    pub keys: Vec<i64>,

    /// Aggregate values, in `aggregates` order. `None` where undefined
    /// (mean/min/max/quantile of an empty group).
    pub values: Vec<Option<f64>>,
}

/// Result of executing a [`CohortQuery`].
///
/// Rows are ordered by ascending key tuple. An ungrouped query always yields
/// exactly one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<QueryRow>,
}

impl QueryOutput {
    /// Value of aggregate `index` in the first row (for ungrouped queries).
    #[must_use]
    pub fn scalar(&self, index: usize) -> Option<f64> {
        self.rows
            .first()
            .and_then(|row| row.values.get(index).copied().flatten())
    }
}

/// Evaluate `query` over materialized records.
#[must_use]
pub fn evaluate(query: &CohortQuery, records: &[PatientRecord]) -> QueryOutput {
    let mut groups: BTreeMap<Vec<i64>, Vec<&PatientRecord>> = BTreeMap::new();

    if !query.is_grouped() {
        groups.insert(Vec::new(), Vec::new());
    }

    for record in records {
        let key: Vec<i64> = query
            .group_by
            .iter()
            .map(|indicator| record.indicator(*indicator))
            .collect();
        groups.entry(key).or_default().push(record);
    }

    let rows = groups
        .into_iter()
        .map(|(keys, members)| QueryRow {
            keys,
            values: query
                .aggregates
                .iter()
                .map(|aggregate| apply(*aggregate, &members))
                .collect(),
        })
        .collect();

    QueryOutput { rows }
}

fn apply(aggregate: Aggregate, members: &[&PatientRecord]) -> Option<f64> {
    let column_values = |column: Column| -> Vec<f64> {
        members.iter().map(|record| record.value(column)).collect()
    };

    match aggregate {
        Aggregate::Count => Some(members.len() as f64),
        Aggregate::Mean(column) => stats::mean(&column_values(column)),
        Aggregate::Min(column) => column_values(column).into_iter().reduce(f64::min),
        Aggregate::Max(column) => column_values(column).into_iter().reduce(f64::max),
        Aggregate::Quantile(column, q) => stats::quantile(&mut column_values(column), q),
    }
}
