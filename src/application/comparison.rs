//! Comparison service: cohort comparison by survival and diabetes status.
//!
//! This service runs one aggregation algorithm regardless of where the
//! grouping happens. In [`ExecutionMode::Eager`] the cohort is materialized
//! once and every query is evaluated locally; in [`ExecutionMode::Pushdown`]
//! each query is handed to the source.

use std::sync::Arc;

use chrono::Utc;

use super::snapshot::DashboardSnapshot;
use crate::domain::{
    group_order, stats, BoxSummary, Column, ComparisonRow, DiabetesLabel, HeadlineMetrics,
    Indicator, MetricChoice, MetricDistribution, SurvivalLabel,
};
use crate::ports::{evaluate, Aggregate, CohortQuery, CohortSource, ExecutionMode, QueryOutput, QueryRow};
use crate::DashboardError;

/// Service computing the dashboard figures from a cohort source.
pub struct ComparisonService<S>
where
    S: CohortSource,
{
    source: Arc<S>,
    mode: ExecutionMode,
}

impl<S> ComparisonService<S>
where
    S: CohortSource,
{
    /// Create a new comparison service.
    pub fn new(source: Arc<S>, mode: ExecutionMode) -> Self {
        Self { source, mode }
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Label of the underlying source.
    #[must_use]
    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Median age, creatinine and sodium per (survival, diabetes) group.
    ///
    /// Rows are ordered by survival label descending, then diabetes label
    /// ascending.
    ///
    /// # Errors
    /// - `SourceUnavailable` if the source cannot be read
    /// - `Validation` if DEATH_EVENT or DIABETES holds a value other than 0/1
    /// - `EmptyCohort` if there are no records
    pub fn grouped_comparison(&self) -> Result<Vec<ComparisonRow>, DashboardError> {
        let outputs = self.run_all(&[comparison_query()])?;
        comparison_from(&outputs[0])
    }

    /// Number of patients. Defined (zero) for an empty cohort.
    ///
    /// # Errors
    /// - `SourceUnavailable` if the source cannot be read
    /// - `Validation` if a cell is missing, non-numeric or a fractional indicator
    pub fn total_patients(&self) -> Result<u64, DashboardError> {
        let query = CohortQuery::new().aggregate(Aggregate::Count);
        let outputs = self.run_all(&[query])?;
        Ok(outputs[0].scalar(0).unwrap_or(0.0) as u64)
    }

    /// Cohort size, median age and survival rate.
    ///
    /// # Errors
    /// - `SourceUnavailable` if the source cannot be read
    /// - `Validation` if an indicator holds a value other than 0/1
    /// - `EmptyCohort` if there are no records
    pub fn headline_metrics(&self) -> Result<HeadlineMetrics, DashboardError> {
        let [validation, totals] = headline_queries();
        let outputs = self.run_all(&[validation, totals])?;
        headline_from(&outputs[0], &outputs[1])
    }

    /// Five-number summary of `metric` per (survival, diabetes) group.
    ///
    /// # Errors
    /// Same as [`Self::grouped_comparison`].
    pub fn distribution(&self, metric: MetricChoice) -> Result<MetricDistribution, DashboardError> {
        let outputs = self.run_all(&[distribution_query(metric)])?;
        distribution_from(metric, &outputs[0])
    }

    /// Everything the dashboard shows, computed from a single read in eager
    /// mode. Any failure aborts the whole snapshot.
    ///
    /// # Errors
    /// Union of the errors of the individual operations.
    pub fn load_snapshot(&self, metric: MetricChoice) -> Result<DashboardSnapshot, DashboardError> {
        let [validation, totals] = headline_queries();
        let queries = [
            comparison_query(),
            validation,
            totals,
            distribution_query(metric),
        ];
        let outputs = self.run_all(&queries)?;

        let comparison = comparison_from(&outputs[0])?;
        let metrics = headline_from(&outputs[1], &outputs[2])?;
        let distribution = distribution_from(metric, &outputs[3])?;

        tracing::info!(
            "Loaded dashboard ({} mode): {} groups, {} patients",
            self.mode,
            comparison.len(),
            metrics.total_patients
        );

        Ok(DashboardSnapshot {
            source: self.source.describe(),
            mode: self.mode,
            comparison,
            metrics,
            distribution,
            loaded_at: Utc::now(),
        })
    }

    fn run_all(&self, queries: &[CohortQuery]) -> Result<Vec<QueryOutput>, DashboardError> {
        match self.mode {
            ExecutionMode::Eager => {
                let records = self.source.materialize().map_err(source_error)?;
                tracing::debug!("Evaluating {} queries over {} records", queries.len(), records.len());
                Ok(queries.iter().map(|q| evaluate(q, &records)).collect())
            }
            ExecutionMode::Pushdown => {
                if !self.source.supports_pushdown() {
                    tracing::debug!(
                        "Source {} has no pushdown; queries run locally",
                        self.source.describe()
                    );
                }
                self.source.execute_all(queries).map_err(source_error)
            }
        }
    }
}

fn source_error<E>(e: E) -> DashboardError
where
    E: std::error::Error + Into<DashboardError>,
{
    tracing::error!("Cohort source failed: {}", e);
    e.into()
}

fn comparison_query() -> CohortQuery {
    CohortQuery::new()
        .group_by(Indicator::DeathEvent)
        .group_by(Indicator::Diabetes)
        .aggregate(Aggregate::median(Column::Age))
        .aggregate(Aggregate::median(Column::SerumCreatinine))
        .aggregate(Aggregate::median(Column::SerumSodium))
}

/// Indicator check (grouped count) and ungrouped totals.
fn headline_queries() -> [CohortQuery; 2] {
    [
        CohortQuery::new()
            .group_by(Indicator::DeathEvent)
            .group_by(Indicator::Diabetes)
            .aggregate(Aggregate::Count),
        CohortQuery::new()
            .aggregate(Aggregate::Count)
            .aggregate(Aggregate::median(Column::Age))
            .aggregate(Aggregate::Mean(Column::DeathEvent)),
    ]
}

fn distribution_query(metric: MetricChoice) -> CohortQuery {
    let column = metric.column();
    CohortQuery::new()
        .group_by(Indicator::DeathEvent)
        .group_by(Indicator::Diabetes)
        .aggregate(Aggregate::Count)
        .aggregate(Aggregate::Min(column))
        .aggregate(Aggregate::Quantile(column, 0.25))
        .aggregate(Aggregate::median(column))
        .aggregate(Aggregate::Quantile(column, 0.75))
        .aggregate(Aggregate::Max(column))
}

/// Relabel a (DEATH_EVENT, DIABETES) key.
fn labels(row: &QueryRow) -> Result<(SurvivalLabel, DiabetesLabel), DashboardError> {
    let (death_event, diabetes) = match row.keys.as_slice() {
        [death_event, diabetes] => (*death_event, *diabetes),
        keys => {
            return Err(DashboardError::Validation(format!(
                "Expected two group keys, got {}",
                keys.len()
            )))
        }
    };

    let survival = SurvivalLabel::from_death_event(death_event).ok_or_else(|| {
        DashboardError::Validation(format!("DEATH_EVENT {death_event} must be 0 or 1"))
    })?;
    let diabetes = DiabetesLabel::from_diabetes(diabetes).ok_or_else(|| {
        DashboardError::Validation(format!("DIABETES {diabetes} must be 0 or 1"))
    })?;

    Ok((survival, diabetes))
}

fn value(row: &QueryRow, index: usize, what: &str) -> Result<f64, DashboardError> {
    row.values
        .get(index)
        .copied()
        .flatten()
        .ok_or_else(|| DashboardError::Validation(format!("{what} is missing for a group")))
}

fn comparison_from(output: &QueryOutput) -> Result<Vec<ComparisonRow>, DashboardError> {
    if output.rows.is_empty() {
        return Err(DashboardError::EmptyCohort("median comparison"));
    }

    let mut rows = output
        .rows
        .iter()
        .map(|row| {
            let (survival, diabetes) = labels(row)?;
            Ok(ComparisonRow {
                survival,
                diabetes,
                median_age: value(row, 0, "AGE")?,
                median_serum_creatinine: value(row, 1, "SERUM_CREATININE")?,
                median_serum_sodium: value(row, 2, "SERUM_SODIUM")?,
            })
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;

    rows.sort_by(|a, b| group_order((a.survival, a.diabetes), (b.survival, b.diabetes)));
    Ok(rows)
}

fn headline_from(
    validation: &QueryOutput,
    totals: &QueryOutput,
) -> Result<HeadlineMetrics, DashboardError> {
    for row in &validation.rows {
        labels(row)?;
    }

    let total = totals.scalar(0).unwrap_or(0.0) as u64;
    if total == 0 {
        return Err(DashboardError::EmptyCohort("median age"));
    }

    let median_age = totals
        .scalar(1)
        .ok_or(DashboardError::EmptyCohort("median age"))?;
    let death_rate = totals
        .scalar(2)
        .ok_or(DashboardError::EmptyCohort("survival rate"))?;

    Ok(HeadlineMetrics::new(
        total,
        stats::round_half_even(median_age),
        stats::round_half_even((1.0 - death_rate) * 100.0),
    ))
}

fn distribution_from(
    metric: MetricChoice,
    output: &QueryOutput,
) -> Result<MetricDistribution, DashboardError> {
    if output.rows.is_empty() {
        return Err(DashboardError::EmptyCohort("metric distribution"));
    }

    let name = metric.column().sql_name();
    let mut groups = output
        .rows
        .iter()
        .map(|row| {
            let (survival, diabetes) = labels(row)?;
            Ok(BoxSummary {
                survival,
                diabetes,
                count: value(row, 0, "count")? as u64,
                min: value(row, 1, name)?,
                q1: value(row, 2, name)?,
                median: value(row, 3, name)?,
                q3: value(row, 4, name)?,
                max: value(row, 5, name)?,
            })
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;

    groups.sort_by(|a, b| group_order((a.survival, a.diabetes), (b.survival, b.diabetes)));
    Ok(MetricDistribution { metric, groups })
}
