//! SQLite adapter: Implementation of CohortSource.
//!
//! Reads the heart-failure cohort from a SQLite database acting as the
//! warehouse. Queries are pushed down as a single `GROUP BY` statement;
//! quantiles run inside SQLite through the `cohort_quantile(value, q)`
//! aggregate registered on every connection, which shares its arithmetic
//! with the in-memory evaluator.
//!
//! Cells are checked the same way on both paths: a NULL or non-numeric cell,
//! or a fractional DEATH_EVENT/DIABETES value, fails the read as invalid data
//! instead of being skipped. Pushdown batches run inside one read
//! transaction so every query sees the same table state.
//!
//! # Mutex Behavior
//!
//! The connection is protected by `Mutex`. A poisoned mutex (from a panic in
//! another thread) fails closed with [`SourceError::LockPoisoned`].

use std::sync::{Mutex, MutexGuard};

use rusqlite::functions::{Aggregate as SqlAggregate, Context, FunctionFlags};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags};

use crate::config::WarehouseConfig;
use crate::domain::{stats, Column, Indicator, PatientRecord};
use crate::ports::{Aggregate, CohortQuery, CohortSource, QueryOutput, QueryRow};

/// Name of the quantile aggregate registered on each connection.
const QUANTILE_FN: &str = "cohort_quantile";

/// Error type for cohort source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database not found: {0}")]
    NotFound(String),

    #[error("Table {schema}.{table} not found")]
    MissingTable { schema: String, table: String },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,

    #[error("{column} is missing for a patient")]
    MissingValue { column: &'static str },

    #[error("{column} holds a non-numeric value: {value}")]
    InvalidMeasurement { column: &'static str, value: String },

    #[error("{column} holds a non-integer indicator value: {value}")]
    InvalidIndicator { column: &'static str, value: String },
}

impl SourceError {
    /// Whether the table was read but holds values the cohort model rejects.
    #[must_use]
    pub fn is_invalid_data(&self) -> bool {
        matches!(
            self,
            Self::MissingValue { .. } | Self::InvalidMeasurement { .. } | Self::InvalidIndicator { .. }
        )
    }
}

/// SQLite cohort source.
pub struct SqliteCohort {
    conn: Mutex<Connection>,
    /// Quoted `"schema"."table"` reference
    table_ref: String,
    label: String,
}

impl SqliteCohort {
    /// Open the cohort table described by `config`, read-only.
    ///
    /// # Errors
    /// Returns error if the database file is missing, cannot be opened, or
    /// does not contain the configured table.
    pub fn connect(config: &WarehouseConfig) -> Result<Self, SourceError> {
        if !config.database.exists() {
            return Err(SourceError::NotFound(config.database.display().to_string()));
        }

        let conn = Connection::open_with_flags(
            &config.database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let label = format!(
            "{}/{}.{}.{} via {}",
            config.warehouse,
            config.database.display(),
            config.schema,
            config.table,
            config.connection_name
        );

        let source = Self::from_connection(conn, &config.schema, &config.table, label)?;
        tracing::info!("Connected to cohort source {}", source.label);
        Ok(source)
    }

    /// Create an in-memory cohort table (for fixtures and tests).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, SourceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS HEART_FAILURE (
                AGE REAL NOT NULL,
                DEATH_EVENT INTEGER NOT NULL,
                DIABETES INTEGER NOT NULL,
                SERUM_CREATININE REAL NOT NULL,
                SERUM_SODIUM REAL NOT NULL
            );
            ",
        )?;

        Self::from_connection(conn, "main", "HEART_FAILURE", "memory:HEART_FAILURE".to_string())
    }

    fn from_connection(
        conn: Connection,
        schema: &str,
        table: &str,
        label: String,
    ) -> Result<Self, SourceError> {
        let quoted_schema = quote_ident(schema)?;
        let quoted_table = quote_ident(table)?;

        conn.create_aggregate_function(
            QUANTILE_FN,
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            QuantileAggregate,
        )?;

        let found: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {quoted_schema}.sqlite_master \
                 WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE"
            ),
            params![table],
            |row| row.get(0),
        )?;
        if found == 0 {
            return Err(SourceError::MissingTable {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }

        Ok(Self {
            conn: Mutex::new(conn),
            table_ref: format!("{quoted_schema}.{quoted_table}"),
            label,
        })
    }

    /// Append records to the cohort table (fixtures only; the table is
    /// read-only when opened through [`Self::connect`]).
    ///
    /// # Errors
    /// Returns error if the insert fails.
    pub fn insert_records(&self, records: &[PatientRecord]) -> Result<(), SourceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (AGE, DEATH_EVENT, DIABETES, SERUM_CREATININE, SERUM_SODIUM) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table_ref
            ))?;
            for r in records {
                stmt.execute(params![
                    r.age,
                    r.death_event,
                    r.diabetes,
                    r.serum_creatinine,
                    r.serum_sodium
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Inserted {} records into {}", records.len(), self.table_ref);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SourceError> {
        self.conn.lock().map_err(|_| SourceError::LockPoisoned)
    }

    /// Translate a query into one SQL statement.
    fn build_sql(&self, query: &CohortQuery) -> String {
        let keys: Vec<&str> = query
            .group_by
            .iter()
            .map(|indicator| indicator.column().sql_name())
            .collect();

        let mut select: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
        select.extend(query.aggregates.iter().map(aggregate_sql));

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), self.table_ref);
        if !keys.is_empty() {
            let keys = keys.join(", ");
            sql.push_str(&format!(" GROUP BY {keys} ORDER BY {keys}"));
        }
        sql
    }

    /// Fail with the same error [`CohortSource::materialize`] would raise if
    /// any cell of the table is unusable.
    fn check_cells(&self, conn: &Connection) -> Result<(), SourceError> {
        for column in Column::ALL {
            let name = column.sql_name();
            let mut condition = format!("typeof({name}) NOT IN ('integer', 'real')");
            if is_indicator(column) {
                condition.push_str(&format!(" OR {name} <> ROUND({name})"));
            }

            let sql = format!("SELECT {name} FROM {} WHERE {condition} LIMIT 1", self.table_ref);
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            if let Some(row) = rows.next()? {
                let value: Value = row.get(0)?;
                if is_indicator(column) {
                    indicator_cell(column, &value)?;
                } else {
                    measurement_cell(column, &value)?;
                }
            }
        }
        Ok(())
    }

    fn run_query(&self, conn: &Connection, query: &CohortQuery) -> Result<QueryOutput, SourceError> {
        let sql = self.build_sql(query);
        tracing::debug!("Pushdown query: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let key_count = query.group_by.len();
        let value_count = query.aggregates.len();

        let raw = stmt
            .query_map([], |row| {
                let keys = (0..key_count)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()?;
                let values = (0..value_count)
                    .map(|j| row.get::<_, Option<f64>>(key_count + j))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((keys, values))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let rows = raw
            .into_iter()
            .map(|(keys, values)| {
                let keys = query
                    .group_by
                    .iter()
                    .zip(&keys)
                    .map(|(indicator, value)| indicator_cell(indicator.column(), value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(QueryRow { keys, values })
            })
            .collect::<Result<Vec<_>, SourceError>>()?;

        Ok(QueryOutput { rows })
    }
}

fn is_indicator(column: Column) -> bool {
    Indicator::ALL.iter().any(|indicator| indicator.column() == column)
}

/// Numeric cell. NULL and non-numeric cells are rejected.
fn measurement_cell(column: Column, value: &Value) -> Result<f64, SourceError> {
    match value {
        Value::Real(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        Value::Null => Err(SourceError::MissingValue {
            column: column.sql_name(),
        }),
        Value::Text(_) | Value::Blob(_) => Err(SourceError::InvalidMeasurement {
            column: column.sql_name(),
            value: describe_cell(value),
        }),
    }
}

/// Indicator cell: an integer, or a real with no fractional part.
fn indicator_cell(column: Column, value: &Value) -> Result<i64, SourceError> {
    match value {
        Value::Integer(v) => Ok(*v),
        Value::Real(v) if v.fract() == 0.0 => Ok(*v as i64),
        Value::Null => Err(SourceError::MissingValue {
            column: column.sql_name(),
        }),
        Value::Real(_) | Value::Text(_) | Value::Blob(_) => Err(SourceError::InvalidIndicator {
            column: column.sql_name(),
            value: describe_cell(value),
        }),
    }
}

fn describe_cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Text(s) => format!("{s:?}"),
        Value::Blob(b) => format!("<{} byte blob>", b.len()),
    }
}

fn record_from_cells(cells: &[Value]) -> Result<PatientRecord, SourceError> {
    let [age, death_event, diabetes, serum_creatinine, serum_sodium] = cells else {
        return Err(SourceError::Database(rusqlite::Error::InvalidColumnIndex(cells.len())));
    };

    Ok(PatientRecord {
        age: measurement_cell(Column::Age, age)?,
        death_event: indicator_cell(Column::DeathEvent, death_event)?,
        diabetes: indicator_cell(Column::Diabetes, diabetes)?,
        serum_creatinine: measurement_cell(Column::SerumCreatinine, serum_creatinine)?,
        serum_sodium: measurement_cell(Column::SerumSodium, serum_sodium)?,
    })
}

fn aggregate_sql(aggregate: &Aggregate) -> String {
    match aggregate {
        Aggregate::Count => "COUNT(*)".to_string(),
        Aggregate::Mean(c) => format!("AVG({})", c.sql_name()),
        Aggregate::Min(c) => format!("MIN({})", c.sql_name()),
        Aggregate::Max(c) => format!("MAX({})", c.sql_name()),
        Aggregate::Quantile(c, q) => format!("{QUANTILE_FN}({}, {:?})", c.sql_name(), q),
    }
}

/// Quote an SQL identifier taken from configuration.
fn quote_ident(ident: &str) -> Result<String, SourceError> {
    if ident.trim().is_empty() || ident.contains('\0') {
        return Err(SourceError::InvalidIdentifier(ident.to_string()));
    }
    Ok(format!("\"{}\"", ident.replace('"', "\"\"")))
}

impl CohortSource for SqliteCohort {
    type Error = SourceError;

    fn describe(&self) -> String {
        self.label.clone()
    }

    fn materialize(&self) -> Result<Vec<PatientRecord>, Self::Error> {
        let conn = self.lock()?;
        let columns: Vec<&str> = Column::ALL.iter().map(Column::sql_name).collect();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            self.table_ref
        ))?;

        let cells = stmt
            .query_map([], |row| {
                (0..columns.len())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let records = cells
            .iter()
            .map(|row| record_from_cells(row))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Materialized {} records from {}", records.len(), self.table_ref);
        Ok(records)
    }

    fn supports_pushdown(&self) -> bool {
        true
    }

    fn execute(&self, query: &CohortQuery) -> Result<QueryOutput, Self::Error> {
        let mut outputs = self.execute_all(std::slice::from_ref(query))?;
        Ok(outputs.pop().unwrap_or_default())
    }

    fn execute_all(&self, queries: &[CohortQuery]) -> Result<Vec<QueryOutput>, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        self.check_cells(&tx)?;
        let outputs = queries
            .iter()
            .map(|query| self.run_query(&tx, query))
            .collect::<Result<Vec<_>, _>>()?;

        tx.commit()?;
        Ok(outputs)
    }
}

/// Accumulator for `cohort_quantile`.
#[derive(Default)]
struct QuantileState {
    values: Vec<f64>,
    q: f64,
}

/// `cohort_quantile(value, q)`: linearly interpolated quantile, NULLs skipped.
struct QuantileAggregate;

impl SqlAggregate<QuantileState, Option<f64>> for QuantileAggregate {
    fn init(&self, _ctx: &mut Context<'_>) -> rusqlite::Result<QuantileState> {
        Ok(QuantileState::default())
    }

    fn step(&self, ctx: &mut Context<'_>, state: &mut QuantileState) -> rusqlite::Result<()> {
        let value: Option<f64> = ctx.get(0)?;
        state.q = ctx.get(1)?;
        if let Some(v) = value {
            state.values.push(v);
        }
        Ok(())
    }

    fn finalize(
        &self,
        _ctx: &mut Context<'_>,
        state: Option<QuantileState>,
    ) -> rusqlite::Result<Option<f64>> {
        Ok(state.and_then(|mut s| stats::quantile(&mut s.values, s.q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::evaluate;

    fn fixture() -> SqliteCohort {
        let source = SqliteCohort::in_memory().expect("Should create db");
        source
            .insert_records(&[
                PatientRecord::new(75.0, 1, 0, 1.9, 130.0),
                PatientRecord::new(55.0, 0, 0, 1.1, 136.0),
                PatientRecord::new(65.0, 0, 1, 1.3, 129.0),
                PatientRecord::new(50.0, 0, 0, 1.0, 137.0),
                PatientRecord::new(90.0, 1, 1, 2.7, 116.0),
                PatientRecord::new(60.667, 1, 1, 1.18, 133.0),
            ])
            .expect("Should insert");
        source
    }

    #[test]
    fn test_materialize() {
        let source = fixture();
        let records = source.materialize().expect("Should materialize");
        assert_eq!(records.len(), 6);
        assert!(records.contains(&PatientRecord::new(60.667, 1, 1, 1.18, 133.0)));
    }

    #[test]
    fn test_pushdown_matches_in_memory() {
        let source = fixture();
        let query = CohortQuery::new()
            .group_by(Indicator::DeathEvent)
            .group_by(Indicator::Diabetes)
            .aggregate(Aggregate::Count)
            .aggregate(Aggregate::median(Column::Age))
            .aggregate(Aggregate::median(Column::SerumCreatinine))
            .aggregate(Aggregate::Quantile(Column::SerumSodium, 0.25))
            .aggregate(Aggregate::Min(Column::Age))
            .aggregate(Aggregate::Max(Column::Age));

        let pushed = source.execute(&query).expect("Should execute");
        let local = evaluate(&query, &source.materialize().expect("Should materialize"));
        assert_eq!(pushed, local);
    }

    #[test]
    fn test_ungrouped_empty_table() {
        let source = SqliteCohort::in_memory().expect("Should create db");
        let query = CohortQuery::new()
            .aggregate(Aggregate::Count)
            .aggregate(Aggregate::median(Column::Age))
            .aggregate(Aggregate::Mean(Column::DeathEvent));

        let output = source.execute(&query).expect("Should execute");
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.scalar(0), Some(0.0));
        assert_eq!(output.scalar(1), None);
        assert_eq!(output.scalar(2), None);
    }

    fn file_source(dir: &tempfile::TempDir, rows: &str) -> SqliteCohort {
        let path = dir.path().join("cohort.db");
        let conn = Connection::open(&path).expect("open");
        conn.execute_batch(&format!(
            "CREATE TABLE HEART_FAILURE (AGE REAL, DEATH_EVENT INTEGER, DIABETES INTEGER, \
             SERUM_CREATININE REAL, SERUM_SODIUM REAL);
             INSERT INTO HEART_FAILURE VALUES {rows};"
        ))
        .expect("seed");

        let config = WarehouseConfig {
            database: path,
            ..WarehouseConfig::default()
        };
        SqliteCohort::connect(&config).expect("Should connect")
    }

    fn count_by_diabetes() -> CohortQuery {
        CohortQuery::new()
            .group_by(Indicator::Diabetes)
            .aggregate(Aggregate::Count)
    }

    #[test]
    fn test_null_measurement_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = file_source(&dir, "(60, 0, 0, 1.0, 140), (NULL, 0, 0, 1.2, 138)");

        let eager = source.materialize().expect_err("NULL age");
        assert!(matches!(eager, SourceError::MissingValue { column: "AGE" }));
        assert!(eager.is_invalid_data());

        let pushed = source.execute(&count_by_diabetes()).expect_err("NULL age");
        assert!(matches!(pushed, SourceError::MissingValue { column: "AGE" }));
    }

    #[test]
    fn test_fractional_indicator_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = file_source(&dir, "(60, 0, 0.5, 1.0, 140), (80, 1, 0, 2.0, 130)");

        let eager = source.materialize().expect_err("fractional diabetes");
        assert!(matches!(eager, SourceError::InvalidIndicator { column: "DIABETES", .. }));

        let pushed = source.execute(&count_by_diabetes()).expect_err("fractional diabetes");
        assert!(matches!(pushed, SourceError::InvalidIndicator { column: "DIABETES", .. }));
        assert!(pushed.is_invalid_data());
    }

    #[test]
    fn test_text_measurement_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = file_source(&dir, "(60, 0, 0, 'high', 140)");

        assert!(matches!(
            source.materialize(),
            Err(SourceError::InvalidMeasurement { column: "SERUM_CREATININE", .. })
        ));
        assert!(matches!(
            source.execute(&count_by_diabetes()),
            Err(SourceError::InvalidMeasurement { column: "SERUM_CREATININE", .. })
        ));
    }

    #[test]
    fn test_execute_all_matches_single_queries() {
        let source = fixture();
        let queries = [
            count_by_diabetes(),
            CohortQuery::new()
                .aggregate(Aggregate::Count)
                .aggregate(Aggregate::Mean(Column::DeathEvent)),
        ];

        let batch = source.execute_all(&queries).expect("Should execute");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], source.execute(&queries[0]).expect("Should execute"));
        assert_eq!(batch[1], source.execute(&queries[1]).expect("Should execute"));
        assert_eq!(batch[1].scalar(0), Some(6.0));
    }

    #[test]
    fn test_build_sql() {
        let source = SqliteCohort::in_memory().expect("Should create db");
        let query = CohortQuery::new()
            .group_by(Indicator::DeathEvent)
            .aggregate(Aggregate::median(Column::Age));

        assert_eq!(
            source.build_sql(&query),
            "SELECT DEATH_EVENT, cohort_quantile(AGE, 0.5) FROM \"main\".\"HEART_FAILURE\" \
             GROUP BY DEATH_EVENT ORDER BY DEATH_EVENT"
        );
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("HEART_FAILURE").expect("valid"), "\"HEART_FAILURE\"");
        assert_eq!(quote_ident("a\"b").expect("valid"), "\"a\"\"b\"");
        assert!(quote_ident("  ").is_err());
    }

    #[test]
    fn test_connect_missing_database() {
        let config = WarehouseConfig {
            database: "/nonexistent/cohort.db".into(),
            ..WarehouseConfig::default()
        };
        assert!(matches!(
            SqliteCohort::connect(&config),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_connect_file_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cohort.db");
        {
            let conn = Connection::open(&path).expect("open");
            conn.execute_batch(
                "CREATE TABLE HEART_FAILURE (AGE REAL, DEATH_EVENT INTEGER, DIABETES INTEGER, \
                 SERUM_CREATININE REAL, SERUM_SODIUM REAL);
                 INSERT INTO HEART_FAILURE VALUES (70, 0, 1, 1.2, 138);",
            )
            .expect("seed");
        }

        let config = WarehouseConfig {
            database: path.clone(),
            ..WarehouseConfig::default()
        };
        let source = SqliteCohort::connect(&config).expect("Should connect");
        assert!(source.supports_pushdown());
        assert_eq!(source.materialize().expect("Should read").len(), 1);

        let missing_table = WarehouseConfig {
            database: path,
            table: "PATIENTS".to_string(),
            ..WarehouseConfig::default()
        };
        assert!(matches!(
            SqliteCohort::connect(&missing_table),
            Err(SourceError::MissingTable { .. })
        ));
    }
}
