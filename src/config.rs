//! Dashboard configuration.
//!
//! Connection settings are passed explicitly to adapters; nothing here is
//! process-wide state. `from_env_or_default` is the only place that reads the
//! environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::MetricChoice;
use crate::ports::ExecutionMode;

/// Location of the cohort table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Compute warehouse label (informational for file-backed sources)
    pub warehouse: String,

    /// Database to open; for SQLite this is the file path
    pub database: PathBuf,

    /// Schema holding the cohort table
    pub schema: String,

    /// Cohort table name
    pub table: String,

    /// Named connection identity, used for logging only
    pub connection_name: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            warehouse: "DEFAULT_WH".to_string(),
            database: PathBuf::from("heart_failure.db"),
            schema: "main".to_string(),
            table: "HEART_FAILURE".to_string(),
            connection_name: "workbench".to_string(),
        }
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when running the TUI, stderr otherwise
    #[default]
    Auto,
    File,
    Stderr,
}

/// How the dashboard is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// TUI on an interactive terminal, JSON otherwise
    #[default]
    Auto,
    Tui,
    Json,
}

/// Top-level configuration for one dashboard instance.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub warehouse: WarehouseConfig,
    pub execution_mode: ExecutionMode,
    pub initial_metric: MetricChoice,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub output: OutputMode,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseConfig::default(),
            execution_mode: ExecutionMode::default(),
            initial_metric: MetricChoice::default(),
            log_mode: LogMode::default(),
            log_file: PathBuf::from("cohortlens.log"),
            output: OutputMode::default(),
        }
    }
}

impl DashboardConfig {
    /// Load config overrides from the process environment (best-effort).
    ///
    /// Supported:
    /// - COHORTLENS_WAREHOUSE, COHORTLENS_DATABASE, COHORTLENS_SCHEMA,
    ///   COHORTLENS_TABLE, COHORTLENS_CONNECTION
    /// - COHORTLENS_EXECUTION_MODE = eager | pushdown
    /// - COHORTLENS_METRIC = age | serum_sodium | serum_creatinine
    /// - COHORTLENS_LOG_MODE = auto | file | stderr, COHORTLENS_LOG_FILE
    /// - COHORTLENS_OUTPUT = auto | tui | json
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env_or_default`] with a custom variable lookup.
    ///
    /// Invalid values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("COHORTLENS_WAREHOUSE") {
            cfg.warehouse.warehouse = v;
        }
        if let Some(v) = get("COHORTLENS_DATABASE") {
            cfg.warehouse.database = PathBuf::from(v);
        }
        if let Some(v) = get("COHORTLENS_SCHEMA") {
            cfg.warehouse.schema = v;
        }
        if let Some(v) = get("COHORTLENS_TABLE") {
            cfg.warehouse.table = v;
        }
        if let Some(v) = get("COHORTLENS_CONNECTION") {
            cfg.warehouse.connection_name = v;
        }

        if let Some(v) = get("COHORTLENS_EXECUTION_MODE") {
            match v.parse() {
                Ok(mode) => cfg.execution_mode = mode,
                Err(e) => tracing::warn!("Ignoring COHORTLENS_EXECUTION_MODE: {}", e),
            }
        }

        if let Some(v) = get("COHORTLENS_METRIC") {
            match v.parse() {
                Ok(metric) => cfg.initial_metric = metric,
                Err(e) => tracing::warn!("Ignoring COHORTLENS_METRIC: {}", e),
            }
        }

        if let Some(v) = get("COHORTLENS_LOG_MODE") {
            cfg.log_mode = match v.to_lowercase().as_str() {
                "file" => LogMode::File,
                "stderr" | "stdout" => LogMode::Stderr,
                _ => LogMode::Auto,
            };
        }
        if let Some(v) = get("COHORTLENS_LOG_FILE") {
            cfg.log_file = PathBuf::from(v);
        }

        if let Some(v) = get("COHORTLENS_OUTPUT") {
            cfg.output = match v.to_lowercase().as_str() {
                "tui" => OutputMode::Tui,
                "json" => OutputMode::Json,
                _ => OutputMode::Auto,
            };
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = DashboardConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.warehouse, WarehouseConfig::default());
        assert_eq!(cfg.warehouse.table, "HEART_FAILURE");
        assert_eq!(cfg.execution_mode, ExecutionMode::Pushdown);
        assert_eq!(cfg.initial_metric, MetricChoice::Age);
        assert_eq!(cfg.output, OutputMode::Auto);
    }

    #[test]
    fn test_overrides() {
        let cfg = DashboardConfig::from_lookup(lookup(&[
            ("COHORTLENS_DATABASE", "/data/cohort.db"),
            ("COHORTLENS_TABLE", "HF_2017"),
            ("COHORTLENS_EXECUTION_MODE", "eager"),
            ("COHORTLENS_METRIC", "serum_sodium"),
            ("COHORTLENS_LOG_MODE", "file"),
            ("COHORTLENS_OUTPUT", "json"),
        ]));

        assert_eq!(cfg.warehouse.database, PathBuf::from("/data/cohort.db"));
        assert_eq!(cfg.warehouse.table, "HF_2017");
        assert_eq!(cfg.execution_mode, ExecutionMode::Eager);
        assert_eq!(cfg.initial_metric, MetricChoice::SerumSodium);
        assert_eq!(cfg.log_mode, LogMode::File);
        assert_eq!(cfg.output, OutputMode::Json);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let cfg = DashboardConfig::from_lookup(lookup(&[
            ("COHORTLENS_EXECUTION_MODE", "distributed"),
            ("COHORTLENS_METRIC", "platelets"),
            ("COHORTLENS_SCHEMA", "   "),
        ]));

        assert_eq!(cfg.execution_mode, ExecutionMode::Pushdown);
        assert_eq!(cfg.initial_metric, MetricChoice::Age);
        assert_eq!(cfg.warehouse.schema, "main");
    }
}
