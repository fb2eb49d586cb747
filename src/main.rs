//! Cohortlens: heart-failure cohort comparison dashboard
//!
//! Main entry point. Runs the TUI on an interactive terminal and prints a
//! JSON snapshot otherwise.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cohortlens::adapters::redact::RedactingMakeWriter;
use cohortlens::adapters::SqliteCohort;
use cohortlens::config::{DashboardConfig, LogMode, OutputMode};
use cohortlens::tui::App;
use cohortlens::{ComparisonService, DashboardError};

fn main() -> Result<()> {
    let config = DashboardConfig::from_env_or_default();

    let interactive = std::io::stdout().is_terminal();
    let use_tui = match config.output {
        OutputMode::Tui if !interactive => {
            return Err(DashboardError::Config(
                "TUI output requested but stdout is not a terminal".to_string(),
            )
            .into());
        }
        OutputMode::Tui => true,
        OutputMode::Json => false,
        OutputMode::Auto => interactive,
    };

    // Logging to the terminal would corrupt the TUI (alternate screen).
    let _guard = init_logging(&config, use_tui)?;

    tracing::info!(
        "Starting Cohortlens ({} via {}, {} mode)",
        config.warehouse.table,
        config.warehouse.connection_name,
        config.execution_mode
    );

    if use_tui {
        let mut app = App::new(&config)?;
        app.run()?;
    } else {
        let source = SqliteCohort::connect(&config.warehouse)?;
        let service = ComparisonService::new(Arc::new(source), config.execution_mode);
        let snapshot = service.load_snapshot(config.initial_metric)?;
        println!("{}", snapshot.to_json()?);
    }

    tracing::info!("Cohortlens shutdown complete.");
    Ok(())
}

fn init_logging(config: &DashboardConfig, use_tui: bool) -> Result<WorkerGuard> {
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stderr => false,
        LogMode::Auto => use_tui,
    };

    let (writer, guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: the open below reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!use_file)
                .with_writer(RedactingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}
