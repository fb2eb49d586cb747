//! TUI module: Terminal User Interface using Ratatui.
//!
//! One dashboard page: metric selector, distribution chart, summary table
//! and key value cards. Loads run on a background worker.

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::DashboardTheme;
pub use ui::{render_dashboard, DashboardView};
pub use worker::{LoadProgress, LoadWorker, LoadWorkerHandle};
