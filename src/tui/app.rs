//! Main TUI application state machine.
//!
//! Handles:
//! - Metric selection
//! - Input event handling
//! - Background dashboard loads via the load worker

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::adapters::SqliteCohort;
use crate::application::{ComparisonService, DashboardSnapshot};
use crate::config::DashboardConfig;
use crate::domain::MetricChoice;

use super::ui::{render_dashboard, DashboardView};
use super::worker::{LoadProgress, LoadWorker, LoadWorkerHandle};

/// Main application state
pub struct App {
    /// Whether the app should quit
    should_quit: bool,

    /// Comparison service shared with the load worker
    service: Arc<ComparisonService<SqliteCohort>>,

    /// Dashboard view state
    view: DashboardView,

    /// Pending load (if running)
    pending_worker: Option<LoadWorkerHandle>,
}

impl App {
    /// Create a new application from configuration.
    ///
    /// # Errors
    /// Returns error if the cohort source cannot be opened.
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let source = SqliteCohort::connect(&config.warehouse)?;
        let service = Arc::new(ComparisonService::new(
            Arc::new(source),
            config.execution_mode,
        ));

        Ok(Self::with_dependencies(service, config.initial_metric))
    }

    /// Create application with an injected service (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(
        service: Arc<ComparisonService<SqliteCohort>>,
        metric: MetricChoice,
    ) -> Self {
        Self {
            should_quit: false,
            service,
            view: DashboardView {
                metric,
                ..DashboardView::default()
            },
            pending_worker: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.start_load();

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();

            terminal.draw(|f| render_dashboard(f, f.area(), &self.view))?;

            // Short poll to stay responsive
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Start a load for the selected metric, replacing any pending one.
    fn start_load(&mut self) {
        tracing::debug!("Loading dashboard for {}", self.view.metric.label());
        self.view.loading = true;
        self.pending_worker = Some(LoadWorker::spawn(self.service.clone(), self.view.metric));
    }

    /// Poll the background worker for progress updates.
    fn poll_worker(&mut self) {
        loop {
            let Some(progress) = self.pending_worker.as_ref().and_then(LoadWorkerHandle::try_recv)
            else {
                break;
            };

            match progress {
                LoadProgress::Loading => {
                    self.view.loading = true;
                }
                LoadProgress::Complete(snapshot) => {
                    self.apply(Ok(snapshot));
                    break;
                }
                LoadProgress::Error(message) => {
                    self.apply(Err(message));
                    break;
                }
            }
        }
    }

    fn apply(&mut self, outcome: std::result::Result<Box<DashboardSnapshot>, String>) {
        let started_for = self.pending_worker.take().map(|w| w.metric);

        // Selector moved while this load ran; the newer load supersedes it.
        if started_for.is_some_and(|m| m != self.view.metric) {
            self.start_load();
            return;
        }

        self.view.loading = false;
        match outcome {
            Ok(snapshot) => {
                self.view.snapshot = Some(snapshot);
                self.view.error = None;
            }
            Err(message) => {
                self.view.snapshot = None;
                self.view.error = Some(message);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key {
            KeyCode::Up | KeyCode::BackTab => self.select_metric(self.view.metric.prev()),
            KeyCode::Down | KeyCode::Tab => self.select_metric(self.view.metric.next()),
            KeyCode::Char('r') | KeyCode::Char('R') => self.start_load(),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn select_metric(&mut self, metric: MetricChoice) {
        if metric == self.view.metric {
            return;
        }
        self.view.metric = metric;

        // A running load picks up the new metric when it completes.
        if self.pending_worker.is_none() {
            self.start_load();
        }
    }
}
