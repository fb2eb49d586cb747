//! UI module: View components for the TUI.

pub mod chart;
pub mod summary;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::application::DashboardSnapshot;
use crate::domain::MetricChoice;
use crate::tui::styles::DashboardTheme;

use self::chart::render_chart;
use self::summary::{render_key_values, render_summary_table};

/// What the dashboard currently shows.
#[derive(Debug, Default)]
pub struct DashboardView {
    /// Metric selected in the sidebar
    pub metric: MetricChoice,

    /// Last successful load
    pub snapshot: Option<Box<DashboardSnapshot>>,

    /// A load is in flight
    pub loading: bool,

    /// Last load failed; replaces the whole view
    pub error: Option<String>,
}

/// Render the full dashboard page.
pub fn render_dashboard(f: &mut Frame, area: Rect, view: &DashboardView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], view);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(chunks[1]);

    render_sidebar(f, body[0], view.metric);
    render_body(f, body[1], view);
    render_footer(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, view: &DashboardView) {
    let mut spans = vec![
        Span::styled(" ♥ ", DashboardTheme::danger()),
        Span::styled("Heart Failure Data Dashboard", DashboardTheme::title()),
    ];

    if let Some(snapshot) = &view.snapshot {
        spans.push(Span::styled(" │ ", DashboardTheme::text_muted()));
        spans.push(Span::styled(
            format!(
                "{} · {} · {}",
                snapshot.source,
                snapshot.mode,
                snapshot.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            DashboardTheme::text_secondary(),
        ));
    }
    if view.loading {
        spans.push(Span::styled("  loading…", DashboardTheme::text_muted()));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(DashboardTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_sidebar(f: &mut Frame, area: Rect, selected: MetricChoice) {
    let mut lines = vec![
        Line::from(Span::styled("Select a clinical metric:", DashboardTheme::text_secondary())),
        Line::from(""),
    ];

    for metric in MetricChoice::ALL {
        let line = if metric == selected {
            Line::from(Span::styled(format!(" ▸ {} ", metric.label()), DashboardTheme::selected()))
        } else {
            Line::from(Span::styled(format!("   {} ", metric.label()), DashboardTheme::text()))
        };
        lines.push(line);
    }

    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::RIGHT)
            .border_style(DashboardTheme::border()),
    );

    f.render_widget(sidebar, area);
}

fn render_body(f: &mut Frame, area: Rect, view: &DashboardView) {
    if let Some(err) = &view.error {
        render_error(f, area, err);
        return;
    }

    let Some(snapshot) = &view.snapshot else {
        render_loading(f, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_chart(f, columns[0], &snapshot.distribution);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(snapshot.comparison.len() as u16 + 3),
            Constraint::Min(7),
        ])
        .split(columns[1]);

    render_summary_table(f, right[0], &snapshot.comparison);
    render_key_values(f, right[1], &snapshot.metrics);
}

fn render_loading(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("Loading cohort...", DashboardTheme::text_muted())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(DashboardTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Cannot Load Dashboard", DashboardTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), DashboardTheme::text())),
        Line::from(""),
        Line::from(Span::styled("Press [R] to retry", DashboardTheme::text_secondary())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(DashboardTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[↑/↓] ", DashboardTheme::key_hint()),
        Span::styled("Metric ", DashboardTheme::key_desc()),
        Span::styled("[R] ", DashboardTheme::key_hint()),
        Span::styled("Reload ", DashboardTheme::key_desc()),
        Span::styled("[Q] ", DashboardTheme::key_hint()),
        Span::styled("Quit", DashboardTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(DashboardTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCohort;
    use crate::application::ComparisonService;
    use crate::domain::PatientRecord;
    use crate::ports::ExecutionMode;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn draw(view: &DashboardView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("terminal");
        terminal
            .draw(|f| render_dashboard(f, f.area(), view))
            .expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_snapshot() {
        let service = ComparisonService::new(
            Arc::new(MemoryCohort::new(vec![
                PatientRecord::new(60.0, 0, 0, 1.0, 140.0),
                PatientRecord::new(80.0, 1, 0, 2.0, 130.0),
            ])),
            ExecutionMode::Eager,
        );
        let snapshot = service.load_snapshot(MetricChoice::Age).expect("Should load");

        let view = DashboardView {
            metric: MetricChoice::Age,
            snapshot: Some(Box::new(snapshot)),
            ..DashboardView::default()
        };
        let screen = draw(&view);

        assert!(screen.contains("Heart Failure Data Dashboard"));
        assert!(screen.contains("Summary Statistics"));
        assert!(screen.contains("Total Patients"));
        assert!(screen.contains("50%"));
        assert!(screen.contains("Survived"));
    }

    #[test]
    fn test_error_replaces_view() {
        let view = DashboardView {
            error: Some("Cohort is empty: median age is undefined".to_string()),
            ..DashboardView::default()
        };
        let screen = draw(&view);

        assert!(screen.contains("Cannot Load Dashboard"));
        assert!(!screen.contains("Key Values"));
    }
}
