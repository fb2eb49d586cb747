//! Summary statistics table and key value cards.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::domain::{ComparisonRow, HeadlineMetrics};
use crate::tui::styles::DashboardTheme;

/// Render the "Summary Statistics" card.
pub fn render_summary_table(f: &mut Frame, area: Rect, rows: &[ComparisonRow]) {
    let header = Row::new(ComparisonRow::COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(DashboardTheme::header())
        .height(1);

    let body = rows.iter().map(|row| {
        let [survival, rest @ ..] = row.cells();
        let mut cells = vec![Cell::from(survival).style(DashboardTheme::survival(row.survival))];
        cells.extend(rest.into_iter().map(|c| Cell::from(c).style(DashboardTheme::text())));
        Row::new(cells)
    });

    let widths = [
        Constraint::Length(9),
        Constraint::Length(16),
        Constraint::Length(11),
        Constraint::Length(26),
        Constraint::Length(22),
    ];

    let table = Table::new(body, widths).header(header).block(
        Block::default()
            .title(Span::styled(" Summary Statistics ", DashboardTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(DashboardTheme::border()),
    );

    f.render_widget(table, area);
}

/// Render the "Key Values" card with three value boxes.
pub fn render_key_values(f: &mut Frame, area: Rect, metrics: &HeadlineMetrics) {
    let block = Block::default()
        .title(Span::styled(" Key Values ", DashboardTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(DashboardTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(inner);

    render_value_box(
        f,
        chunks[0],
        "Total Patients",
        &metrics.total_patients.to_string(),
        DashboardTheme::PRIMARY_LIGHT,
    );
    render_value_box(
        f,
        chunks[1],
        "Median Age",
        &metrics.median_age.to_string(),
        DashboardTheme::INFO,
    );
    render_value_box(
        f,
        chunks[2],
        "Survival Rate",
        &metrics.survival_rate,
        DashboardTheme::WARNING,
    );
}

fn render_value_box(f: &mut Frame, area: Rect, title: &str, value: &str, accent: Color) {
    let content = Paragraph::new(vec![
        Line::from(Span::styled(title.to_string(), DashboardTheme::text_secondary())),
        Line::from(""),
        Line::from(Span::styled(value.to_string(), DashboardTheme::card(accent))),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(DashboardTheme::card(accent)),
    );

    f.render_widget(content, area);
}
