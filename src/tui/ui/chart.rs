//! Distribution chart: horizontal box plots of the selected metric.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{BoxSummary, DiabetesLabel, MetricDistribution};
use crate::tui::styles::DashboardTheme;

/// Width reserved for the group label column.
const LABEL_WIDTH: u16 = 16;

/// Render the "Clinical Metric Distribution by Survival" card.
pub fn render_chart(f: &mut Frame, area: Rect, distribution: &MetricDistribution) {
    let block = Block::default()
        .title(Span::styled(
            " Clinical Metric Distribution by Survival ",
            DashboardTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(DashboardTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some((lo, hi)) = distribution.range() else {
        f.render_widget(
            Paragraph::new(Span::styled("No data", DashboardTheme::text_muted())),
            inner,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Axis title
            Constraint::Min(0),    // Boxes
            Constraint::Length(2), // Scale
            Constraint::Length(2), // Legend
        ])
        .margin(1)
        .split(inner);

    let metric = distribution.metric;
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(metric.label(), DashboardTheme::title()),
            Span::styled(format!(" ({})", metric.unit()), DashboardTheme::text_muted()),
            Span::styled(" by Diabetes Status and Survival Outcome", DashboardTheme::text_secondary()),
        ])),
        chunks[0],
    );

    let plot_width = chunks[1].width.saturating_sub(LABEL_WIDTH) as usize;
    let mut lines = Vec::new();
    for group in &distribution.groups {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<9}", group.survival.as_str()),
                DashboardTheme::survival(group.survival),
            ),
            Span::styled(
                format!("{:<7}", group.diabetes.as_str()),
                DashboardTheme::text_secondary(),
            ),
            Span::styled(
                box_line(group, lo, hi, plot_width),
                DashboardTheme::diabetes_fill(group.diabetes),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!("{:>w$}{}", "", summary_text(group), w = LABEL_WIDTH as usize),
            DashboardTheme::text_muted(),
        )));
    }
    f.render_widget(Paragraph::new(lines), chunks[1]);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            scale_line(lo, hi, plot_width, LABEL_WIDTH as usize),
            DashboardTheme::text_muted(),
        ))),
        chunks[2],
    );

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Diabetes: ", DashboardTheme::text_secondary()),
            Span::styled("██ No  ", DashboardTheme::diabetes_fill(DiabetesLabel::No)),
            Span::styled("██ Yes", DashboardTheme::diabetes_fill(DiabetesLabel::Yes)),
        ])),
        chunks[3],
    );
}

fn summary_text(group: &BoxSummary) -> String {
    format!(
        "median {:.1}  IQR {:.1}–{:.1}  n={}",
        group.median, group.q1, group.q3, group.count
    )
}

/// Draw one box plot as text.
///
/// Whiskers span min..max, the box spans q1..q3 and `┃` marks the median.
/// Positions are scaled from `[lo, hi]` onto `width` cells.
#[must_use]
pub fn box_line(group: &BoxSummary, lo: f64, hi: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let pos = |v: f64| -> usize {
        if hi <= lo {
            return 0;
        }
        let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
        (t * (width - 1) as f64).round() as usize
    };

    let mut cells = vec![' '; width];
    let (min, q1, med, q3, max) = (
        pos(group.min),
        pos(group.q1),
        pos(group.median),
        pos(group.q3),
        pos(group.max),
    );

    for cell in &mut cells[min..=max] {
        *cell = '─';
    }
    cells[min] = '├';
    cells[max] = '┤';
    for cell in &mut cells[q1..=q3] {
        *cell = '█';
    }
    cells[med] = '┃';

    cells.into_iter().collect()
}

/// Axis with the low and high bounds at either end.
fn scale_line(lo: f64, hi: f64, width: usize, indent: usize) -> String {
    let left = format!("{lo:.1}");
    let right = format!("{hi:.1}");
    let gap = width.saturating_sub(left.len() + right.len());
    format!("{:indent$}{left}{:gap$}{right}", "", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiabetesLabel, SurvivalLabel};

    fn summary(min: f64, q1: f64, median: f64, q3: f64, max: f64) -> BoxSummary {
        BoxSummary {
            survival: SurvivalLabel::Survived,
            diabetes: DiabetesLabel::No,
            count: 10,
            min,
            q1,
            median,
            q3,
            max,
        }
    }

    #[test]
    fn test_box_line_geometry() {
        let line = box_line(&summary(0.0, 25.0, 50.0, 75.0, 100.0), 0.0, 100.0, 11);
        assert_eq!(line, "├──██┃███─┤");
    }

    #[test]
    fn test_box_line_subrange() {
        let line = box_line(&summary(50.0, 50.0, 50.0, 50.0, 100.0), 0.0, 100.0, 11);
        assert_eq!(line.chars().count(), 11);
        assert!(line.starts_with("     ┃"));
        assert!(line.ends_with('┤'));
    }

    #[test]
    fn test_box_line_degenerate() {
        let line = box_line(&summary(5.0, 5.0, 5.0, 5.0, 5.0), 5.0, 5.0, 4);
        assert_eq!(line, "┃   ");
        assert_eq!(box_line(&summary(0.0, 0.0, 0.0, 0.0, 0.0), 0.0, 1.0, 0), "");
    }

    #[test]
    fn test_scale_line() {
        assert_eq!(scale_line(40.0, 95.0, 12, 2), "  40.0    95.0");
    }
}
