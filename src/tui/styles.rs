//! Dashboard color palette and styles.
//!
//! Colors follow a warm "sandstone" palette; the two box-plot fills match
//! the diabetes legend of the distribution chart.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{DiabetesLabel, SurvivalLabel};

/// Dashboard theme color palette.
pub struct DashboardTheme;

impl DashboardTheme {
    // === Primary Colors ===

    /// Slate blue - Primary (value cards, header)
    pub const PRIMARY: Color = Color::Rgb(50, 93, 136); // #325D88

    /// Lighter slate for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(110, 150, 190); // #6E96BE

    // === Semantic Colors ===

    /// Green - Survived
    pub const SUCCESS: Color = Color::Rgb(147, 197, 75); // #93C54B

    /// Orange - Warning card
    pub const WARNING: Color = Color::Rgb(244, 124, 60); // #F47C3C

    /// Red - Died / errors
    pub const DANGER: Color = Color::Rgb(217, 83, 79); // #D9534F

    /// Cyan - Info card
    pub const INFO: Color = Color::Rgb(41, 171, 224); // #29ABE0

    // === Chart fills ===

    /// Box fill for patients without diabetes
    pub const FILL_NO_DIABETES: Color = Color::Rgb(41, 171, 224); // #29ABE0

    /// Box fill for patients with diabetes
    pub const FILL_DIABETES: Color = Color::Rgb(245, 123, 59); // #F57B3B

    // === Text Colors ===

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 245, 240); // #F8F5F0

    pub const TEXT_SECONDARY: Color = Color::Rgb(191, 183, 174); // #BFB7AE

    pub const TEXT_MUTED: Color = Color::Rgb(142, 140, 132); // #8E8C84

    /// Border gray
    pub const BORDER: Color = Color::Rgb(152, 151, 143); // #98978F

    // === Preset Styles ===

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Style for the selected sidebar entry
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    /// Table header row
    #[must_use]
    pub fn header() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Value-card accent by card theme.
    #[must_use]
    pub fn card(accent: Color) -> Style {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn survival(label: SurvivalLabel) -> Style {
        match label {
            SurvivalLabel::Survived => Style::default().fg(Self::SUCCESS),
            SurvivalLabel::Died => Style::default().fg(Self::DANGER),
        }
    }

    /// Box-plot fill by diabetes status.
    #[must_use]
    pub fn diabetes_fill(label: DiabetesLabel) -> Style {
        match label {
            DiabetesLabel::No => Style::default().fg(Self::FILL_NO_DIABETES),
            DiabetesLabel::Yes => Style::default().fg(Self::FILL_DIABETES),
        }
    }
}
