//! Comparison output types.
//!
//! Everything the presentation layer consumes: the grouped comparison table,
//! the headline metrics and the per-group distribution of a selected metric.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::patient::Column;

/// Survival outcome label derived from DEATH_EVENT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurvivalLabel {
    Died,
    Survived,
}

impl SurvivalLabel {
    /// Map a raw DEATH_EVENT value. Only 0 and 1 have a label.
    #[must_use]
    pub fn from_death_event(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Died),
            0 => Some(Self::Survived),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Died => "Died",
            Self::Survived => "Survived",
        }
    }
}

impl std::fmt::Display for SurvivalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diabetes status label derived from DIABETES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiabetesLabel {
    Yes,
    No,
}

impl DiabetesLabel {
    /// Map a raw DIABETES value. Only 0 and 1 have a label.
    #[must_use]
    pub fn from_diabetes(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Yes),
            0 => Some(Self::No),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl std::fmt::Display for DiabetesLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display order of labelled groups.
///
/// Survival label descending by string comparison ("Survived" before
/// "Died"), then diabetes label ascending ("No" before "Yes").
#[must_use]
pub fn group_order(
    a: (SurvivalLabel, DiabetesLabel),
    b: (SurvivalLabel, DiabetesLabel),
) -> Ordering {
    b.0.as_str()
        .cmp(a.0.as_str())
        .then_with(|| a.1.as_str().cmp(b.1.as_str()))
}

/// One row of the summary statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    #[serde(rename = "Survival")]
    pub survival: SurvivalLabel,

    #[serde(rename = "Diabetes Status")]
    pub diabetes: DiabetesLabel,

    #[serde(rename = "Median Age")]
    pub median_age: f64,

    #[serde(rename = "Median Creatinine (mg/dL)")]
    pub median_serum_creatinine: f64,

    #[serde(rename = "Median Sodium (mEq/L)")]
    pub median_serum_sodium: f64,
}

impl ComparisonRow {
    /// Column headers, in field order.
    pub const COLUMNS: [&'static str; 5] = [
        "Survival",
        "Diabetes Status",
        "Median Age",
        "Median Creatinine (mg/dL)",
        "Median Sodium (mEq/L)",
    ];

    /// Table cells, in the order of [`Self::COLUMNS`].
    #[must_use]
    pub fn cells(&self) -> [String; 5] {
        [
            self.survival.to_string(),
            self.diabetes.to_string(),
            format_number(self.median_age),
            format!("{:.2}", self.median_serum_creatinine),
            format_number(self.median_serum_sodium),
        ]
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Key values shown on the dashboard cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    /// Number of patients in the cohort
    pub total_patients: u64,

    /// Median age, rounded half-to-even
    pub median_age: i64,

    /// Survival rate as an integer percentage, e.g. "68%"
    pub survival_rate: String,
}

impl HeadlineMetrics {
    #[must_use]
    pub fn new(total_patients: u64, median_age: i64, survival_percent: i64) -> Self {
        Self {
            total_patients,
            median_age,
            survival_rate: format!("{survival_percent}%"),
        }
    }
}

/// Clinical metric selectable in the dashboard sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MetricChoice {
    #[default]
    Age,
    SerumSodium,
    SerumCreatinine,
}

impl MetricChoice {
    pub const ALL: [MetricChoice; 3] = [
        MetricChoice::Age,
        MetricChoice::SerumSodium,
        MetricChoice::SerumCreatinine,
    ];

    #[must_use]
    pub fn column(&self) -> Column {
        match self {
            Self::Age => Column::Age,
            Self::SerumSodium => Column::SerumSodium,
            Self::SerumCreatinine => Column::SerumCreatinine,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.column().display_name()
    }

    /// Unit suffix for axis labels.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Age => "years",
            Self::SerumSodium => "mEq/L",
            Self::SerumCreatinine => "mg/dL",
        }
    }

    /// Next choice in selector order, wrapping around.
    #[must_use]
    pub fn next(&self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous choice in selector order, wrapping around.
    #[must_use]
    pub fn prev(&self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Age => 0,
            Self::SerumSodium => 1,
            Self::SerumCreatinine => 2,
        }
    }
}

impl FromStr for MetricChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "age" => Ok(Self::Age),
            "serum_sodium" | "sodium" => Ok(Self::SerumSodium),
            "serum_creatinine" | "creatinine" => Ok(Self::SerumCreatinine),
            other => Err(format!("Unknown metric: {other}")),
        }
    }
}

/// Five-number summary of one metric within a (survival, diabetes) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub survival: SurvivalLabel,
    pub diabetes: DiabetesLabel,
    pub count: u64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxSummary {
    /// Interquartile range.
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Distribution of the selected metric across all groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDistribution {
    pub metric: MetricChoice,
    pub groups: Vec<BoxSummary>,
}

impl MetricDistribution {
    /// Smallest and largest observed value across every group.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        self.groups.iter().fold(None, |acc, g| match acc {
            None => Some((g.min, g.max)),
            Some((lo, hi)) => Some((lo.min(g.min), hi.max(g.max))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(SurvivalLabel::from_death_event(1), Some(SurvivalLabel::Died));
        assert_eq!(SurvivalLabel::from_death_event(0), Some(SurvivalLabel::Survived));
        assert_eq!(SurvivalLabel::from_death_event(2), None);
        assert_eq!(DiabetesLabel::from_diabetes(1), Some(DiabetesLabel::Yes));
        assert_eq!(DiabetesLabel::from_diabetes(-1), None);
    }

    #[test]
    fn test_group_order() {
        let mut groups = vec![
            (SurvivalLabel::Died, DiabetesLabel::Yes),
            (SurvivalLabel::Survived, DiabetesLabel::Yes),
            (SurvivalLabel::Died, DiabetesLabel::No),
            (SurvivalLabel::Survived, DiabetesLabel::No),
        ];
        groups.sort_by(|a, b| group_order(*a, *b));

        assert_eq!(
            groups,
            vec![
                (SurvivalLabel::Survived, DiabetesLabel::No),
                (SurvivalLabel::Survived, DiabetesLabel::Yes),
                (SurvivalLabel::Died, DiabetesLabel::No),
                (SurvivalLabel::Died, DiabetesLabel::Yes),
            ]
        );
    }

    #[test]
    fn test_row_serializes_with_display_names() {
        let row = ComparisonRow {
            survival: SurvivalLabel::Survived,
            diabetes: DiabetesLabel::No,
            median_age: 60.0,
            median_serum_creatinine: 1.0,
            median_serum_sodium: 140.0,
        };

        let json = serde_json::to_value(&row).expect("Should serialize");
        assert_eq!(json["Survival"], "Survived");
        assert_eq!(json["Diabetes Status"], "No");
        assert_eq!(json["Median Creatinine (mg/dL)"], 1.0);
        assert!(json["Median Creatinine (mg/dL)"].is_f64());
    }

    #[test]
    fn test_row_cells() {
        let row = ComparisonRow {
            survival: SurvivalLabel::Died,
            diabetes: DiabetesLabel::Yes,
            median_age: 65.5,
            median_serum_creatinine: 1.3,
            median_serum_sodium: 136.0,
        };
        assert_eq!(row.cells(), ["Died", "Yes", "65.5", "1.30", "136"].map(String::from));
    }

    #[test]
    fn test_headline_rate_format() {
        let metrics = HeadlineMetrics::new(299, 60, 68);
        assert_eq!(metrics.survival_rate, "68%");
    }

    #[test]
    fn test_metric_choice_cycle_and_parse() {
        assert_eq!(MetricChoice::Age.next(), MetricChoice::SerumSodium);
        assert_eq!(MetricChoice::Age.prev(), MetricChoice::SerumCreatinine);
        assert_eq!("Serum Sodium".parse::<MetricChoice>(), Ok(MetricChoice::SerumSodium));
        assert_eq!("creatinine".parse::<MetricChoice>(), Ok(MetricChoice::SerumCreatinine));
        assert!("ejection_fraction".parse::<MetricChoice>().is_err());
    }

    #[test]
    fn test_distribution_range() {
        let summary = |min, max| BoxSummary {
            survival: SurvivalLabel::Died,
            diabetes: DiabetesLabel::No,
            count: 3,
            min,
            q1: min,
            median: min,
            q3: max,
            max,
        };
        let dist = MetricDistribution {
            metric: MetricChoice::Age,
            groups: vec![summary(50.0, 70.0), summary(42.0, 65.0)],
        };
        assert_eq!(dist.range(), Some((42.0, 70.0)));

        let empty = MetricDistribution {
            metric: MetricChoice::Age,
            groups: vec![],
        };
        assert_eq!(empty.range(), None);
    }
}
