//! Patient record types for the heart-failure cohort.
//!
//! Columns follow the heart-failure clinical records table as stored in the
//! warehouse (AGE, DEATH_EVENT, DIABETES, SERUM_CREATININE, SERUM_SODIUM).

use serde::{Deserialize, Serialize};

/// One row of the source cohort.
///
/// Indicator columns are kept as stored (integers) so that out-of-range
/// values survive until aggregation, where they are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,

    /// Follow-up outcome: 1 = died, 0 = survived
    pub death_event: i64,

    /// Diabetes: 1 = yes, 0 = no
    pub diabetes: i64,

    /// Serum creatinine in mg/dL
    pub serum_creatinine: f64,

    /// Serum sodium in mEq/L
    pub serum_sodium: f64,
}

impl PatientRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(
        age: f64,
        death_event: i64,
        diabetes: i64,
        serum_creatinine: f64,
        serum_sodium: f64,
    ) -> Self {
        Self {
            age,
            death_event,
            diabetes,
            serum_creatinine,
            serum_sodium,
        }
    }

    /// Numeric value of a column.
    #[must_use]
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::Age => self.age,
            Column::DeathEvent => self.death_event as f64,
            Column::Diabetes => self.diabetes as f64,
            Column::SerumCreatinine => self.serum_creatinine,
            Column::SerumSodium => self.serum_sodium,
        }
    }

    /// Raw value of an indicator column.
    #[must_use]
    pub fn indicator(&self, indicator: Indicator) -> i64 {
        match indicator {
            Indicator::DeathEvent => self.death_event,
            Indicator::Diabetes => self.diabetes,
        }
    }

    /// Check that both indicator columns are 0 or 1.
    ///
    /// # Errors
    /// Returns the validation messages for every offending column.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for indicator in Indicator::ALL {
            let value = self.indicator(indicator);
            if value != 0 && value != 1 {
                errors.push(format!(
                    "{} {} must be 0 or 1",
                    indicator.column().display_name(),
                    value
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A column of the cohort table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Age,
    DeathEvent,
    Diabetes,
    SerumCreatinine,
    SerumSodium,
}

impl Column {
    /// Every column, in table order.
    pub const ALL: [Column; 5] = [
        Column::Age,
        Column::DeathEvent,
        Column::Diabetes,
        Column::SerumCreatinine,
        Column::SerumSodium,
    ];

    /// Column name in the warehouse table.
    #[must_use]
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Age => "AGE",
            Self::DeathEvent => "DEATH_EVENT",
            Self::Diabetes => "DIABETES",
            Self::SerumCreatinine => "SERUM_CREATININE",
            Self::SerumSodium => "SERUM_SODIUM",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::DeathEvent => "Death event",
            Self::Diabetes => "Diabetes",
            Self::SerumCreatinine => "Serum Creatinine",
            Self::SerumSodium => "Serum Sodium",
        }
    }
}

/// Integer-valued 0/1 columns that the cohort can be partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    DeathEvent,
    Diabetes,
}

impl Indicator {
    pub const ALL: [Indicator; 2] = [Indicator::DeathEvent, Indicator::Diabetes];

    /// The table column backing this indicator.
    #[must_use]
    pub fn column(&self) -> Column {
        match self {
            Self::DeathEvent => Column::DeathEvent,
            Self::Diabetes => Column::Diabetes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_by_column() {
        let record = PatientRecord::new(65.0, 1, 0, 1.9, 137.0);
        assert!((record.value(Column::Age) - 65.0).abs() < f64::EPSILON);
        assert!((record.value(Column::DeathEvent) - 1.0).abs() < f64::EPSILON);
        assert!((record.value(Column::SerumCreatinine) - 1.9).abs() < f64::EPSILON);
        assert_eq!(record.indicator(Indicator::Diabetes), 0);
    }

    #[test]
    fn test_validation() {
        let valid = PatientRecord::new(60.0, 0, 1, 1.1, 136.0);
        assert!(valid.validate().is_ok());

        let invalid = PatientRecord::new(60.0, 3, 2, 1.1, 136.0);
        let errors = invalid.validate().expect_err("Should reject indicators");
        assert_eq!(errors.len(), 2);
        assert!(errors[1].contains("Diabetes 2"));
    }

    #[test]
    fn test_indicator_columns() {
        assert_eq!(Indicator::DeathEvent.column().sql_name(), "DEATH_EVENT");
        assert_eq!(Indicator::Diabetes.column().sql_name(), "DIABETES");
    }
}
