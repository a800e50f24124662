//! Predictor definitions.
//!
//! A predictor bundles everything about one prediction problem that does not
//! come from training: its raw layout, target, task, input rules, how raw
//! model output is postprocessed and how the result is displayed.

pub mod iris;
pub mod movie;
pub mod sales;

pub use iris::IrisMeasurements;
pub use movie::MovieFeatures;
pub use sales::SalesFeatures;

use crate::pipeline::{PipelineError, Stage};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tabula_data::{TargetEncoding, TrainingTable};
use tabula_features::{RawRecord, TableLayout};
use tabula_model::{Postprocess, Task};
use tabula_output::DisplayFormat;

/// The predictors shipped with Tabula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// Iris species classifier
    #[display("iris")]
    Iris,
    /// Movie rating regressor
    #[display("movie")]
    Movie,
    /// Advertising sales regressor
    #[display("sales")]
    Sales,
}

impl PredictorKind {
    /// All predictors.
    pub const fn all() -> [Self; 3] {
        [Self::Iris, Self::Movie, Self::Sales]
    }

    /// Short name used on the command line and in artifact files
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Iris => "iris",
            Self::Movie => "movie",
            Self::Sales => "sales",
        }
    }

    /// Full predictor definition
    pub fn spec(&self) -> PredictorSpec {
        match self {
            Self::Iris => iris::spec(),
            Self::Movie => movie::spec(),
            Self::Sales => sales::spec(),
        }
    }

    /// Seeded synthetic training table
    pub fn synthetic(&self, seed: u64) -> TrainingTable {
        match self {
            Self::Iris => iris::synthetic(seed),
            Self::Movie => movie::synthetic(seed),
            Self::Sales => sales::synthetic(seed),
        }
    }
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown predictor {:?} (expected iris, movie or sales)", s))
    }
}

/// Constraint on a numeric input field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Strictly greater than zero
    Positive,
    /// Zero or more
    NonNegative,
    /// Whole number within optional bounds
    Integer {
        /// Inclusive lower bound
        min: Option<i64>,
        /// Inclusive upper bound
        max: Option<i64>,
    },
}

impl FieldRule {
    /// Check a value, returning the reason it was rejected.
    pub fn check(&self, value: f64) -> Result<(), String> {
        match *self {
            Self::Positive if value <= 0.0 => Err("must be positive".to_string()),
            Self::NonNegative if value < 0.0 => Err("must be non-negative".to_string()),
            Self::Integer { min, max } => {
                if value.fract() != 0.0 {
                    return Err(format!("must be a whole number, got {}", value));
                }
                let v = value as i64;
                match (min, max) {
                    (Some(lo), Some(hi)) if v < lo || v > hi => {
                        Err(format!("must be between {} and {}", lo, hi))
                    }
                    (Some(lo), None) if v < lo => Err(format!("must be at least {}", lo)),
                    (None, Some(hi)) if v > hi => Err(format!("must be at most {}", hi)),
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// A rule bound to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraint {
    /// Numeric field name
    pub field: String,
    /// Rule applied to it
    #[serde(flatten)]
    pub rule: FieldRule,
}

impl FieldConstraint {
    /// Bind a rule to a field
    pub fn new(field: impl Into<String>, rule: FieldRule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }
}

/// Definition of one prediction problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorSpec {
    /// Predictor name
    pub name: String,
    /// Declared raw input columns
    pub layout: TableLayout,
    /// Target column name
    pub target: String,
    /// How target cells are stored in tables
    pub target_encoding: TargetEncoding,
    /// Learning task
    pub task: Task,
    /// Input rules checked before encoding
    pub rules: Vec<FieldConstraint>,
    /// Raw output to outcome
    pub postprocess: Postprocess,
    /// Outcome to text
    pub display: DisplayFormat,
}

impl PredictorSpec {
    /// Check that a record carries every declared field, that numeric fields
    /// parse, and that every rule holds.
    pub fn validate(&self, record: &RawRecord) -> Result<(), PipelineError> {
        for column in self.layout.columns() {
            record
                .require(&column.name)
                .map_err(|_| PipelineError::MissingField {
                    field: column.name.clone(),
                    stage: Stage::Validating,
                })?;
        }
        for field in self.layout.numeric() {
            record
                .number(field)
                .map_err(|e| PipelineError::from_feature(e, Stage::Validating))?;
        }
        for constraint in &self.rules {
            let value = record
                .number(&constraint.field)
                .map_err(|e| PipelineError::from_feature(e, Stage::Validating))?;
            constraint
                .rule
                .check(value)
                .map_err(|reason| PipelineError::InputValidation {
                    field: constraint.field.clone(),
                    reason,
                    stage: Stage::Validating,
                })?;
        }
        Ok(())
    }

    /// Field names in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.layout.columns().iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FieldRule::Positive, 0.0, false)]
    #[case(FieldRule::Positive, 0.1, true)]
    #[case(FieldRule::NonNegative, 0.0, true)]
    #[case(FieldRule::NonNegative, -1.0, false)]
    #[case(FieldRule::Integer { min: Some(1888), max: Some(2025) }, 1887.0, false)]
    #[case(FieldRule::Integer { min: Some(1888), max: Some(2025) }, 2025.0, true)]
    #[case(FieldRule::Integer { min: Some(1888), max: Some(2025) }, 1999.5, false)]
    #[case(FieldRule::Integer { min: Some(1), max: None }, 0.0, false)]
    fn test_field_rules(#[case] rule: FieldRule, #[case] value: f64, #[case] ok: bool) {
        assert_eq!(rule.check(value).is_ok(), ok);
    }

    #[test]
    fn test_parse_predictor_kind() {
        assert_eq!("Movie".parse::<PredictorKind>(), Ok(PredictorKind::Movie));
        assert!("titanic".parse::<PredictorKind>().is_err());
        for kind in PredictorKind::all() {
            assert_eq!(kind.to_string(), kind.name());
            assert_eq!(kind.spec().name, kind.name());
        }
    }

    #[test]
    fn test_validate_reports_field() {
        let spec = PredictorKind::Movie.spec();
        let record = MovieFeatures {
            genre: "Action".into(),
            director: "Nolan".into(),
            actor1: "Hanks".into(),
            actor2: "Streep".into(),
            year: 1850,
            runtime: 120,
        }
        .into();

        let err = spec.validate(&record).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InputValidation { ref field, .. } if field == "Year"
        ));
        assert_eq!(
            err.to_string(),
            "Invalid input for Year: must be between 1888 and 2025"
        );
    }

    #[test]
    fn test_validate_missing_and_non_numeric() {
        let spec = PredictorKind::Sales.spec();
        let mut record: RawRecord = SalesFeatures {
            tv: 100.0,
            radio: 10.0,
            newspaper: 5.0,
            age_group: "Adult".into(),
            platform: "Online".into(),
        }
        .into();
        assert!(spec.validate(&record).is_ok());

        record.insert("Radio", "a lot");
        assert!(matches!(
            spec.validate(&record),
            Err(PipelineError::InputValidation { ref field, .. }) if field == "Radio"
        ));

        let partial = RawRecord::new().with("TV", 1.0);
        assert!(matches!(
            spec.validate(&partial),
            Err(PipelineError::MissingField { ref field, .. }) if field == "Radio"
        ));
    }
}
