//! Output Postprocessing
//!
//! Turns a raw [`Prediction`] into a final [`Outcome`]: a class label with a
//! confidence percentage, or a continuous value clipped to a legal range.

use crate::model::{ModelError, Prediction};
use serde::{Deserialize, Serialize};

/// Final, user-facing prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Classification result
    Class {
        /// Class label
        label: String,
        /// Index of the class in the label list
        class_index: usize,
        /// Probability of the predicted class as a percentage in [0, 100]
        confidence: f64,
    },
    /// Regression result
    Value {
        /// Predicted value after clipping
        value: f64,
    },
}

impl Outcome {
    /// Class label, if this is a classification outcome
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Class { label, .. } => Some(label),
            Self::Value { .. } => None,
        }
    }

    /// Continuous value, if this is a regression outcome
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value { value } => Some(*value),
            Self::Class { .. } => None,
        }
    }
}

/// How raw model output becomes an [`Outcome`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Postprocess {
    /// Map class index to label and report its probability
    Classify {
        /// Labels indexed by class
        labels: Vec<String>,
    },
    /// Clip a continuous value into `[min, max]`; open ends are unbounded
    Clip {
        /// Lower bound
        #[serde(default)]
        min: Option<f64>,
        /// Upper bound
        #[serde(default)]
        max: Option<f64>,
    },
}

impl Postprocess {
    /// Classification with the given labels
    pub fn classify<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Classify {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Regression clipped into `[min, max]`
    pub const fn clip(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Clip { min, max }
    }

    /// Number of class labels (0 for regression)
    pub fn n_labels(&self) -> usize {
        match self {
            Self::Classify { labels } => labels.len(),
            Self::Clip { .. } => 0,
        }
    }

    /// Apply to a raw prediction
    pub fn apply(&self, prediction: &Prediction) -> Result<Outcome, ModelError> {
        match (self, prediction) {
            (
                Self::Classify { labels },
                Prediction::Class {
                    index,
                    probabilities,
                },
            ) => {
                let label = labels
                    .get(*index)
                    .ok_or(ModelError::UnknownClass(*index))?;
                let p = probabilities.get(*index).copied().unwrap_or(0.0);
                Ok(Outcome::Class {
                    label: label.clone(),
                    class_index: *index,
                    confidence: (p * 100.0).clamp(0.0, 100.0),
                })
            }
            (Self::Clip { min, max }, Prediction::Value(value)) => {
                if !value.is_finite() {
                    return Err(ModelError::NonFinite(*value));
                }
                let mut v = *value;
                if let Some(lo) = min {
                    v = v.max(*lo);
                }
                if let Some(hi) = max {
                    v = v.min(*hi);
                }
                Ok(Outcome::Value { value: v })
            }
            (Self::Classify { .. }, Prediction::Value(_)) => Err(ModelError::TaskMismatch(
                "class labels configured but model returned a value".to_string(),
            )),
            (Self::Clip { .. }, Prediction::Class { .. }) => Err(ModelError::TaskMismatch(
                "value clipping configured but model returned a class".to_string(),
            )),
        }
    }
}
