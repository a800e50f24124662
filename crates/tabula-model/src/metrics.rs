//! Holdout Metrics
//!
//! Scores computed on the held-out partition after training. Classification
//! reports accuracy; regression reports RMSE, MAE and R².

use crate::model::{ModelError, Task};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Evaluation of a fitted model on held-out rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum HoldoutMetrics {
    /// Classification scores
    Classification {
        /// Fraction of rows predicted correctly
        accuracy: f64,
        /// Number of evaluated rows
        n_rows: usize,
    },
    /// Regression scores
    Regression {
        /// Root mean squared error
        rmse: f64,
        /// Mean absolute error
        mae: f64,
        /// Coefficient of determination
        r2: f64,
        /// Number of evaluated rows
        n_rows: usize,
    },
}

impl HoldoutMetrics {
    /// Score predictions against actual targets for a task.
    pub fn evaluate(
        task: Task,
        actual: ArrayView1<'_, f64>,
        predicted: ArrayView1<'_, f64>,
    ) -> Result<Self, ModelError> {
        if actual.len() != predicted.len() {
            return Err(ModelError::LengthMismatch {
                rows: predicted.len(),
                targets: actual.len(),
            });
        }
        if actual.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n_rows = actual.len();
        Ok(match task {
            Task::Classification => Self::Classification {
                accuracy: accuracy(actual, predicted),
                n_rows,
            },
            Task::Regression => Self::Regression {
                rmse: rmse(actual, predicted),
                mae: mae(actual, predicted),
                r2: r2(actual, predicted),
                n_rows,
            },
        })
    }

    /// Number of evaluated rows
    pub const fn n_rows(&self) -> usize {
        match self {
            Self::Classification { n_rows, .. } | Self::Regression { n_rows, .. } => *n_rows,
        }
    }
}

/// Fraction of exact matches
pub fn accuracy(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let hits = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    hits as f64 / actual.len().max(1) as f64
}

/// Root mean squared error
pub fn rmse(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let diff = &actual - &predicted;
    diff.mapv(|d| d * d).mean().unwrap_or(0.0).sqrt()
}

/// Mean absolute error
pub fn mae(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let diff = &actual - &predicted;
    diff.mapv(f64::abs).mean().unwrap_or(0.0)
}

/// Coefficient of determination; 0 when the targets are constant
pub fn r2(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let mean = actual.mean().unwrap_or(0.0);
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_regression_scores() {
        let actual = array![3.0, -0.5, 2.0, 7.0];
        let predicted = array![2.5, 0.0, 2.0, 8.0];

        let metrics =
            HoldoutMetrics::evaluate(Task::Regression, actual.view(), predicted.view()).unwrap();
        let HoldoutMetrics::Regression { rmse, mae, r2, n_rows } = metrics else {
            panic!("expected regression metrics");
        };
        assert_eq!(n_rows, 4);
        assert_relative_eq!(mae, 0.5, epsilon = 1e-12);
        assert_relative_eq!(rmse, 0.375_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(r2, 0.948_608_137_044_967_9, epsilon = 1e-9);
    }

    #[test]
    fn test_accuracy() {
        let metrics = HoldoutMetrics::evaluate(
            Task::Classification,
            array![0.0, 1.0, 2.0, 2.0].view(),
            array![0.0, 1.0, 1.0, 2.0].view(),
        )
        .unwrap();
        assert_eq!(
            metrics,
            HoldoutMetrics::Classification {
                accuracy: 0.75,
                n_rows: 4
            }
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            HoldoutMetrics::evaluate(Task::Regression, array![1.0].view(), ndarray::Array1::<f64>::zeros(0).view()),
            Err(ModelError::LengthMismatch { .. })
        ));
        assert_eq!(
            r2(array![2.0, 2.0].view(), array![1.0, 3.0].view()),
            0.0
        );
    }
}
