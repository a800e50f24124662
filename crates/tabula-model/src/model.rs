//! Predictive Model
//!
//! The contract between the pipelines and whatever learns from the encoded
//! matrix. Pipelines only ever talk to a model through [`PredictiveModel`];
//! the forest in [`crate::forest`] is one implementation.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Predict was called before fit
    #[error("Model has not been fitted")]
    NotFitted,

    /// Feature count differs from the fitted width
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Fitted feature count
        expected: usize,
        /// Supplied feature count
        actual: usize,
    },

    /// Row count and target count differ
    #[error("Length mismatch: {rows} rows but {targets} targets")]
    LengthMismatch {
        /// Number of feature rows
        rows: usize,
        /// Number of targets
        targets: usize,
    },

    /// No rows to fit on
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    /// Target values unusable for the task
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Invalid hyperparameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation not available for this task
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Predicted class index has no label
    #[error("No label for class index {0}")]
    UnknownClass(usize),

    /// Prediction kind does not match the postprocessing policy
    #[error("Task mismatch: {0}")]
    TaskMismatch(String),

    /// Fitted state is internally inconsistent, e.g. a corrupted artifact
    #[error("Invalid model structure: {0}")]
    InvalidStructure(String),

    /// Prediction is NaN or infinite
    #[error("Non-finite prediction: {0}")]
    NonFinite(f64),
}

/// Learning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Discrete classes `0..n_classes`
    Classification,
    /// Continuous target
    Regression,
}

/// Raw prediction for a single row
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Predicted class and distribution over all classes
    Class {
        /// Predicted class index
        index: usize,
        /// Probability of each class, summing to 1
        probabilities: Vec<f64>,
    },
    /// Predicted continuous value
    Value(f64),
}

/// A model trained on an encoded, scaled feature matrix
pub trait PredictiveModel {
    /// The task this model solves
    fn task(&self) -> Task;

    /// Fit the model
    ///
    /// # Arguments
    /// * `features` - Training matrix (rows x features)
    /// * `targets` - One target per row; class indices for classification
    fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<(), ModelError>;

    /// Predict one value per row: a class index or a continuous value
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;

    /// Class probabilities per row (classification only)
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        let _ = features;
        Err(ModelError::Unsupported("predict_proba"))
    }

    /// Number of features seen at fit time, `None` before fit
    fn n_features(&self) -> Option<usize>;

    /// Check fitted state for internal consistency, e.g. after
    /// deserialization. Unfitted models are always valid.
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Whether fit has completed
    fn is_fitted(&self) -> bool {
        self.n_features().is_some()
    }

    /// Predict a single encoded vector.
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Prediction, ModelError> {
        let features = row.insert_axis(Axis(0));
        let predicted = self.predict(features)?;
        let value = predicted[0];

        match self.task() {
            Task::Regression => Ok(Prediction::Value(value)),
            Task::Classification => {
                let probabilities = self.predict_proba(features)?.row(0).to_vec();
                Ok(Prediction::Class {
                    index: value as usize,
                    probabilities,
                })
            }
        }
    }
}

/// Validate fit inputs shared by every implementation.
pub(crate) fn check_fit_inputs(
    features: &ArrayView2<'_, f64>,
    targets: &ArrayView1<'_, f64>,
) -> Result<(), ModelError> {
    if features.nrows() != targets.len() {
        return Err(ModelError::LengthMismatch {
            rows: features.nrows(),
            targets: targets.len(),
        });
    }
    if features.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if let Some(bad) = targets.iter().find(|t| !t.is_finite()) {
        return Err(ModelError::InvalidTarget(format!("non-finite target {}", bad)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Predicts the first feature, for exercising trait defaults
    struct Echo {
        width: Option<usize>,
    }

    impl PredictiveModel for Echo {
        fn task(&self) -> Task {
            Task::Regression
        }

        fn fit(
            &mut self,
            features: ArrayView2<'_, f64>,
            targets: ArrayView1<'_, f64>,
        ) -> Result<(), ModelError> {
            check_fit_inputs(&features, &targets)?;
            self.width = Some(features.ncols());
            Ok(())
        }

        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
            self.width.ok_or(ModelError::NotFitted)?;
            Ok(features.column(0).to_owned())
        }

        fn n_features(&self) -> Option<usize> {
            self.width
        }
    }

    #[test]
    fn test_trait_defaults() {
        let mut model = Echo { width: None };
        assert!(!model.is_fitted());
        assert_eq!(
            model.predict_row(array![1.0, 2.0].view()),
            Err(ModelError::NotFitted)
        );

        model
            .fit(array![[1.0, 2.0], [3.0, 4.0]].view(), array![0.0, 1.0].view())
            .unwrap();
        assert!(model.is_fitted());
        assert_eq!(
            model.predict_row(array![7.5, 2.0].view()),
            Ok(Prediction::Value(7.5))
        );
        assert_eq!(
            model.predict_proba(array![[1.0, 2.0]].view()),
            Err(ModelError::Unsupported("predict_proba"))
        );
    }

    #[test]
    fn test_fit_input_checks() {
        let mut model = Echo { width: None };
        assert_eq!(
            model.fit(array![[1.0], [2.0]].view(), array![1.0].view()),
            Err(ModelError::LengthMismatch {
                rows: 2,
                targets: 1
            })
        );
        assert!(matches!(
            model.fit(array![[1.0]].view(), array![f64::NAN].view()),
            Err(ModelError::InvalidTarget(_))
        ));
    }
}
