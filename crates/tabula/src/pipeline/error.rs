//! Pipeline errors and stages.

use derive_more::Display;
use tabula_data::DataError;
use tabula_features::FeatureError;
use tabula_model::ModelError;
use tabula_output::ReportError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Where a pipeline run is, or where it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Stage {
    /// Nothing started
    #[display("idle")]
    Idle,
    /// Reading a table or an artifact
    #[display("loading")]
    Loading,
    /// Fitting encoder, scaler and model
    #[display("training")]
    Training,
    /// Checking a raw record
    #[display("validating")]
    Validating,
    /// One-hot encoding and schema alignment
    #[display("encoding")]
    Encoding,
    /// Standardizing numeric positions
    #[display("scaling")]
    Scaling,
    /// Running the model
    #[display("predicting")]
    Predicting,
    /// Labeling or clipping the raw prediction
    #[display("postprocessing")]
    Postprocessing,
    /// Writing an artifact
    #[display("persisting")]
    Persisting,
    /// Finished successfully
    #[display("done")]
    Done,
    /// Finished with an error
    #[display("failed")]
    Failed,
}

/// Errors surfaced by training and inference
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required raw field is absent
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name
        field: String,
        /// Stage that needed the field
        stage: Stage,
    },

    /// A raw field is present but unusable
    #[error("Invalid input for {field}: {reason}")]
    InputValidation {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
        /// Stage that rejected the value
        stage: Stage,
    },

    /// A categorical level has no schema column (reject policy only)
    #[error("Unseen level {level:?} for categorical column {column}")]
    UnseenCategory {
        /// Categorical column
        column: String,
        /// The unseen level
        level: String,
        /// Stage that met the level
        stage: Stage,
    },

    /// Encoded width or column identity disagrees with the frozen schema
    #[error("Schema mismatch during {stage}: {detail}")]
    SchemaMismatch {
        /// Stage that detected the mismatch
        stage: Stage,
        /// What disagreed
        detail: String,
    },

    /// The model has not been fitted
    #[error("Model has not been fitted")]
    ModelNotFitted,

    /// Feature fitting failed
    #[error("Feature error during {stage}: {source}")]
    Feature {
        /// Stage of the failure
        stage: Stage,
        /// Underlying error
        source: FeatureError,
    },

    /// Model fitting, prediction or postprocessing failed
    #[error("Model error during {stage}: {source}")]
    Model {
        /// Stage of the failure
        stage: Stage,
        /// Underlying error
        source: ModelError,
    },

    /// Artifact belongs to a different predictor
    #[error("Artifact is for predictor {found}, expected {expected}")]
    PredictorMismatch {
        /// Expected predictor name
        expected: String,
        /// Predictor name stored in the artifact
        found: String,
    },

    /// Table loading or splitting failed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Report generation failed
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Artifact (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact IO failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Convert a feature error raised in `stage`, keeping its kind.
    pub fn from_feature(err: FeatureError, stage: Stage) -> Self {
        match err {
            FeatureError::MissingField { field } => Self::MissingField { field, stage },
            FeatureError::InvalidNumber { field, value } => Self::InputValidation {
                field,
                reason: format!("not a number: {:?}", value),
                stage,
            },
            FeatureError::UnseenCategory { column, level } => Self::UnseenCategory {
                column,
                level,
                stage,
            },
            FeatureError::DimensionMismatch { expected, actual } => Self::SchemaMismatch {
                stage,
                detail: format!("expected {} columns, got {}", expected, actual),
            },
            FeatureError::UnknownColumn(column) => Self::SchemaMismatch {
                stage,
                detail: format!("column {} is not in the schema", column),
            },
            source => Self::Feature { stage, source },
        }
    }

    /// Convert a model error raised in `stage`, keeping its kind.
    pub fn from_model(err: ModelError, stage: Stage) -> Self {
        match err {
            ModelError::NotFitted => Self::ModelNotFitted,
            ModelError::DimensionMismatch { expected, actual } => Self::SchemaMismatch {
                stage,
                detail: format!("model expects {} features, got {}", expected, actual),
            },
            source => Self::Model { stage, source },
        }
    }

    /// Stage the error originated from
    pub const fn stage(&self) -> Stage {
        match self {
            Self::ModelNotFitted => Stage::Predicting,
            Self::MissingField { stage, .. }
            | Self::InputValidation { stage, .. }
            | Self::UnseenCategory { stage, .. }
            | Self::SchemaMismatch { stage, .. }
            | Self::Feature { stage, .. }
            | Self::Model { stage, .. } => *stage,
            Self::PredictorMismatch { .. } | Self::Data(_) => Stage::Loading,
            Self::Report(_) => Stage::Training,
            Self::Serialization(_) | Self::Io(_) => Stage::Persisting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FeatureError::MissingField { field: "Year".into() }, Stage::Validating)]
    #[case(FeatureError::MissingField { field: "Actor2".into() }, Stage::Training)]
    #[case(
        FeatureError::InvalidNumber { field: "TV".into(), value: "lots".into() },
        Stage::Validating
    )]
    #[case(
        FeatureError::UnseenCategory { column: "Director".into(), level: "Lynch".into() },
        Stage::Encoding
    )]
    #[case(
        FeatureError::UnseenCategory { column: "Director".into(), level: "Lynch".into() },
        Stage::Training
    )]
    #[case(FeatureError::DimensionMismatch { expected: 5, actual: 4 }, Stage::Scaling)]
    #[case(FeatureError::EmptyTable, Stage::Training)]
    fn test_feature_errors_report_their_stage(#[case] err: FeatureError, #[case] stage: Stage) {
        let converted = PipelineError::from_feature(err, stage);
        assert_eq!(converted.stage(), stage);
    }

    #[test]
    fn test_missing_field_is_not_wrapped() {
        let err = PipelineError::from_feature(
            FeatureError::MissingField {
                field: "Runtime".into(),
            },
            Stage::Encoding,
        );
        assert!(matches!(
            err,
            PipelineError::MissingField { ref field, stage: Stage::Encoding } if field == "Runtime"
        ));
        assert_eq!(err.to_string(), "Missing required field: Runtime");
    }

    #[test]
    fn test_model_errors() {
        assert!(matches!(
            PipelineError::from_model(ModelError::NotFitted, Stage::Predicting),
            PipelineError::ModelNotFitted
        ));
        let err = PipelineError::from_model(ModelError::UnknownClass(4), Stage::Postprocessing);
        assert_eq!(err.stage(), Stage::Postprocessing);
        assert_eq!(
            err.to_string(),
            "Model error during postprocessing: No label for class index 4"
        );
    }
}
