#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tabula/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifact;
pub mod pipeline;
pub mod predictors;

// Re-export main types from sub-crates
pub use tabula_data as data;
pub use tabula_features as features;
pub use tabula_model as model;
pub use tabula_output as output;

pub use artifact::{ArtifactBundle, ArtifactStore};
pub use pipeline::{
    InferencePipeline, PipelineError, Result, Stage, TrainingConfig, TrainingPipeline,
    TrainingSummary,
};
pub use predictors::{
    FieldConstraint, FieldRule, IrisMeasurements, MovieFeatures, PredictorKind, PredictorSpec,
    SalesFeatures,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
