//! Inference Pipeline
//!
//! validate → encode → scale → predict → postprocess, for one raw record at
//! a time, against a frozen [`ArtifactBundle`]. A failed record leaves the
//! bundle untouched and the next record is processed normally.

use super::error::{PipelineError, Result, Stage};
use crate::artifact::ArtifactBundle;
use std::sync::Arc;
use tabula_features::{CategoricalEncoder, EncoderConfig, RawRecord, UnseenCategoryPolicy};
use tabula_model::{Outcome, PredictiveModel, RandomForest};

/// Single-record predictor over a shared bundle
#[derive(Debug)]
pub struct InferencePipeline<M = RandomForest> {
    bundle: Arc<ArtifactBundle<M>>,
    encoder: CategoricalEncoder,
}

impl<M> Clone for InferencePipeline<M> {
    fn clone(&self) -> Self {
        Self {
            bundle: Arc::clone(&self.bundle),
            encoder: self.encoder.clone(),
        }
    }
}

impl<M: PredictiveModel> InferencePipeline<M> {
    /// Pipeline using the bundle's own encoder configuration
    pub fn new(bundle: Arc<ArtifactBundle<M>>) -> Self {
        let encoder = CategoricalEncoder::new(
            bundle.predictor().layout.clone(),
            bundle.encoder().clone(),
        );
        Self { bundle, encoder }
    }

    /// Override how unseen categorical levels are handled.
    #[must_use]
    pub fn with_unseen_policy(self, unseen: UnseenCategoryPolicy) -> Self {
        let encoder = CategoricalEncoder::new(
            self.bundle.predictor().layout.clone(),
            EncoderConfig { unseen },
        );
        Self { encoder, ..self }
    }

    /// Bundle this pipeline predicts with
    pub const fn bundle(&self) -> &Arc<ArtifactBundle<M>> {
        &self.bundle
    }

    /// Predict one record.
    pub fn predict(&self, record: &RawRecord) -> Result<Outcome> {
        match self.run(record) {
            Ok(outcome) => {
                tracing::debug!(stage = %Stage::Done, ?outcome, "inference finished");
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!(
                    stage = %Stage::Failed,
                    failed_at = %e.stage(),
                    error = %e,
                    "inference failed"
                );
                Err(e)
            }
        }
    }

    /// Predict each record independently, one result per record.
    pub fn predict_many(&self, records: &[RawRecord]) -> Vec<Result<Outcome>> {
        records.iter().map(|r| self.predict(r)).collect()
    }

    fn run(&self, record: &RawRecord) -> Result<Outcome> {
        let bundle = &self.bundle;
        let schema = bundle.schema();

        tracing::debug!(stage = %Stage::Validating, predictor = %bundle.predictor().name);
        bundle.predictor().validate(record)?;

        tracing::debug!(stage = %Stage::Encoding);
        let mut vector = self
            .encoder
            .transform_one(record, schema)
            .map_err(|e| PipelineError::from_feature(e, Stage::Encoding))?;
        if vector.len() != schema.len() {
            return Err(PipelineError::SchemaMismatch {
                stage: Stage::Encoding,
                detail: format!(
                    "encoded {} values for {} schema columns",
                    vector.len(),
                    schema.len()
                ),
            });
        }

        tracing::debug!(stage = %Stage::Scaling);
        bundle
            .scaler()
            .transform_row(vector.view_mut())
            .map_err(|e| PipelineError::from_feature(e, Stage::Scaling))?;

        tracing::debug!(stage = %Stage::Predicting);
        let prediction = bundle
            .model()
            .predict_row(vector.view())
            .map_err(|e| PipelineError::from_model(e, Stage::Predicting))?;

        tracing::debug!(stage = %Stage::Postprocessing);
        bundle
            .predictor()
            .postprocess
            .apply(&prediction)
            .map_err(|e| PipelineError::from_model(e, Stage::Postprocessing))
    }
}
