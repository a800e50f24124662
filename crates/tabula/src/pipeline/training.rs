//! Training Pipeline
//!
//! Steps, in order:
//!
//! 1. Seeded shuffle split into train and holdout partitions
//! 2. One-hot encoding of the train partition, freezing the feature schema
//! 3. Z-score fit on the numeric columns, then scaling
//! 4. Model fit
//! 5. Holdout evaluation through the inference encoding path
//!
//! The result is a new [`ArtifactBundle`] plus a [`TrainingSummary`].

use super::error::{PipelineError, Result, Stage};
use crate::artifact::ArtifactBundle;
use crate::predictors::PredictorSpec;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tabula_data::{TrainingTable, train_test_split};
use tabula_features::{
    CategoricalEncoder, EncoderConfig, FeatureSchema, NumericScaler, ScalerState,
    UnseenCategoryPolicy,
};
use tabula_model::{ForestConfig, HoldoutMetrics, PredictiveModel, RandomForest};
use tabula_output::{TrainingReport, TrainingReportBuilder};

/// Summary of a training run
pub type TrainingSummary = TrainingReport;

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed for the split and the model; overrides `forest.seed` (default: 42)
    pub seed: u64,

    /// Fraction of rows held out for evaluation, 0 to skip (default: 0.2)
    pub test_fraction: f64,

    /// Forest hyperparameters
    pub forest: ForestConfig,

    /// Encoder configuration stored in the bundle for inference
    pub encoder: EncoderConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            forest: ForestConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

/// Fits a predictor's encoder, scaler and model
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    spec: PredictorSpec,
    config: TrainingConfig,
}

impl TrainingPipeline {
    /// Create a pipeline for a predictor
    pub const fn new(spec: PredictorSpec, config: TrainingConfig) -> Self {
        Self { spec, config }
    }

    /// Predictor being trained
    pub const fn spec(&self) -> &PredictorSpec {
        &self.spec
    }

    /// Training configuration
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train a random forest matching the predictor's task.
    pub fn train(&self, table: &TrainingTable) -> Result<(ArtifactBundle, TrainingSummary)> {
        let forest = ForestConfig {
            seed: self.config.seed,
            ..self.config.forest.clone()
        };
        self.train_with(table, RandomForest::new(self.spec.task, forest))
    }

    /// Train any model implementation.
    pub fn train_with<M: PredictiveModel>(
        &self,
        table: &TrainingTable,
        mut model: M,
    ) -> Result<(ArtifactBundle<M>, TrainingSummary)> {
        if table.layout() != &self.spec.layout {
            return Err(PipelineError::SchemaMismatch {
                stage: Stage::Loading,
                detail: format!("table layout does not match predictor {}", self.spec.name),
            });
        }
        if model.task() != self.spec.task {
            return Err(PipelineError::SchemaMismatch {
                stage: Stage::Training,
                detail: format!(
                    "model task {:?} does not match predictor task {:?}",
                    model.task(),
                    self.spec.task
                ),
            });
        }

        let (train, holdout) = train_test_split(table, self.config.test_fraction, self.config.seed)?;
        tracing::info!(
            predictor = %self.spec.name,
            train = train.len(),
            holdout = holdout.len(),
            seed = self.config.seed,
            "training started"
        );

        let encoder = CategoricalEncoder::new(self.spec.layout.clone(), self.config.encoder.clone());
        let (mut features, schema) = encoder
            .fit_transform(train.records())
            .map_err(|e| PipelineError::from_feature(e, Stage::Training))?;

        let scaler = NumericScaler::new(self.spec.layout.numeric())
            .fit(features.view(), &schema)
            .and_then(|state| state.transform(features.view_mut()).map(|()| state))
            .map_err(|e| PipelineError::from_feature(e, Stage::Training))?;

        let targets = train.target_array();
        model
            .fit(features.view(), targets.view())
            .map_err(|e| PipelineError::from_model(e, Stage::Training))?;

        let metrics = if holdout.is_empty() {
            None
        } else {
            evaluate(&model, &self.spec, &schema, &scaler, &holdout)?
        };

        let summary = TrainingReportBuilder::new()
            .predictor(self.spec.name.clone())
            .seed(self.config.seed)
            .rows(train.len(), holdout.len())
            .n_features(schema.len())
            .metrics(metrics)
            .build()?;

        let bundle = ArtifactBundle::new(
            self.spec.clone(),
            self.config.encoder.clone(),
            schema,
            scaler,
            model,
            self.config.seed,
            metrics,
        )?;

        tracing::info!(
            predictor = %self.spec.name,
            features = bundle.schema().len(),
            metrics = ?metrics,
            "training finished"
        );
        Ok((bundle, summary))
    }
}

/// Score the model on held-out rows, encoding each row the way inference
/// does. Rows that cannot be encoded (e.g. missing cells) are skipped.
fn evaluate<M: PredictiveModel>(
    model: &M,
    spec: &PredictorSpec,
    schema: &FeatureSchema,
    scaler: &ScalerState,
    holdout: &TrainingTable,
) -> Result<Option<HoldoutMetrics>> {
    let encoder = CategoricalEncoder::new(
        spec.layout.clone(),
        EncoderConfig {
            unseen: UnseenCategoryPolicy::Ignore,
        },
    );

    let mut rows = Vec::with_capacity(holdout.len());
    let mut actual = Vec::with_capacity(holdout.len());
    for (record, target) in holdout.rows() {
        match encoder.transform_one(record, schema) {
            Ok(row) => {
                rows.push(row);
                actual.push(target);
            }
            Err(e) => tracing::warn!(error = %e, "skipping holdout row"),
        }
    }
    if rows.is_empty() {
        return Ok(None);
    }

    let views: Vec<_> = rows.iter().map(|r| r.view()).collect();
    let mut features: Array2<f64> = ndarray::stack(Axis(0), &views).map_err(|e| {
        PipelineError::SchemaMismatch {
            stage: Stage::Encoding,
            detail: e.to_string(),
        }
    })?;
    scaler
        .transform(features.view_mut())
        .map_err(|e| PipelineError::from_feature(e, Stage::Scaling))?;

    let predicted = model
        .predict(features.view())
        .map_err(|e| PipelineError::from_model(e, Stage::Predicting))?;
    let actual = Array1::from_vec(actual);
    HoldoutMetrics::evaluate(model.task(), actual.view(), predicted.view())
        .map(Some)
        .map_err(|e| PipelineError::from_model(e, Stage::Training))
}
