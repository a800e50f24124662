//! Trained artifacts.
//!
//! An [`ArtifactBundle`] is the frozen output of one training run. It is
//! never mutated: retraining builds a new bundle and hosts swap it in whole
//! through an [`ArtifactStore`].

use crate::pipeline::{InferencePipeline, PipelineError, Result, Stage};
use crate::predictors::PredictorSpec;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tabula_features::{EncoderConfig, FeatureSchema, ScalerState};
use tabula_model::{HoldoutMetrics, PredictiveModel, RandomForest};

/// Schema, scaler and model of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBundle<M = RandomForest> {
    predictor: PredictorSpec,
    encoder: EncoderConfig,
    schema: FeatureSchema,
    scaler: ScalerState,
    model: M,
    trained_at: DateTime<Utc>,
    seed: u64,
    metrics: Option<HoldoutMetrics>,
}

impl<M: PredictiveModel> ArtifactBundle<M> {
    /// Assemble a bundle, checking that its parts agree.
    pub fn new(
        predictor: PredictorSpec,
        encoder: EncoderConfig,
        schema: FeatureSchema,
        scaler: ScalerState,
        model: M,
        seed: u64,
        metrics: Option<HoldoutMetrics>,
    ) -> Result<Self> {
        let bundle = Self {
            predictor,
            encoder,
            schema,
            scaler,
            model,
            trained_at: Utc::now(),
            seed,
            metrics,
        };
        bundle.check(Stage::Training)?;
        Ok(bundle)
    }

    /// Model width must equal the schema length, the model's own structure
    /// must be consistent and scaler positions must point at the same
    /// columns.
    fn check(&self, stage: Stage) -> Result<()> {
        match self.model.n_features() {
            None => return Err(PipelineError::ModelNotFitted),
            Some(width) if width != self.schema.len() => {
                return Err(PipelineError::SchemaMismatch {
                    stage,
                    detail: format!(
                        "model has {} features but schema has {} columns",
                        width,
                        self.schema.len()
                    ),
                });
            }
            Some(_) => {}
        }
        self.model
            .validate()
            .map_err(|e| PipelineError::from_model(e, stage))?;
        self.scaler
            .validate(&self.schema)
            .map_err(|e| PipelineError::from_feature(e, stage))?;
        if self.model.task() != self.predictor.task {
            return Err(PipelineError::SchemaMismatch {
                stage,
                detail: format!(
                    "model task {:?} does not match predictor task {:?}",
                    self.model.task(),
                    self.predictor.task
                ),
            });
        }
        Ok(())
    }

    /// Fail unless the bundle was trained for the predictor called `name`.
    pub fn ensure_predictor(&self, name: &str) -> Result<()> {
        if self.predictor.name == name {
            return Ok(());
        }
        Err(PipelineError::PredictorMismatch {
            expected: name.to_string(),
            found: self.predictor.name.clone(),
        })
    }

    /// Predictor definition
    pub const fn predictor(&self) -> &PredictorSpec {
        &self.predictor
    }

    /// Encoder configuration used at inference
    pub const fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    /// Frozen feature schema
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Frozen scaler statistics
    pub const fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    /// Trained model
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// When training finished
    pub const fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Seed of the training run
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Holdout metrics, if data was held out
    pub const fn metrics(&self) -> Option<&HoldoutMetrics> {
        self.metrics.as_ref()
    }
}

impl<M: PredictiveModel + Serialize> ArtifactBundle<M> {
    /// Write the bundle as JSON.
    ///
    /// The document goes to a temporary sibling first and is renamed into
    /// place, so readers never see a partial file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        let json = serde_json::to_vec(self)?;
        if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::info!(
            path = %path.display(),
            predictor = %self.predictor.name,
            features = self.schema.len(),
            "saved artifact"
        );
        Ok(())
    }
}

impl<M: PredictiveModel + DeserializeOwned> ArtifactBundle<M> {
    /// Read and re-check a bundle written by [`ArtifactBundle::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let bundle: Self = serde_json::from_str(&text)?;
        bundle.check(Stage::Loading)?;

        tracing::info!(
            path = %path.display(),
            predictor = %bundle.predictor.name,
            trained_at = %bundle.trained_at,
            "loaded artifact"
        );
        Ok(bundle)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Hot-swappable holder of the current bundle
///
/// Readers take a cheap `Arc` snapshot and keep using it even if the bundle
/// is replaced meanwhile. The generation counter increases with every swap.
#[derive(Debug)]
pub struct ArtifactStore<M = RandomForest> {
    current: RwLock<Arc<ArtifactBundle<M>>>,
    generation: AtomicU64,
}

impl<M: PredictiveModel> ArtifactStore<M> {
    /// Store holding an initial bundle (generation 0)
    pub fn new(bundle: ArtifactBundle<M>) -> Self {
        Self {
            current: RwLock::new(Arc::new(bundle)),
            generation: AtomicU64::new(0),
        }
    }

    /// Current bundle
    pub fn current(&self) -> Arc<ArtifactBundle<M>> {
        Arc::clone(&self.current.read())
    }

    /// Current bundle with its generation, read together
    pub fn snapshot(&self) -> (u64, Arc<ArtifactBundle<M>>) {
        let guard = self.current.read();
        (self.generation.load(Ordering::Acquire), Arc::clone(&guard))
    }

    /// Number of swaps so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Swap in a new bundle, returning the previous one.
    pub fn replace(&self, bundle: ArtifactBundle<M>) -> Arc<ArtifactBundle<M>> {
        let next = Arc::new(bundle);
        let mut guard = self.current.write();
        let previous = std::mem::replace(&mut *guard, next);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(guard);

        tracing::info!(generation, "replaced artifact bundle");
        previous
    }

    /// Inference pipeline over the current bundle
    pub fn pipeline(&self) -> InferencePipeline<M> {
        InferencePipeline::new(self.current())
    }
}
