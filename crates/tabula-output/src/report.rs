//! Report generation for Tabula training runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabula_model::HoldoutMetrics;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required field not set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// Summary of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Predictor name.
    pub predictor: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Seed used for splitting and model fitting.
    pub seed: u64,

    /// Rows used for fitting.
    pub train_rows: usize,

    /// Rows held out for evaluation.
    pub holdout_rows: usize,

    /// Width of the encoded feature vector.
    pub n_features: usize,

    /// Holdout scores, absent when nothing was held out.
    pub metrics: Option<HoldoutMetrics>,
}

impl TrainingReport {
    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Training Report: {} ({})",
            self.predictor,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "  Seed: {}", self.seed)?;
        writeln!(
            f,
            "  Rows: {} train / {} holdout",
            self.train_rows, self.holdout_rows
        )?;
        writeln!(f, "  Features: {}", self.n_features)?;
        match &self.metrics {
            Some(HoldoutMetrics::Classification { accuracy, .. }) => {
                writeln!(f, "  Accuracy: {:.2}%", accuracy * 100.0)?;
            }
            Some(HoldoutMetrics::Regression { rmse, mae, r2, .. }) => {
                writeln!(f, "  RMSE: {:.4}", rmse)?;
                writeln!(f, "  MAE: {:.4}", mae)?;
                writeln!(f, "  R²: {:.4}", r2)?;
            }
            None => writeln!(f, "  No holdout evaluation")?,
        }
        Ok(())
    }
}

/// Builder for creating training reports.
#[derive(Debug, Default)]
pub struct TrainingReportBuilder {
    predictor: Option<String>,
    seed: Option<u64>,
    train_rows: usize,
    holdout_rows: usize,
    n_features: usize,
    metrics: Option<HoldoutMetrics>,
}

impl TrainingReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the predictor name.
    pub fn predictor(mut self, predictor: impl Into<String>) -> Self {
        self.predictor = Some(predictor.into());
        self
    }

    /// Set the seed.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the partition sizes.
    pub const fn rows(mut self, train: usize, holdout: usize) -> Self {
        self.train_rows = train;
        self.holdout_rows = holdout;
        self
    }

    /// Set the encoded feature width.
    pub const fn n_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features;
        self
    }

    /// Set the holdout metrics.
    pub const fn metrics(mut self, metrics: Option<HoldoutMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<TrainingReport, ReportError> {
        Ok(TrainingReport {
            predictor: self.predictor.ok_or(ReportError::MissingField("predictor"))?,
            timestamp: Utc::now(),
            seed: self.seed.ok_or(ReportError::MissingField("seed"))?,
            train_rows: self.train_rows,
            holdout_rows: self.holdout_rows,
            n_features: self.n_features,
            metrics: self.metrics,
        })
    }
}
