//! Export of prediction logs.
//!
//! Each prediction becomes one [`PredictionExport`] row. Rows can be written as
//! CSV (inputs flattened into a single `field=value;...` column) or as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tabula_model::Outcome;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Pick a format from a file extension; `.json` exports are pretty-printed.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExportError::InvalidFormat(format!("{}", path.display())))?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One logged prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionExport {
    /// When the prediction was made.
    pub timestamp: DateTime<Utc>,

    /// Predictor name.
    pub predictor: String,

    /// Raw input fields as supplied.
    pub inputs: BTreeMap<String, String>,

    /// Class label (classification only).
    pub label: Option<String>,

    /// Confidence percentage (classification only).
    pub confidence: Option<f64>,

    /// Predicted value (regression only).
    pub value: Option<f64>,
}

impl PredictionExport {
    /// Create an export row stamped with the current time.
    pub fn new(
        predictor: impl Into<String>,
        inputs: BTreeMap<String, String>,
        outcome: &Outcome,
    ) -> Self {
        let (label, confidence, value) = match outcome {
            Outcome::Class {
                label, confidence, ..
            } => (Some(label.clone()), Some(*confidence), None),
            Outcome::Value { value } => (None, None, Some(*value)),
        };
        Self {
            timestamp: Utc::now(),
            predictor: predictor.into(),
            inputs,
            label,
            confidence,
            value,
        }
    }

    fn to_flat(&self) -> PredictionFlat {
        PredictionFlat {
            timestamp: self.timestamp.to_rfc3339(),
            predictor: self.predictor.clone(),
            inputs: self
                .inputs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(";"),
            label: self.label.clone(),
            confidence: self.confidence,
            value: self.value,
        }
    }
}

/// Flattened prediction for CSV export.
#[derive(Debug, Serialize)]
struct PredictionFlat {
    timestamp: String,
    predictor: String,
    inputs: String,
    label: Option<String>,
    confidence: Option<f64>,
    value: Option<f64>,
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<'a>(rows: impl IntoIterator<Item = &'a PredictionExport>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row.to_flat())?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for PredictionExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string([self]),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<PredictionExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
