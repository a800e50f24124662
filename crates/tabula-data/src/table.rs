//! Training Table
//!
//! Rows of raw records with one target each, plus the layout and target
//! column name they were read against.

use crate::error::{DataError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tabula_features::{RawRecord, TableLayout};

/// How target cells map to numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetEncoding {
    /// The cell is the target value
    Numeric,
    /// The cell is a class label; its index in this list is the target
    Labels {
        /// Class labels in index order
        labels: Vec<String>,
    },
}

impl TargetEncoding {
    /// Parse a target cell.
    pub fn decode(&self, cell: &str) -> Option<f64> {
        let cell = cell.trim();
        match self {
            Self::Numeric => cell.parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Labels { labels } => labels
                .iter()
                .position(|l| l.eq_ignore_ascii_case(cell))
                .map(|i| i as f64),
        }
    }

    /// Render a target value as a cell.
    pub fn encode(&self, value: f64) -> String {
        match self {
            Self::Numeric => value.to_string(),
            Self::Labels { labels } => labels
                .get(value as usize)
                .cloned()
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

/// Rows of a predictor's training data
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTable {
    layout: TableLayout,
    target: String,
    records: Vec<RawRecord>,
    targets: Vec<f64>,
}

impl TrainingTable {
    /// Create an empty table
    pub fn new(layout: TableLayout, target: impl Into<String>) -> Self {
        Self {
            layout,
            target: target.into(),
            records: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Build a table from parallel records and targets.
    pub fn from_parts(
        layout: TableLayout,
        target: impl Into<String>,
        records: Vec<RawRecord>,
        targets: Vec<f64>,
    ) -> Result<Self> {
        if records.len() != targets.len() {
            return Err(DataError::LengthMismatch {
                records: records.len(),
                targets: targets.len(),
            });
        }
        Ok(Self {
            layout,
            target: target.into(),
            records,
            targets,
        })
    }

    /// Append a row
    pub fn push(&mut self, record: RawRecord, target: f64) {
        self.records.push(record);
        self.targets.push(target);
    }

    /// Declared raw columns
    pub const fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Target column name
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Feature records in row order
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Target values in row order
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Targets as an owned array
    pub fn target_array(&self) -> Array1<f64> {
        Array1::from_vec(self.targets.clone())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(record, target)` rows
    pub fn rows(&self) -> impl Iterator<Item = (&RawRecord, f64)> {
        self.records.iter().zip(self.targets.iter().copied())
    }

    /// New table holding the given rows, in the given order.
    ///
    /// Indices out of range are skipped.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let mut out = Self::new(self.layout.clone(), self.target.clone());
        for &i in indices {
            if let (Some(record), Some(&target)) = (self.records.get(i), self.targets.get(i)) {
                out.push(record.clone(), target);
            }
        }
        out
    }
}
