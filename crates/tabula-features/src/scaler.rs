//! Numeric Scaler
//!
//! Z-score standardization of the numeric columns of an encoded matrix:
//!
//! z = (x - mean) / std_dev
//!
//! Mean and (population) standard deviation are computed once on the training
//! rows and frozen in a [`ScalerState`]. Every later transform, training or
//! inference, replays the same pair. Indicator columns are never touched.

use crate::error::{FeatureError, Result};
use crate::schema::FeatureSchema;
use ndarray::{ArrayView2, ArrayViewMut1, ArrayViewMut2};
use serde::{Deserialize, Serialize};

/// Frozen statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Column name
    pub column: String,
    /// Position of the column in the feature schema
    pub position: usize,
    /// Training mean
    pub mean: f64,
    /// Training standard deviation (1.0 for constant columns)
    pub std_dev: f64,
}

impl ColumnStats {
    /// Standardize one value
    pub fn scale(&self, x: f64) -> f64 {
        (x - self.mean) / self.std_dev
    }
}

/// Fits z-score statistics for a set of numeric columns
#[derive(Debug, Clone, Default)]
pub struct NumericScaler {
    columns: Vec<String>,
}

impl NumericScaler {
    /// Create a scaler for the named numeric columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Compute mean and standard deviation of each numeric column.
    ///
    /// # Arguments
    /// * `matrix` - Encoded training matrix, one column per schema entry
    /// * `schema` - Schema used to locate the numeric columns
    pub fn fit(&self, matrix: ArrayView2<'_, f64>, schema: &FeatureSchema) -> Result<ScalerState> {
        if matrix.ncols() != schema.len() {
            return Err(FeatureError::DimensionMismatch {
                expected: schema.len(),
                actual: matrix.ncols(),
            });
        }
        if matrix.nrows() == 0 {
            return Err(FeatureError::EmptyTable);
        }

        let mut stats = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let position = schema
                .position(column)
                .ok_or_else(|| FeatureError::UnknownColumn(column.clone()))?;

            let values = matrix.column(position);
            let mean = values.mean().unwrap_or(0.0);
            let mut std_dev = values.std(0.0);
            if std_dev == 0.0 {
                tracing::warn!(
                    column = column.as_str(),
                    mean,
                    "constant column, centering without scaling"
                );
                std_dev = 1.0;
            }

            stats.push(ColumnStats {
                column: column.clone(),
                position,
                mean,
                std_dev,
            });
        }

        Ok(ScalerState {
            stats,
            width: schema.len(),
        })
    }
}

/// Frozen z-score statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    stats: Vec<ColumnStats>,
    width: usize,
}

impl ScalerState {
    /// Per-column statistics in fit order
    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    /// Statistics of a named column
    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.stats.iter().find(|s| s.column == name)
    }

    /// Width of the vectors this state applies to
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Standardize the numeric columns of a matrix in place.
    pub fn transform(&self, mut matrix: ArrayViewMut2<'_, f64>) -> Result<()> {
        self.check_width(matrix.ncols())?;
        for stat in &self.stats {
            matrix
                .column_mut(stat.position)
                .mapv_inplace(|x| stat.scale(x));
        }
        Ok(())
    }

    /// Standardize the numeric positions of a single encoded vector in place.
    pub fn transform_row(&self, mut row: ArrayViewMut1<'_, f64>) -> Result<()> {
        self.check_width(row.len())?;
        for stat in &self.stats {
            row[stat.position] = stat.scale(row[stat.position]);
        }
        Ok(())
    }

    /// Check that this state was fitted against `schema`.
    pub fn validate(&self, schema: &FeatureSchema) -> Result<()> {
        self.check_width(schema.len())?;
        for stat in &self.stats {
            if schema.position(&stat.column) != Some(stat.position) {
                return Err(FeatureError::UnknownColumn(stat.column.clone()));
            }
        }
        Ok(())
    }

    const fn check_width(&self, actual: usize) -> Result<()> {
        if actual != self.width {
            return Err(FeatureError::DimensionMismatch {
                expected: self.width,
                actual,
            });
        }
        Ok(())
    }
}
