//! Error types for feature encoding and scaling.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while encoding or scaling features.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// A required raw field is absent from the record
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// A numeric field holds a value that is not a finite number
    #[error("Field {field} is not a number: {value:?}")]
    InvalidNumber {
        /// Name of the offending field
        field: String,
        /// The raw value as supplied
        value: String,
    },

    /// A categorical level was not seen during training
    #[error("Unseen level {level:?} for categorical column {column}")]
    UnseenCategory {
        /// Categorical column name
        column: String,
        /// The unseen level
        level: String,
    },

    /// Two encoded columns ended up with the same name
    #[error("Duplicate feature column: {0}")]
    DuplicateColumn(String),

    /// A column referenced by name is not part of the schema
    #[error("Unknown feature column: {0}")]
    UnknownColumn(String),

    /// No rows were supplied for fitting
    #[error("Cannot fit on an empty table")]
    EmptyTable,

    /// Every training value of a numeric column is missing
    #[error("Numeric column {0} has no values to fit on")]
    EmptyColumn(String),

    /// Width of a vector or matrix does not match the schema
    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch {
        /// Expected number of columns
        expected: usize,
        /// Actual number of columns
        actual: usize,
    },
}
