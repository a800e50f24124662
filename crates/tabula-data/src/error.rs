//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading, saving or splitting tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV reader or writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cell could not be interpreted
    #[error("Data parsing error on line {line}: {message}")]
    Parse {
        /// 1-based line number in the source file
        line: u64,
        /// What went wrong
        message: String,
    },

    /// Declared column absent from the header
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Table has no rows
    #[error("Table has no rows")]
    EmptyTable,

    /// Split fraction out of range or too few rows
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Records and targets disagree in length
    #[error("Length mismatch: {records} records but {targets} targets")]
    LengthMismatch {
        /// Number of records
        records: usize,
        /// Number of targets
        targets: usize,
    },

    /// Target label outside the configured label list
    #[error("Unknown target label: {0}")]
    UnknownLabel(String),
}
