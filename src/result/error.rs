//! Errors from result shaping.

/// The result does not fit the requested format.
///
/// Shaping happens after the query ran, so these surface to the caller
/// instead of being papered over.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("time series needs a datetime column, found none")]
    NoTimeColumn,

    #[error("time series needs exactly one datetime column, found {}", .0.join(", "))]
    MultipleTimeColumns(Vec<String>),

    #[error("time series needs at least one numeric column")]
    NoValueColumn,

    #[error("ADX time series needs a column named Timestamp")]
    MissingTimestampColumn,

    #[error("column {column} has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid timestamp in column {column} at row {row}: {value}")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid number in column {column} at row {row}: {value}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
}

/// Result type for shaping operations.
pub type ShapeResult<T> = Result<T, FormatError>;
