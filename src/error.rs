//! Error types shared across table construction, expression capture, and
//! deferred evaluation.
//!
//! Every fallible operation in the crate returns [`Result`]. There is no
//! retry or recovery machinery: an error aborts the current pipeline step
//! and propagates to the caller.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FrameError>;

/// All errors produced by tidyframe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// A column name did not resolve against the table.
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// A name resolved neither as a column nor as a captured binding.
    /// Surfaces at evaluation time, never at capture time.
    #[error("name '{0}' not found in table columns or captured environment")]
    NameNotFound(String),

    /// An operation was applied to incompatible types.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A value of the wrong type was appended to a column.
    #[error("column '{name}' expects {expected}, got {actual}")]
    ColumnTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// A null was appended to a non-nullable column.
    #[error("column '{0}' is not nullable")]
    NotNullable(String),

    /// A computed column did not match the table's row count.
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A row index was outside the table.
    #[error("row {row} out of range [0, {len})")]
    RowOutOfRange { row: usize, len: usize },

    /// Two columns in one schema share a name.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A row literal omitted a schema column.
    #[error("missing value for column '{0}'")]
    MissingValue(String),

    /// A bare column reference appeared in a grouped summary. Columns are
    /// only legal inside aggregate calls there.
    #[error("column '{0}' referenced outside an aggregate in a grouped summary")]
    AggregateRequired(String),

    /// Expression syntax error, or malformed CSV/JSON input.
    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FrameError::NameNotFound("min_sl".to_string());
        assert_eq!(
            err.to_string(),
            "name 'min_sl' not found in table columns or captured environment"
        );

        let err = FrameError::RowOutOfRange { row: 5, len: 3 };
        assert_eq!(err.to_string(), "row 5 out of range [0, 3)");
    }
}
