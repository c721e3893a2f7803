//! Error handling for flight record processing operations.
//!
//! Provides error types with context for metadata interpretation,
//! schema transformation, and storage failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Malformed metadata table: {reason}")]
    Schema { reason: String },

    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    #[error("Cannot cast column '{column}' to {target}: {reason}")]
    TypeCoercion {
        column: String,
        target: String,
        reason: String,
    },

    #[error("Cannot repair time string '{value}': {reason}")]
    TimeFormat { value: String, reason: String },

    #[error("Null value in column '{column}' during string standardization")]
    NullInput { column: String },

    #[error("Input table not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Storage failure for table '{table}' at {path}: {reason}")]
    Storage {
        table: String,
        path: PathBuf,
        reason: String,
    },
}

impl FlightsError {
    /// Create a metadata schema error
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    /// Create a missing-column error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Create a type coercion error with context
    pub fn type_coercion(
        column: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TypeCoercion {
            column: column.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a time repair error
    pub fn time_format(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TimeFormat {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlightsError>;
