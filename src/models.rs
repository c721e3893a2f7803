//! Core data structures and types for flight record processing.
//!
//! Defines the declared column types, the per-column transformation
//! descriptors parsed from the metadata contract, and processing
//! statistics used throughout the library.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Column types a metadata contract can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    Int,
    Float,
    Datetime,
    String,
}

impl DeclaredType {
    /// Parse a declared type label from the metadata table
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "int" => Some(DeclaredType::Int),
            "float" => Some(DeclaredType::Float),
            "datetime" => Some(DeclaredType::Datetime),
            "string" => Some(DeclaredType::String),
            _ => None,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclaredType::Int => "int",
            DeclaredType::Float => "float",
            DeclaredType::Datetime => "datetime",
            DeclaredType::String => "string",
        };
        write!(f, "{}", label)
    }
}

/// Transformation descriptor for a single column, parsed from one
/// metadata row
///
/// Attaching the key/tolerance/normalization flags to the column itself
/// guarantees that every flagged name exists among the renamed columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name in the raw source table
    pub original_name: String,
    /// Column name in the cleaned output table
    pub renamed: String,
    /// Type the raw column is coerced to
    pub original_type: DeclaredType,
    /// Type the column holds after the full transformation
    pub formatted_type: DeclaredType,
    /// Rows with a null in a key column are invalid
    pub is_key: bool,
    /// Maximum acceptable fraction of nulls; `None` disables the check
    pub null_tolerance: Option<f64>,
    /// Derive an uppercase-alphanumeric `<renamed>_formatted` column
    pub standardize: bool,
    /// Repair compact time strings into a `<renamed>_formatted` timestamp
    pub repair_time: bool,
}

/// Immutable, per-run description of the destination table and its
/// column transformations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Identifier of the destination table
    pub table_name: String,
    /// Ordered column descriptors; order defines the output column order
    pub columns: Vec<ColumnSpec>,
}

impl TableMetadata {
    /// Source column names, in declaration order
    pub fn original_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.original_name.as_str()).collect()
    }

    /// Output column names, position-aligned with `original_columns`
    pub fn renamed_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.renamed.as_str()).collect()
    }

    /// Key columns under their source names
    pub fn key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_key)
            .map(|c| c.original_name.as_str())
            .collect()
    }

    /// Key columns under their output names
    pub fn key_columns_renamed(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_key)
            .map(|c| c.renamed.as_str())
            .collect()
    }

    /// Output columns requiring uppercase-alphanumeric standardization
    pub fn string_std_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.standardize)
            .map(|c| c.renamed.as_str())
            .collect()
    }

    /// Output columns holding compact time strings requiring repair
    pub fn time_repair_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.repair_time)
            .map(|c| c.renamed.as_str())
            .collect()
    }
}

/// Statistics for a complete pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub rows_read: usize,
    pub rows_after_clean: usize,
    pub rows_removed_by_keys: usize,
    pub rows_written: usize,
    pub columns_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
