//! Parquet storage for the cleaned table.
//!
//! Writes the final table to `<output_dir>/<table_name>.parquet` with
//! replace-on-write semantics and reads back a short preview. Storage
//! failures are fatal and abort the run.

use crate::config::CompressionAlgorithm;
use crate::error::{FlightsError, Result};
use polars::prelude::{ParquetWriter as PolarsParquetWriter, *};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parquet-backed storage collaborator
#[derive(Debug, Clone)]
pub struct ParquetStorage {
    output_dir: PathBuf,
    compression: CompressionAlgorithm,
}

impl ParquetStorage {
    pub fn new(output_dir: impl Into<PathBuf>, compression: CompressionAlgorithm) -> Self {
        Self {
            output_dir: output_dir.into(),
            compression,
        }
    }

    /// Destination file for a table name
    pub fn table_path(&self, table_name: &str) -> PathBuf {
        self.output_dir.join(format!("{table_name}.parquet"))
    }

    /// Write the table, superseding any previous contents of the same
    /// destination; returns the written path
    pub fn write(&self, df: &mut DataFrame, table_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.table_path(table_name);
        info!(
            "Writing {} rows to {} ({:?} compression)",
            df.height(),
            path.display(),
            self.compression
        );

        // File::create truncates, which is what gives replace-on-write
        let file = File::create(&path).map_err(|e| storage_error(table_name, &path, e))?;
        PolarsParquetWriter::new(file)
            .with_compression(self.compression.to_polars_compression())
            .finish(df)
            .map_err(|e| storage_error(table_name, &path, e))?;

        debug!("Finished writing table '{}'", table_name);
        Ok(path)
    }

    /// Read back the first `rows` rows of a stored table
    pub fn preview(&self, table_name: &str, rows: usize) -> Result<DataFrame> {
        let path = self.table_path(table_name);
        let file = File::open(&path).map_err(|e| storage_error(table_name, &path, e))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| storage_error(table_name, &path, e))?;
        Ok(df.head(Some(rows)))
    }
}

fn storage_error(
    table_name: &str,
    path: &Path,
    source: impl std::fmt::Display,
) -> FlightsError {
    FlightsError::Storage {
        table: table_name.to_string(),
        path: path.to_path_buf(),
        reason: source.to_string(),
    }
}
