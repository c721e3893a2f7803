//! CSV ingestion for the raw flight table and the metadata contract.

use crate::error::{FlightsError, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Read a CSV file into a DataFrame with header and schema inference
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(FlightsError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );

    Ok(df)
}
