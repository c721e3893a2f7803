//! Command-line interface components.

use crate::config::{CompressionAlgorithm, MissingColumnPolicy, PipelineConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "flights")]
#[command(about = "Sanitize raw flight records against a metadata contract and store them as Parquet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Path to the raw flight records CSV
    #[arg(value_name = "FLIGHTS_CSV")]
    pub input_path: PathBuf,

    /// Path to the metadata contract CSV describing the target schema
    #[arg(short, long)]
    pub metadata_path: PathBuf,

    /// Output directory for Parquet tables (defaults to a `parquet`
    /// directory next to the input)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Abort when a declared column is missing instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Get the output directory, defaulting to input_path/../parquet if
    /// not specified
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self
                .input_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("parquet"),
        }
    }

    /// Build the pipeline configuration from the parsed arguments
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let compression: CompressionAlgorithm = self
            .compression
            .parse()
            .map_err(|reason: String| anyhow::anyhow!(reason))
            .context("invalid --compression value")?;

        let missing_columns = if self.strict {
            MissingColumnPolicy::Strict
        } else {
            MissingColumnPolicy::Lenient
        };

        Ok(PipelineConfig {
            missing_columns,
            compression,
            ..PipelineConfig::default()
        })
    }
}
