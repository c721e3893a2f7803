//! Flights Processor Library
//!
//! A Rust library for sanitizing raw flight record tables against a
//! declarative metadata contract and storing the result as Parquet.
//!
//! This library provides tools for:
//! - Parsing a schema-description table into typed column descriptors
//! - Filtering null keys, renaming columns and coercing declared types
//! - Standardizing free text into uppercase alphanumeric form
//! - Repairing compact, variable-width flight time strings into
//!   full timestamps
//! - Validating null-rate tolerances and key-column completeness
//! - Deriving duration, delay, weekday and time-of-day features
//! - Writing the final table to Parquet with replace-on-write semantics

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod storage;
pub mod time_repair;
pub mod transform;
pub mod validate;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{FlightsError, Result};
pub use models::{ColumnSpec, DeclaredType, TableMetadata};
pub use pipeline::FlightPipeline;
