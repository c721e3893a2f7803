//! Pipeline orchestration.
//!
//! Threads the raw table through the cleaning, validation and feature
//! engineering stages under the loaded metadata contract, collecting
//! run statistics along the way.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features;
use crate::models::{PipelineStats, TableMetadata};
use crate::normalize;
use crate::time_repair;
use crate::transform::{self, FLIGHT_DATE_COLUMN};
use crate::validate::{self, ValidationReport};
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::info;

/// Outcome of a full pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    /// Cleaned, validated and feature-enriched table
    pub table: DataFrame,
    pub stats: PipelineStats,
    pub report: ValidationReport,
}

/// Metadata-driven sanitation pipeline for one flight record table
#[derive(Debug, Clone)]
pub struct FlightPipeline {
    metadata: TableMetadata,
    config: PipelineConfig,
}

impl FlightPipeline {
    pub fn new(metadata: TableMetadata, config: PipelineConfig) -> Self {
        Self { metadata, config }
    }

    /// Destination table name from the metadata contract
    pub fn table_name(&self) -> &str {
        &self.metadata.table_name
    }

    /// Run the complete pipeline on a raw table
    pub fn run(&self, raw: DataFrame) -> Result<PipelineResult> {
        let start = Instant::now();
        let rows_read = raw.height();
        info!(
            "Starting sanitation of {} rows for table '{}'",
            rows_read, self.metadata.table_name
        );

        let cleaned = self.clean(raw)?;
        let rows_after_clean = cleaned.height();

        let (validated, report, rows_removed) = self.validate(&cleaned)?;
        report.emit();

        let enriched = features::engineer_features(&validated)?;

        let stats = PipelineStats {
            rows_read,
            rows_after_clean,
            rows_removed_by_keys: rows_removed,
            rows_written: enriched.height(),
            columns_written: enriched.width(),
            processing_time_ms: start.elapsed().as_millis(),
            ..PipelineStats::default()
        };

        info!(
            "Sanitation complete: {} -> {} rows, {} columns in {}ms",
            stats.rows_read, stats.rows_written, stats.columns_written, stats.processing_time_ms
        );

        Ok(PipelineResult {
            table: enriched,
            stats,
            report,
        })
    }

    /// Cleaning stage: date composition, key filtering, type coercion,
    /// selection/renaming, string standardization and time repair
    pub fn clean(&self, raw: DataFrame) -> Result<DataFrame> {
        info!("Composing flight date from year/month/day");
        let df = transform::with_flight_date(&raw)?;

        info!("Filtering null keys: {:?}", self.metadata.key_columns());
        let df = transform::filter_null_keys(&df, &self.metadata.key_columns())?;

        info!("Coercing declared column types");
        let df = transform::coerce_types(&df, &self.metadata.columns, self.config.missing_columns)?;

        info!("Selecting and renaming columns");
        let df = transform::select_and_rename(
            &df,
            &self.metadata.original_columns(),
            &self.metadata.renamed_columns(),
        )?;

        info!(
            "Standardizing text columns: {:?}",
            self.metadata.string_std_columns()
        );
        let mut df = normalize::standardize_columns(&df, &self.metadata.string_std_columns())?;

        for column in self.metadata.time_repair_columns() {
            info!("Repairing compact time column '{}'", column);
            df = time_repair::repair_times(&df, column, FLIGHT_DATE_COLUMN)?;
        }

        Ok(df)
    }

    /// Validation stage: null-rate tolerances and key completeness
    ///
    /// Findings are returned for the caller to emit; only the key check
    /// mutates the table, tolerance violations never block the run.
    pub fn validate(&self, df: &DataFrame) -> Result<(DataFrame, ValidationReport, usize)> {
        let mut report = validate::check_null_rates(df, &self.metadata);

        let outcome = validate::check_keys(df, &self.metadata.key_columns_renamed())?;
        report.merge(outcome.report);

        Ok((outcome.table, report, outcome.rows_removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlightsError;
    use crate::features::{
        DELAY_COLUMN, EXPECTED_DURATION_COLUMN, PERIOD_COLUMN, WEEKDAY_COLUMN,
    };
    use polars::prelude::*;

    fn metadata_frame() -> DataFrame {
        df!(
            "tabela" => vec!["nyflights"; 6],
            "cols_originais" => ["data_voo", "carrier", "dep_time", "arr_time", "air_time", "origin"],
            "cols_renamed" => ["data_voo", "companhia", "datetime_partida", "datetime_chegada", "tempo_voo", "origem"],
            "tipo_original" => ["datetime", "string", "string", "string", "float", "string"],
            "tipo_formatted" => ["datetime", "string", "datetime", "datetime", "float", "string"],
            "key" => [1i64, 1, 0, 0, 0, 0],
            "raw_null_tolerance" => [Some(0.0f64), Some(0.0), Some(0.5), Some(0.5), Some(0.5), Some(0.0)],
            "std_str" => [0i64, 1, 0, 0, 0, 0],
            "corrige_hr" => [0i64, 0, 1, 1, 0, 0],
        )
        .unwrap()
    }

    fn pipeline() -> FlightPipeline {
        let metadata = crate::metadata::parse_metadata(&metadata_frame()).unwrap();
        FlightPipeline::new(metadata, PipelineConfig::default())
    }

    fn raw_frame() -> DataFrame {
        df!(
            "year" => [2013i64, 2013, 2013],
            "month" => [1i64, 1, 6],
            "day" => [1i64, 2, 15],
            "carrier" => [Some("Jet Blue!"), None, Some("United Air")],
            "dep_time" => ["830.0", "5", "1630"],
            "arr_time" => ["1000.0", "120", "1830"],
            "air_time" => [120.0f64, 90.0, 100.0],
            "origin" => ["JFK", "EWR", "LGA"],
            "extra" => [1i64, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_clean_produces_contract_columns() {
        let cleaned = pipeline().clean(raw_frame()).unwrap();

        // the null-carrier row is filtered by the key check on originals
        assert_eq!(cleaned.height(), 2);

        let names: Vec<&str> = cleaned
            .get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "data_voo",
                "companhia",
                "datetime_partida",
                "datetime_chegada",
                "tempo_voo",
                "origem",
                "companhia_formatted",
                "datetime_partida_formatted",
                "datetime_chegada_formatted",
            ]
        );

        let standardized: Vec<Option<&str>> = cleaned
            .column("companhia_formatted")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(standardized, vec![Some("JETBLUE"), Some("UNITEDAIR")]);

        assert!(matches!(
            cleaned.column("datetime_partida_formatted").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn test_full_run_engineers_features() {
        let result = pipeline().run(raw_frame()).unwrap();

        assert_eq!(result.stats.rows_read, 3);
        assert_eq!(result.stats.rows_written, 2);
        assert!(!result.report.has_errors());

        let expected: Vec<Option<f64>> = result
            .table
            .column(EXPECTED_DURATION_COLUMN)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        // 08:30 -> 10:00 is 1.5h; 16:30 -> 18:30 is 2h
        assert_eq!(expected, vec![Some(1.5), Some(2.0)]);

        let delay: Vec<Option<f64>> = result
            .table
            .column(DELAY_COLUMN)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        // 2h scheduled vs 1.5h expected; 100min scheduled vs 2h expected
        assert!((delay[0].unwrap() - 0.5).abs() < 1e-9);
        assert!((delay[1].unwrap() + 1.0 / 3.0).abs() < 1e-9);

        let period: Vec<Option<&str>> = result
            .table
            .column(PERIOD_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(period, vec![Some("MANHA"), Some("TARDE")]);

        // 2013-01-01 is a Tuesday, 2013-06-15 a Saturday
        let weekday: Vec<Option<i64>> = result
            .table
            .column(WEEKDAY_COLUMN)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(weekday, vec![Some(1), Some(5)]);
    }

    #[test]
    fn test_validation_observes_but_does_not_block() {
        // force a tolerance violation: origem tolerates no nulls at all
        let mut raw = raw_frame();
        raw.with_column(Series::new(
            "origin".into(),
            vec![Some("JFK"), Some("EWR"), None],
        ))
        .unwrap();

        let result = pipeline().run(raw).unwrap();
        assert!(result.report.has_errors());
        // the offending rows are still written
        assert_eq!(result.stats.rows_written, 2);
    }

    #[test]
    fn test_end_to_end_key_check_removes_reported_rows() {
        // 100 cleaned rows, 5 of them with a null key column
        let mut companies: Vec<Option<String>> = vec![Some("UA".to_string()); 95];
        companies.extend(std::iter::repeat_n(None, 5));
        let df = df!(
            "companhia" => companies,
            "tempo_voo" => vec![100i64; 100],
        )
        .unwrap();

        let metadata = crate::metadata::parse_metadata(&df!(
            "tabela" => ["nyflights"],
            "cols_originais" => ["carrier"],
            "cols_renamed" => ["companhia"],
            "tipo_original" => ["string"],
            "tipo_formatted" => ["string"],
            "key" => [1i64],
            "raw_null_tolerance" => [1.0f64],
            "std_str" => [0i64],
            "corrige_hr" => [0i64],
        )
        .unwrap())
        .unwrap();

        let pipeline = FlightPipeline::new(metadata, PipelineConfig::default());
        let (validated, report, removed) = pipeline.validate(&df).unwrap();

        assert_eq!(validated.height(), 95);
        assert_eq!(removed, 5);
        assert!(
            report
                .findings
                .iter()
                .any(|f| f.message.contains("5 rows removed"))
        );
    }

    #[test]
    fn test_strict_policy_rejects_missing_declared_column() {
        let mut raw = raw_frame();
        let _ = raw.drop_in_place("air_time").unwrap();

        let config = PipelineConfig {
            missing_columns: crate::config::MissingColumnPolicy::Strict,
            ..PipelineConfig::default()
        };
        let metadata = crate::metadata::parse_metadata(&metadata_frame()).unwrap();
        let result = FlightPipeline::new(metadata, config).clean(raw);

        assert!(matches!(
            result,
            Err(FlightsError::ColumnNotFound { column }) if column == "air_time"
        ));
    }
}
