//! Post-transformation validation.
//!
//! Checks null-rate tolerances and key-column completeness on the
//! cleaned table. Findings are collected into an explicit report so the
//! caller controls the sink; tolerance violations are reported, never
//! fatal.

use crate::error::Result;
use crate::models::TableMetadata;
use crate::transform::filter_null_keys;
use polars::prelude::*;
use tracing::{debug, error, info, warn};

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingLevel {
    Info,
    Warning,
    Error,
}

/// A single validator observation
#[derive(Debug, Clone)]
pub struct Finding {
    pub level: FindingLevel,
    pub message: String,
}

impl Finding {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: FindingLevel::Info,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FindingLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: FindingLevel::Error,
            message: message.into(),
        }
    }
}

/// Ordered collection of validator findings
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
    }

    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.level == FindingLevel::Error)
    }

    /// Emit every finding through the tracing subscriber
    pub fn emit(&self) {
        for finding in &self.findings {
            match finding.level {
                FindingLevel::Info => info!("{}", finding.message),
                FindingLevel::Warning => warn!("{}", finding.message),
                FindingLevel::Error => error!("{}", finding.message),
            }
        }
    }
}

/// Check the observed null rate of every column with a configured
/// tolerance
///
/// A rate strictly greater than the tolerance produces an error-level
/// finding; a rate at or below it an info-level one. Purely
/// observational: the pipeline continues either way.
pub fn check_null_rates(df: &DataFrame, metadata: &TableMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();
    let rows = df.height();

    for spec in &metadata.columns {
        let Some(tolerance) = spec.null_tolerance else {
            debug!("No null tolerance configured for '{}'", spec.renamed);
            continue;
        };

        let Ok(column) = df.column(&spec.renamed) else {
            report.push(Finding::warning(format!(
                "Column '{}' has a null tolerance but is absent from the table",
                spec.renamed
            )));
            continue;
        };

        let rate = if rows == 0 {
            0.0
        } else {
            column.null_count() as f64 / rows as f64
        };

        if rate > tolerance {
            report.push(Finding::error(format!(
                "Column '{}' exceeds its null tolerance: {:.4} > {:.4}",
                spec.renamed, rate, tolerance
            )));
        } else {
            report.push(Finding::info(format!(
                "Column '{}' within its null tolerance: {:.4} <= {:.4}",
                spec.renamed, rate, tolerance
            )));
        }
    }

    report
}

/// Result of the key-column completeness check
#[derive(Debug)]
pub struct KeyCheckOutcome {
    /// Table with null-key rows removed
    pub table: DataFrame,
    /// Number of rows removed
    pub rows_removed: usize,
    pub report: ValidationReport,
}

/// Verify key columns are present and drop rows with null key values
pub fn check_keys(df: &DataFrame, key_columns: &[&str]) -> Result<KeyCheckOutcome> {
    let mut report = ValidationReport::default();

    let (present, missing): (Vec<&str>, Vec<&str>) = key_columns
        .iter()
        .copied()
        .partition(|name| df.column(name).is_ok());

    if missing.is_empty() {
        report.push(Finding::info("All key columns present in the table"));
    } else {
        report.push(Finding::warning(format!(
            "Key columns absent from the table: {}",
            missing.join(", ")
        )));
    }

    let filtered = filter_null_keys(df, &present)?;
    let rows_removed = df.height() - filtered.height();

    if rows_removed > 0 {
        report.push(Finding::info(format!(
            "{} rows removed due to null key values",
            rows_removed
        )));
    } else {
        report.push(Finding::info("No rows removed by the key-column check"));
    }

    Ok(KeyCheckOutcome {
        table: filtered,
        rows_removed,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnSpec, DeclaredType};

    fn spec(renamed: &str, tolerance: Option<f64>) -> ColumnSpec {
        ColumnSpec {
            original_name: renamed.to_string(),
            renamed: renamed.to_string(),
            original_type: DeclaredType::String,
            formatted_type: DeclaredType::String,
            is_key: false,
            null_tolerance: tolerance,
            standardize: false,
            repair_time: false,
        }
    }

    fn metadata(columns: Vec<ColumnSpec>) -> TableMetadata {
        TableMetadata {
            table_name: "nyflights".to_string(),
            columns,
        }
    }

    #[test]
    fn test_null_rate_strictly_greater() {
        // one null in four rows: rate 0.25
        let df = df!(
            "companhia" => [Some("UA"), Some("B6"), None, Some("DL")],
        )
        .unwrap();

        // rate == tolerance is acceptable
        let report = check_null_rates(&df, &metadata(vec![spec("companhia", Some(0.25))]));
        assert!(!report.has_errors());

        // rate > tolerance is flagged
        let report = check_null_rates(&df, &metadata(vec![spec("companhia", Some(0.2))]));
        assert!(report.has_errors());
    }

    #[test]
    fn test_null_rate_skips_unconfigured_columns() {
        let df = df!("companhia" => [None::<&str>]).unwrap();
        let report = check_null_rates(&df, &metadata(vec![spec("companhia", None)]));
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_null_rate_absent_column_warns() {
        let df = df!("companhia" => ["UA"]).unwrap();
        let report = check_null_rates(&df, &metadata(vec![spec("destino", Some(0.1))]));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].level, FindingLevel::Warning);
    }

    #[test]
    fn test_check_keys_removes_null_rows() {
        let mut companies: Vec<Option<String>> = vec![Some("UA".to_string()); 95];
        companies.extend(std::iter::repeat_n(None, 5));
        let df = df!(
            "companhia" => companies,
            "tempo_voo" => vec![100i64; 100],
        )
        .unwrap();

        let outcome = check_keys(&df, &["companhia"]).unwrap();
        assert_eq!(outcome.table.height(), 95);
        assert_eq!(outcome.rows_removed, 5);
        assert!(
            outcome
                .report
                .findings
                .iter()
                .any(|f| f.message.contains("5 rows removed"))
        );
    }

    #[test]
    fn test_check_keys_warns_on_missing_column() {
        let df = df!("companhia" => ["UA", "B6"]).unwrap();
        let outcome = check_keys(&df, &["companhia", "destino"]).unwrap();

        assert_eq!(outcome.table.height(), 2);
        assert!(
            outcome
                .report
                .findings
                .iter()
                .any(|f| f.level == FindingLevel::Warning && f.message.contains("destino"))
        );
    }
}
