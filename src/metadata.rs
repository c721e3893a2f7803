//! Metadata contract loading.
//!
//! Parses the schema-description table into a [`TableMetadata`] object
//! describing column mappings, declared types, key columns, null
//! tolerances and per-column processing flags.

use crate::error::{FlightsError, Result};
use crate::ingest;
use crate::models::{ColumnSpec, DeclaredType, TableMetadata};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Columns the metadata table must provide
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "tabela",
    "cols_originais",
    "cols_renamed",
    "tipo_original",
    "tipo_formatted",
    "key",
    "raw_null_tolerance",
    "std_str",
    "corrige_hr",
];

/// Read the metadata contract from a CSV file
pub fn read_metadata(path: &Path) -> Result<TableMetadata> {
    info!("Reading metadata contract from {}", path.display());
    let df = ingest::read_csv(path)?;
    parse_metadata(&df)
}

/// Build the metadata object from an already-loaded description table
pub fn parse_metadata(df: &DataFrame) -> Result<TableMetadata> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        return Err(FlightsError::schema(format!(
            "missing required metadata columns: {}",
            missing.join(", ")
        )));
    }

    let tables = string_values(df, "tabela")?;
    let originals = string_values(df, "cols_originais")?;
    let renames = string_values(df, "cols_renamed")?;
    let original_types = string_values(df, "tipo_original")?;
    let formatted_types = string_values(df, "tipo_formatted")?;
    let keys = flag_values(df, "key")?;
    let tolerances = tolerance_values(df, "raw_null_tolerance")?;
    let standardize = flag_values(df, "std_str")?;
    let repair = flag_values(df, "corrige_hr")?;

    let table_name = tables
        .iter()
        .flatten()
        .next()
        .cloned()
        .ok_or_else(|| FlightsError::schema("tabela column holds no table name"))?;

    let mut columns = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let original_name = required_cell(&originals, row, "cols_originais")?;
        let renamed = required_cell(&renames, row, "cols_renamed")?;
        let original_type = declared_type(&original_types, row, &original_name, "tipo_original")?;
        let formatted_type = declared_type(&formatted_types, row, &original_name, "tipo_formatted")?;

        columns.push(ColumnSpec {
            original_name,
            renamed,
            original_type,
            formatted_type,
            is_key: keys[row],
            null_tolerance: tolerances[row],
            standardize: standardize[row],
            repair_time: repair[row],
        });
    }

    debug!(
        "Parsed metadata for table '{}': {} columns, {} keys, {} standardized, {} time-repaired",
        table_name,
        columns.len(),
        columns.iter().filter(|c| c.is_key).count(),
        columns.iter().filter(|c| c.standardize).count(),
        columns.iter().filter(|c| c.repair_time).count(),
    );

    Ok(TableMetadata {
        table_name,
        columns,
    })
}

fn required_cell(values: &[Option<String>], row: usize, column: &str) -> Result<String> {
    values[row]
        .clone()
        .ok_or_else(|| FlightsError::schema(format!("metadata row {} has no value for '{}'", row, column)))
}

fn declared_type(
    labels: &[Option<String>],
    row: usize,
    original_name: &str,
    column: &str,
) -> Result<DeclaredType> {
    let label = labels[row].as_deref().ok_or_else(|| {
        FlightsError::schema(format!(
            "metadata row {} ('{}') has no value for '{}'",
            row, original_name, column
        ))
    })?;
    DeclaredType::parse(label).ok_or_else(|| {
        FlightsError::schema(format!(
            "unknown declared type '{}' for column '{}'",
            label, original_name
        ))
    })
}

fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let values = df.column(column)?.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Binary 0/1 flags; anything other than 1 (including null) is false
fn flag_values(df: &DataFrame, column: &str) -> Result<Vec<bool>> {
    let values = df.column(column)?.cast(&DataType::Int64)?;
    Ok(values.i64()?.into_iter().map(|v| v == Some(1)).collect())
}

fn tolerance_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let values = df.column(column)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlightsError;
    use std::io::Write;

    fn metadata_frame() -> DataFrame {
        df!(
            "tabela" => ["nyflights", "nyflights", "nyflights"],
            "cols_originais" => ["carrier", "dep_time", "air_time"],
            "cols_renamed" => ["companhia", "datetime_partida", "tempo_voo"],
            "tipo_original" => ["string", "string", "float"],
            "tipo_formatted" => ["string", "datetime", "float"],
            "key" => [1i64, 0, 0],
            "raw_null_tolerance" => [Some(0.0f64), Some(0.05), None],
            "std_str" => [1i64, 0, 0],
            "corrige_hr" => [0i64, 1, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_metadata() {
        let metadata = parse_metadata(&metadata_frame()).unwrap();

        assert_eq!(metadata.table_name, "nyflights");
        assert_eq!(metadata.columns.len(), 3);
        assert_eq!(metadata.key_columns(), vec!["carrier"]);
        assert_eq!(metadata.key_columns_renamed(), vec!["companhia"]);
        assert_eq!(metadata.string_std_columns(), vec!["companhia"]);
        assert_eq!(metadata.time_repair_columns(), vec!["datetime_partida"]);

        let air_time = &metadata.columns[2];
        assert_eq!(air_time.original_type, DeclaredType::Float);
        assert_eq!(air_time.null_tolerance, None);
        assert!(!air_time.is_key);
    }

    #[test]
    fn test_missing_required_columns() {
        let df = df!(
            "tabela" => ["nyflights"],
            "cols_originais" => ["carrier"],
        )
        .unwrap();

        let err = parse_metadata(&df).unwrap_err();
        match err {
            FlightsError::Schema { reason } => {
                assert!(reason.contains("cols_renamed"));
                assert!(reason.contains("corrige_hr"));
            }
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_declared_type() {
        let mut df = metadata_frame();
        df.with_column(Series::new(
            "tipo_original".into(),
            vec!["string", "decimal", "float"],
        ))
        .unwrap();

        let err = parse_metadata(&df).unwrap_err();
        match err {
            FlightsError::Schema { reason } => assert!(reason.contains("decimal")),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_metadata_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "tabela,cols_originais,cols_renamed,tipo_original,tipo_formatted,key,raw_null_tolerance,std_str,corrige_hr"
        )
        .unwrap();
        writeln!(file, "nyflights,carrier,companhia,string,string,1,0.0,1,0").unwrap();
        writeln!(
            file,
            "nyflights,dep_time,datetime_partida,string,datetime,0,0.05,0,1"
        )
        .unwrap();

        let metadata = read_metadata(file.path()).unwrap();
        assert_eq!(metadata.table_name, "nyflights");
        assert_eq!(metadata.original_columns(), vec!["carrier", "dep_time"]);
        assert_eq!(metadata.time_repair_columns(), vec!["datetime_partida"]);
    }
}
