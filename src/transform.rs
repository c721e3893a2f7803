//! Schema transformation stages.
//!
//! Applies the metadata contract to the raw table: flight-date
//! composition, null filtering on key columns, column selection and
//! renaming, and declared-type coercion.

use crate::config::MissingColumnPolicy;
use crate::error::{FlightsError, Result};
use crate::models::{ColumnSpec, DeclaredType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use tracing::{debug, warn};

/// Name of the Date column composed from the raw year/month/day parts
pub const FLIGHT_DATE_COLUMN: &str = "data_voo";

/// Fetch a column, translating the polars miss into a domain error
pub(crate) fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| FlightsError::column_not_found(name))
}

/// Compose the `year`, `month` and `day` columns into a single Date
/// column named [`FLIGHT_DATE_COLUMN`]
///
/// Rows with a null component produce a null date; an impossible
/// calendar date aborts with a coercion error.
pub fn with_flight_date(df: &DataFrame) -> Result<DataFrame> {
    let years = date_part(df, "year")?;
    let months = date_part(df, "month")?;
    let days_of_month = date_part(df, "day")?;

    let epoch = NaiveDate::default();
    let mut days = Vec::with_capacity(df.height());
    for ((year, month), day) in years.iter().zip(&months).zip(&days_of_month) {
        match (year, month, day) {
            (Some(y), Some(m), Some(d)) => {
                let date = u32::try_from(*m)
                    .ok()
                    .zip(u32::try_from(*d).ok())
                    .and_then(|(m, d)| NaiveDate::from_ymd_opt(*y as i32, m, d))
                    .ok_or_else(|| {
                        FlightsError::type_coercion(
                            FLIGHT_DATE_COLUMN,
                            "date",
                            format!("invalid calendar date {}-{}-{}", y, m, d),
                        )
                    })?;
                days.push(Some((date - epoch).num_days() as i32));
            }
            _ => days.push(None),
        }
    }

    let composed = Series::new(FLIGHT_DATE_COLUMN.into(), days).cast(&DataType::Date)?;
    let mut out = df.clone();
    out.with_column(composed)?;
    Ok(out)
}

fn date_part(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let values = required_column(df, name)?.cast(&DataType::Int64)?;
    Ok(values.i64()?.into_iter().collect())
}

/// Remove every row holding a null in any key column, one key column at
/// a time; row order is preserved and the operation is idempotent
pub fn filter_null_keys(df: &DataFrame, key_columns: &[&str]) -> Result<DataFrame> {
    let mut filtered = df.clone();
    for column in key_columns {
        let mask = required_column(&filtered, column)?
            .as_materialized_series()
            .is_not_null();
        filtered = filtered.filter(&mask)?;
    }

    debug!(
        "Key-column null filter: {} -> {} rows",
        df.height(),
        filtered.height()
    );
    Ok(filtered)
}

/// Project the table to exactly the listed original columns, in order,
/// renamed positionally
pub fn select_and_rename(
    df: &DataFrame,
    original: &[&str],
    renamed: &[&str],
) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(original.len());
    for (from, to) in original.iter().zip(renamed) {
        let mut column = required_column(df, from)?.clone();
        column.rename((*to).into());
        columns.push(column);
    }
    DataFrame::new(columns).map_err(Into::into)
}

/// Cast each declared column to its declared original type
///
/// Int casts are strict and abort on unparseable values; float and
/// string casts are permissive; datetime parsing aborts on unparseable
/// text. Declared columns absent from the table follow the configured
/// missing-column policy.
pub fn coerce_types(
    df: &DataFrame,
    specs: &[ColumnSpec],
    policy: MissingColumnPolicy,
) -> Result<DataFrame> {
    let mut out = df.clone();
    for spec in specs {
        let name = spec.original_name.as_str();
        let series = match out.column(name) {
            Ok(column) => column.as_materialized_series().clone(),
            Err(_) => match policy {
                MissingColumnPolicy::Lenient => {
                    warn!(
                        "Declared column '{}' absent from table; skipping {} coercion",
                        name, spec.original_type
                    );
                    continue;
                }
                MissingColumnPolicy::Strict => {
                    return Err(FlightsError::column_not_found(name));
                }
            },
        };
        out.with_column(coerce_series(&series, spec.original_type)?)?;
    }
    Ok(out)
}

fn coerce_series(series: &Series, target: DeclaredType) -> Result<Series> {
    match target {
        DeclaredType::Int => series.strict_cast(&DataType::Int64).map_err(|e| {
            FlightsError::type_coercion(series.name().to_string(), "int", e.to_string())
        }),
        DeclaredType::Float => Ok(series.cast(&DataType::Float64)?),
        DeclaredType::String => Ok(series.cast(&DataType::String)?),
        DeclaredType::Datetime => coerce_datetime(series),
    }
}

fn coerce_datetime(series: &Series) -> Result<Series> {
    let name = series.name().clone();
    match series.dtype() {
        DataType::Datetime(_, _) => Ok(series.clone()),
        DataType::Date => Ok(series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?),
        DataType::String => {
            let mut stamps: Vec<Option<i64>> = Vec::with_capacity(series.len());
            for value in series.str()?.into_iter() {
                match value {
                    Some(raw) => {
                        let stamp = parse_datetime_text(raw.trim()).ok_or_else(|| {
                            FlightsError::type_coercion(
                                name.to_string(),
                                "datetime",
                                format!("unparseable datetime '{}'", raw),
                            )
                        })?;
                        stamps.push(Some(stamp));
                    }
                    None => stamps.push(None),
                }
            }
            Ok(Series::new(name, stamps)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
        }
        other => Err(FlightsError::type_coercion(
            name.to_string(),
            "datetime",
            format!("cannot interpret {} values as datetimes", other),
        )),
    }
}

fn parse_datetime_text(raw: &str) -> Option<i64> {
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(stamp.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}
