//! Repair of compact flight time strings.
//!
//! Raw departure/arrival times arrive as 1-4 digit strings with no
//! fixed width ("5", "835", "1630") plus the "2400" midnight sentinel.
//! Repair turns them into canonical `HH:MM` text and combines them with
//! the flight date into full timestamp columns.

use crate::error::{FlightsError, Result};
use crate::normalize::FORMATTED_SUFFIX;
use crate::transform::required_column;
use chrono::{Duration, NaiveDate, NaiveTime};
use polars::prelude::*;
use tracing::debug;

/// Convert a compact time-of-day string into `HH:MM` text
///
/// `"2400"` is the midnight sentinel and maps to `"00:00"`. Two-digit
/// values up to 12 keep their historical digit-wise expansion: `"83"`
/// becomes `"08:30"`, not `"00:83"`. Everything else is left-zero-padded
/// to four digits and split down the middle.
pub fn repair_time(raw: &str) -> Result<String> {
    if raw == "2400" {
        return Ok("00:00".to_string());
    }

    if raw.is_empty() || raw.len() > 4 {
        return Err(FlightsError::time_format(
            raw,
            format!("unsupported width {}", raw.len()),
        ));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FlightsError::time_format(raw, "non-digit characters"));
    }

    if raw.len() == 2 {
        let value: u32 = raw
            .parse()
            .map_err(|_| FlightsError::time_format(raw, "unparseable digits"))?;
        if value <= 12 {
            return Ok(format!("0{}:{}0", &raw[..1], &raw[1..]));
        }
    }

    let padded = format!("{raw:0>4}");
    Ok(format!("{}:{}", &padded[..2], &padded[2..]))
}

/// Strip the literal `.0` suffix a float-typed intermediate leaves on a
/// compact time string
fn strip_float_suffix(raw: &str) -> &str {
    raw.strip_suffix(".0").unwrap_or(raw)
}

/// Repair a compact time column and combine it with the flight date
/// into a `<column>_formatted` timestamp column
///
/// Null raw values and null dates carry through as null timestamps; a
/// repaired value that is not a real time of day (such as `"09:99"`
/// from raw `"999"`) aborts the run.
pub fn repair_times(df: &DataFrame, column: &str, date_column: &str) -> Result<DataFrame> {
    let raw = required_column(df, column)?.cast(&DataType::String)?;
    let dates = required_column(df, date_column)?
        .cast(&DataType::Date)?
        .cast(&DataType::Int32)?;

    let epoch = NaiveDate::default();
    let mut stamps: Vec<Option<i64>> = Vec::with_capacity(df.height());
    for (value, day) in raw.str()?.into_iter().zip(dates.i32()?.into_iter()) {
        match (value, day) {
            (Some(value), Some(day)) => {
                let repaired = repair_time(strip_float_suffix(value.trim()))?;
                let time = NaiveTime::parse_from_str(&repaired, "%H:%M").map_err(|_| {
                    FlightsError::time_format(value, format!("'{repaired}' is not a time of day"))
                })?;
                let date = epoch + Duration::days(day as i64);
                stamps.push(Some(date.and_time(time).and_utc().timestamp_millis()));
            }
            _ => stamps.push(None),
        }
    }

    let derived_name = format!("{column}{FORMATTED_SUFFIX}");
    debug!("Repaired '{}' into '{}'", column, derived_name);

    let series = Series::new(derived_name.into(), stamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let mut out = df.clone();
    out.with_column(series)?;
    Ok(out)
}
