//! Derived flight features.
//!
//! Computes expected and scheduled durations, delay, weekday and the
//! time-of-day bucket from the cleaned table. Missing or invalid inputs
//! carry through as nulls; this stage never rejects rows.

use crate::error::Result;
use crate::transform::{FLIGHT_DATE_COLUMN, required_column};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike};
use polars::prelude::*;
use tracing::info;

/// Repaired departure timestamp column
pub const DEPARTURE_COLUMN: &str = "datetime_partida_formatted";
/// Repaired arrival timestamp column
pub const ARRIVAL_COLUMN: &str = "datetime_chegada_formatted";
/// Scheduled flight duration in minutes
pub const SCHEDULED_MINUTES_COLUMN: &str = "tempo_voo";

/// Derived feature columns
pub const EXPECTED_DURATION_COLUMN: &str = "tempo_voo_esperado";
pub const SCHEDULED_HOURS_COLUMN: &str = "tempo_voo_hr";
pub const DELAY_COLUMN: &str = "atraso";
/// Weekday ordinal, 0 = Monday .. 6 = Sunday
pub const WEEKDAY_COLUMN: &str = "dia_semana";
pub const PERIOD_COLUMN: &str = "horario";

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Time-of-day bucket for a departure hour
pub fn classify_hour(hour: u32) -> &'static str {
    match hour {
        0..6 => "MADRUGADA",
        6..12 => "MANHA",
        12..18 => "TARDE",
        _ => "NOITE",
    }
}

/// Append the derived duration, delay, weekday and period columns
pub fn engineer_features(df: &DataFrame) -> Result<DataFrame> {
    info!("Deriving feature columns for {} rows", df.height());

    let departures = timestamp_millis(df, DEPARTURE_COLUMN)?;
    let arrivals = timestamp_millis(df, ARRIVAL_COLUMN)?;
    let scheduled: Vec<Option<f64>> = required_column(df, SCHEDULED_MINUTES_COLUMN)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect();
    let flight_days: Vec<Option<i32>> = required_column(df, FLIGHT_DATE_COLUMN)?
        .cast(&DataType::Date)?
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .collect();

    let expected: Vec<Option<f64>> = departures
        .iter()
        .copied()
        .zip(arrivals.iter().copied())
        .map(|(dep, arr)| {
            dep.zip(arr)
                .map(|(dep, arr)| (arr - dep) as f64 / MILLIS_PER_HOUR)
        })
        .collect();

    let scheduled_hours: Vec<Option<f64>> = scheduled
        .iter()
        .map(|minutes| minutes.map(|m| m / 60.0))
        .collect();

    let delay: Vec<Option<f64>> = scheduled_hours
        .iter()
        .copied()
        .zip(expected.iter().copied())
        .map(|(actual, expected)| actual.zip(expected).map(|(a, e)| a - e))
        .collect();

    let epoch = NaiveDate::default();
    let weekday: Vec<Option<i64>> = flight_days
        .iter()
        .copied()
        .map(|days| {
            days.map(|days| {
                let date = epoch + Duration::days(days as i64);
                date.weekday().num_days_from_monday() as i64
            })
        })
        .collect();

    let period: Vec<Option<&str>> = departures
        .iter()
        .copied()
        .map(|stamp| {
            stamp
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| classify_hour(dt.hour()))
        })
        .collect();

    let mut out = df.clone();
    out.with_column(Series::new(EXPECTED_DURATION_COLUMN.into(), expected))?;
    out.with_column(Series::new(SCHEDULED_HOURS_COLUMN.into(), scheduled_hours))?;
    out.with_column(Series::new(DELAY_COLUMN.into(), delay))?;
    out.with_column(Series::new(WEEKDAY_COLUMN.into(), weekday))?;
    out.with_column(Series::new(PERIOD_COLUMN.into(), period))?;
    Ok(out)
}

fn timestamp_millis(df: &DataFrame, column: &str) -> Result<Vec<Option<i64>>> {
    let values = required_column(df, column)?.cast(&DataType::Int64)?;
    Ok(values.i64()?.into_iter().collect())
}
