//! Free-text standardization.
//!
//! Converts designated text columns into a canonical uppercase
//! alphanumeric form, derived into `<column>_formatted` companions.

use crate::error::{FlightsError, Result};
use crate::transform::required_column;
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9]+").expect("valid pattern"));

/// Suffix appended to derived standardized and time-repaired columns
pub const FORMATTED_SUFFIX: &str = "_formatted";

/// Uppercase the text and strip everything that is not an ASCII letter
/// or digit
pub fn standardize_text(raw: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(&raw.to_uppercase(), "")
        .into_owned()
}

/// Derive a `<column>_formatted` standardized companion for each
/// designated column
///
/// A null value in a designated column is a contract violation and
/// fails explicitly instead of crashing mid-standardization.
pub fn standardize_columns(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut out = df.clone();
    for column in columns {
        let values = required_column(&out, column)?.cast(&DataType::String)?;
        let mut standardized = Vec::with_capacity(values.len());
        for value in values.str()?.into_iter() {
            let raw = value.ok_or_else(|| FlightsError::NullInput {
                column: (*column).to_string(),
            })?;
            standardized.push(standardize_text(raw));
        }

        let derived_name = format!("{column}{FORMATTED_SUFFIX}");
        debug!("Standardized '{}' into '{}'", column, derived_name);
        out.with_column(Series::new(derived_name.into(), standardized))?;
    }
    Ok(out)
}
