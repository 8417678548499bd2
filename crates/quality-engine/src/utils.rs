//! Shared helpers for dtype classification, value extraction and
//! numeric/date coercion.

use crate::types::Cell;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for scoring purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType carries calendar dates (Date or Datetime).
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Keep only ASCII digits, minus signs and decimal points.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("USD -12"), "-12");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect()
}

/// Strip formatting characters and parse as f64.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Percentile of already-sorted values using linear interpolation
/// between the two closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Non-null values in ascending order.
pub fn sorted_non_null(values: &[Option<f64>]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

// =============================================================================
// Date Utilities
// =============================================================================

/// Formats that carry a time component, tried first during auto-detection.
const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Date-only formats, interpreted at midnight.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y%m%d",
];

/// Check that a strftime format string compiles.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Parse a date or date-time with an explicit format.
///
/// Date-only formats are accepted and interpreted at midnight.
pub fn parse_date_with_format(s: &str, format: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    NaiveDateTime::parse_from_str(trimmed, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a date or date-time by trying RFC 3339 and the common formats.
pub fn parse_date_auto(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(trimmed, fmt)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
        })
}

fn datetime_from_unit(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    dt.map(|d| d.naive_utc())
}

/// Build a millisecond Datetime series from naive date-times.
pub fn datetime_series(name: PlSmallStr, values: &[Option<NaiveDateTime>]) -> PolarsResult<Series> {
    let millis: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.map(|dt| dt.and_utc().timestamp_millis()))
        .collect();
    Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Values of a numeric-castable series as f64; NaN is treated as missing.
pub fn float_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Values of a Date or Datetime series as naive date-times.
pub fn datetime_values(series: &Series) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let dtype = series.dtype().clone();
    let physical = series.to_physical_repr().cast(&DataType::Int64)?;
    let raw = physical.i64()?;

    match dtype {
        DataType::Date => Ok(raw
            .into_iter()
            .map(|v| {
                v.and_then(|days| DateTime::from_timestamp(days * 86_400, 0))
                    .map(|d| d.naive_utc())
            })
            .collect()),
        DataType::Datetime(unit, _) => Ok(raw
            .into_iter()
            .map(|v| v.and_then(|x| datetime_from_unit(x, unit)))
            .collect()),
        other => Err(PolarsError::InvalidOperation(
            format!("column '{}' has non-temporal dtype {}", series.name(), other).into(),
        )),
    }
}

/// Values of any series rendered as strings.
pub fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Convert a series into typed cells according to its dtype.
pub fn series_cells(series: &Series) -> PolarsResult<Vec<Cell>> {
    let cells = match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric => float_values(series)?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Number))
            .collect(),
        DtypeCategory::Datetime => datetime_values(series)?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Date))
            .collect(),
        DtypeCategory::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Bool))
            .collect(),
        DtypeCategory::String | DtypeCategory::Other => text_values(series)?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Text))
            .collect(),
    };
    Ok(cells)
}

// =============================================================================
// Tests
// =============================================================================
