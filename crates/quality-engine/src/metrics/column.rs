//! Single-column metrics: completeness, uniqueness, validity, timeliness
//! and reliability.
//!
//! Every function returns a percentage in [0, 100]. A column with zero rows
//! scores 0 wherever the metric applies to its kind.

use crate::error::{QualityError, Result};
use crate::metrics::validators::Validator;
use crate::utils::{
    datetime_values, float_values, is_datetime_dtype, is_numeric_dtype, quantile_sorted,
    series_cells, sorted_non_null,
};
use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::debug;

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Share of non-null cells.
pub fn completeness(series: &Series) -> f64 {
    let rows = series.len();
    percentage(rows - series.null_count(), rows)
}

/// Distinct non-null values relative to the row count.
pub fn uniqueness(series: &Series) -> Result<f64> {
    let rows = series.len();
    if rows == 0 {
        return Ok(0.0);
    }
    let distinct = series.drop_nulls().n_unique()?;
    Ok(percentage(distinct, rows))
}

/// Share of cells accepted by `validator`; null cells count as invalid.
///
/// An empty column scores 0. Otherwise, without a validator every column is
/// valid.
pub fn validity(series: &Series, validator: Option<&dyn Validator>) -> Result<f64> {
    if series.is_empty() {
        return Ok(0.0);
    }
    let Some(validator) = validator else {
        return Ok(100.0);
    };
    let cells = series_cells(series)?;
    let valid = cells
        .iter()
        .filter(|cell| !cell.is_null() && validator.is_valid(cell))
        .count();
    debug!(
        "Validity of '{}' with {} validator: {}/{}",
        series.name(),
        validator.name(),
        valid,
        cells.len()
    );
    Ok(percentage(valid, cells.len()))
}

/// Share of cells that are null or dated on/after `threshold`.
///
/// Non-date columns score 100. A date column without a threshold is a
/// configuration error.
pub fn timeliness(series: &Series, threshold: Option<NaiveDateTime>) -> Result<f64> {
    if !is_datetime_dtype(series.dtype()) {
        return Ok(100.0);
    }
    let Some(threshold) = threshold else {
        return Err(QualityError::MissingThresholdDate {
            column: series.name().to_string(),
        });
    };
    let values = datetime_values(series)?;
    let timely = values
        .iter()
        .filter(|value| value.is_none_or(|date| date >= threshold))
        .count();
    Ok(percentage(timely, values.len()))
}

/// Share of rows inside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
///
/// Quartiles interpolate linearly over the non-null values; null cells count
/// as outside the bounds. Non-numeric columns score 100.
pub fn reliability(series: &Series) -> Result<f64> {
    if !is_numeric_dtype(series.dtype()) {
        return Ok(100.0);
    }
    let values = float_values(series)?;
    let sorted = sorted_non_null(&values);
    let (Some(q1), Some(q3)) = (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75))
    else {
        return Ok(0.0);
    };
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = values
        .iter()
        .flatten()
        .filter(|v| (lower..=upper).contains(*v))
        .count();
    debug!(
        "Reliability of '{}': bounds [{:.3}, {:.3}], {}/{} inside",
        series.name(),
        lower,
        upper,
        inside,
        values.len()
    );
    Ok(percentage(inside, values.len()))
}
