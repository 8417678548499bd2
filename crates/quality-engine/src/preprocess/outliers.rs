//! Outlier treatment for numeric columns.

use crate::config::OutlierMethod;
use crate::utils::{float_values, quantile_sorted, sorted_non_null};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Apply `method` to a Float64 series. Returns the treated series and the
/// number of values that changed.
pub(crate) fn treat_outliers(series: &Series, method: OutlierMethod) -> Result<(Series, usize)> {
    let bounds = match method {
        OutlierMethod::None => return Ok((series.clone(), 0)),
        OutlierMethod::Cap => cap_bounds(&float_values(series)?),
        OutlierMethod::Winsorize => winsorize_bounds(&float_values(series)?),
    };
    let Some((lower, upper)) = bounds else {
        return Ok((series.clone(), 0));
    };

    let values = float_values(series)?;
    let changed = values
        .iter()
        .flatten()
        .filter(|v| **v < lower || **v > upper)
        .count();
    let treated: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| v.map(|x| x.clamp(lower, upper)))
        .collect();

    debug!(
        "{:?} on '{}': bounds [{}, {}], {} values changed",
        method,
        series.name(),
        lower,
        upper,
        changed
    );
    Ok((Series::new(series.name().clone(), treated), changed))
}

/// [5th, 95th] percentile bounds, linearly interpolated.
fn cap_bounds(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let sorted = sorted_non_null(values);
    Some((quantile_sorted(&sorted, 0.05)?, quantile_sorted(&sorted, 0.95)?))
}

/// With `k = floor(0.05 n)`, the values at sorted positions `k` and `n-k-1`.
/// Fewer than 20 values give `k = 0` and no treatment.
fn winsorize_bounds(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let sorted = sorted_non_null(values);
    let n = sorted.len();
    let k = (n as f64 * 0.05).floor() as usize;
    if k == 0 {
        return None;
    }
    Some((sorted[k], sorted[n - k - 1]))
}
