//! Per-column descriptive statistics.

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub dtype: String,
    pub missing_cells: usize,
    pub missing_percentage: f64,
    /// Rows repeating a value already seen above them (null counts as a value).
    pub duplicate_values: usize,
    pub duplicate_percentage: f64,
    /// Distinct non-null values.
    pub distinct_values: usize,
    pub distinct_percentage: f64,
    /// Estimated in-memory size of the column.
    pub memory_bytes: usize,
}

fn percentage(count: usize, rows: usize) -> f64 {
    if rows == 0 {
        0.0
    } else {
        count as f64 / rows as f64 * 100.0
    }
}

pub(crate) fn column_statistics(series: &Series) -> Result<ColumnStatistics> {
    let rows = series.len();
    let missing = series.null_count();
    let unique_with_null = if rows == 0 { 0 } else { series.n_unique()? };
    let distinct = if missing == rows {
        0
    } else {
        series.drop_nulls().n_unique()?
    };
    let duplicates = rows - unique_with_null;

    Ok(ColumnStatistics {
        column: series.name().to_string(),
        dtype: series.dtype().to_string(),
        missing_cells: missing,
        missing_percentage: percentage(missing, rows),
        duplicate_values: duplicates,
        duplicate_percentage: percentage(duplicates, rows),
        distinct_values: distinct,
        distinct_percentage: percentage(distinct, rows),
        memory_bytes: series.estimated_size(),
    })
}
