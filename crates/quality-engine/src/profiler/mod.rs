//! Column statistics shown next to the quality scores.
//!
//! Statistics describe the table; they do not feed the score matrix.

mod statistics;

use crate::error::{QualityError, Result};
use polars::prelude::*;
use tracing::debug;

pub use statistics::ColumnStatistics;

/// Statistics for every column of `df`, in table order.
pub fn profile_columns(df: &DataFrame) -> Result<Vec<ColumnStatistics>> {
    df.get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            statistics::column_statistics(series).map_err(|e| {
                QualityError::TypeConversionFailed {
                    column: series.name().to_string(),
                    target_type: "statistics".to_string(),
                    reason: e.to_string(),
                }
            })
        })
        .inspect(|stats| {
            if let Ok(stats) = stats {
                debug!(
                    "Profiled '{}': {} missing, {} distinct",
                    stats.column, stats.missing_cells, stats.distinct_values
                );
            }
        })
        .collect()
}

/// Number of fully duplicated rows.
pub fn duplicate_rows(df: &DataFrame) -> Result<usize> {
    if df.width() == 0 {
        return Ok(0);
    }
    let unique = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
    Ok(df.height() - unique.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_columns() {
        let df = df![
            "id" => [1i64, 2, 3, 4],
            "city" => [Some("a"), Some("a"), None, None],
        ]
        .unwrap();
        let stats = profile_columns(&df).unwrap();
        assert_eq!(stats.len(), 2);

        let id = &stats[0];
        assert_eq!(id.column, "id");
        assert_eq!(id.missing_cells, 0);
        assert_eq!(id.duplicate_values, 0);
        assert_eq!(id.distinct_values, 4);
        assert_eq!(id.distinct_percentage, 100.0);

        let city = &stats[1];
        assert_eq!(city.missing_cells, 2);
        assert_eq!(city.missing_percentage, 50.0);
        // "a", "a", null, null: two repeats
        assert_eq!(city.duplicate_values, 2);
        assert_eq!(city.distinct_values, 1);
        assert_eq!(city.distinct_percentage, 25.0);
    }

    #[test]
    fn test_profile_empty_column() {
        let df = df!["v" => Vec::<f64>::new()].unwrap();
        let stats = profile_columns(&df).unwrap();
        assert_eq!(stats[0].missing_percentage, 0.0);
        assert_eq!(stats[0].distinct_values, 0);
    }

    #[test]
    fn test_duplicate_rows() {
        let df = df![
            "a" => [1i64, 1, 2],
            "b" => ["x", "x", "y"],
        ]
        .unwrap();
        assert_eq!(duplicate_rows(&df).unwrap(), 1);
        assert_eq!(duplicate_rows(&DataFrame::empty()).unwrap(), 0);
    }
}
