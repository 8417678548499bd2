//! Cross-column metrics: accuracy against a reference column and row
//! consistency.

use crate::error::{QualityError, Result};
use crate::metrics::rules::{ConsistencyCheck, ConsistencyRule, RowView};
use crate::types::{Metric, QualityWarning};
use crate::utils::{
    datetime_values, float_values, is_datetime_dtype, is_numeric_dtype, series_cells,
};
use polars::prelude::*;
use tracing::{debug, warn};

/// Share of rows matching the reference column.
///
/// Numeric columns match when `|value - reference| <= tolerance` and require
/// a tolerance; other columns need an exact cell match. An empty column or
/// reference scores 0 before the tolerance is looked at. Rows are compared up
/// to the shorter length and divided by the length of `series`. Nulls never
/// match.
pub fn accuracy(series: &Series, reference: Option<&Series>, tolerance: Option<f64>) -> Result<f64> {
    let Some(reference) = reference else {
        return Ok(100.0);
    };

    if series.is_empty() || reference.is_empty() {
        return Ok(0.0);
    }

    let numeric = is_numeric_dtype(series.dtype());
    let tolerance = match (numeric, tolerance) {
        (true, None) => {
            return Err(QualityError::MissingTolerance {
                column: series.name().to_string(),
            });
        }
        (_, tolerance) => tolerance.unwrap_or_default(),
    };

    let matched = if numeric {
        let values = float_values(series)?;
        let expected = float_values(reference)?;
        values
            .iter()
            .zip(expected.iter())
            .filter(|(v, e)| matches!((v, e), (Some(v), Some(e)) if (v - e).abs() <= tolerance))
            .count()
    } else {
        let values = series_cells(series)?;
        let expected = series_cells(reference)?;
        values
            .iter()
            .zip(expected.iter())
            .filter(|(v, e)| v.matches(e))
            .count()
    };

    debug!(
        "Accuracy of '{}' against '{}': {}/{} matched",
        series.name(),
        reference.name(),
        matched,
        series.len()
    );
    Ok(matched as f64 / series.len() as f64 * 100.0)
}

/// `100 * (1 - inconsistent / rows)` for `column` under `check`.
///
/// Missing columns and column pairs that cannot be ordered are not errors:
/// they score 100 and add a warning. Without a check the column is
/// vacuously consistent.
pub fn consistency(
    df: &DataFrame,
    column: &str,
    check: Option<&ConsistencyCheck>,
    warnings: &mut Vec<QualityWarning>,
) -> Result<f64> {
    let rows = df.height();

    let Ok(series) = df.column(column).map(|c| c.as_materialized_series()) else {
        record(warnings, column, QualityError::ColumnNotFound(column.to_string()));
        return Ok(100.0);
    };
    let Some(check) = check else {
        return Ok(100.0);
    };
    if rows == 0 {
        return Ok(100.0);
    }

    let inconsistent = match check {
        ConsistencyCheck::NotGreaterThan(other) => {
            let Ok(other_series) = df.column(other).map(|c| c.as_materialized_series()) else {
                record(warnings, column, QualityError::ColumnNotFound(other.clone()));
                return Ok(100.0);
            };
            match count_greater(series, other_series)? {
                Some(count) => count,
                None => {
                    record(
                        warnings,
                        column,
                        QualityError::IncomparableColumns {
                            left: column.to_string(),
                            right: other.clone(),
                        },
                    );
                    return Ok(100.0);
                }
            }
        }
        ConsistencyCheck::Rule(rule) => count_rule_violations(df, rule.as_ref())?,
    };

    debug!("Consistency of '{}': {}/{} rows inconsistent", column, inconsistent, rows);
    Ok(100.0 * (1.0 - inconsistent as f64 / rows as f64))
}

fn record(warnings: &mut Vec<QualityWarning>, column: &str, error: QualityError) {
    warn!("Consistency of '{}' defaulted to 100: {}", column, error);
    warnings.push(QualityWarning::metric(
        column,
        Metric::Consistency,
        error.to_string(),
    ));
}

/// Rows where `left > right`, or `None` when the pair is not numeric-numeric
/// or date-date. Comparisons involving a null are consistent.
fn count_greater(left: &Series, right: &Series) -> Result<Option<usize>> {
    fn count<T: PartialOrd>(a: &[Option<T>], b: &[Option<T>]) -> usize {
        a.iter()
            .zip(b)
            .filter(|(x, y)| matches!((x, y), (Some(x), Some(y)) if x > y))
            .count()
    }

    let (l, r) = (left.dtype(), right.dtype());
    if is_numeric_dtype(l) && is_numeric_dtype(r) {
        Ok(Some(count(&float_values(left)?, &float_values(right)?)))
    } else if is_datetime_dtype(l) && is_datetime_dtype(r) {
        Ok(Some(count(&datetime_values(left)?, &datetime_values(right)?)))
    } else {
        Ok(None)
    }
}

fn count_rule_violations(df: &DataFrame, rule: &dyn ConsistencyRule) -> Result<usize> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let columns = df
        .get_columns()
        .iter()
        .map(|c| series_cells(c.as_materialized_series()))
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok((0..df.height())
        .filter(|&row| !rule.is_consistent(&RowView::new(&names, &columns, row)))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use crate::utils::{datetime_series, parse_date_auto};

    // ==================== accuracy tests ====================

    #[test]
    fn test_accuracy_without_reference() {
        let s = Series::new("v".into(), &[1.0, 2.0]);
        assert_eq!(accuracy(&s, None, None).unwrap(), 100.0);

        let empty = Series::new_empty("v".into(), &DataType::Float64);
        assert_eq!(accuracy(&empty, None, None).unwrap(), 100.0);
    }

    #[test]
    fn test_accuracy_numeric_tolerance() {
        let s = Series::new("price".into(), &[Some(10.0), Some(20.4), Some(30.0), None]);
        let r = Series::new("list".into(), &[10.2, 20.0, 35.0, 1.0]);
        assert_eq!(accuracy(&s, Some(&r), Some(0.5)).unwrap(), 50.0);
    }

    #[test]
    fn test_accuracy_numeric_requires_tolerance() {
        let s = Series::new("price".into(), &[1.0]);
        let err = accuracy(&s, Some(&s), None).unwrap_err();
        assert!(matches!(err, QualityError::MissingTolerance { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_accuracy_exact_match_for_text() {
        let s = Series::new("city".into(), &[Some("paris"), Some("rome"), None, Some("oslo")]);
        let r = Series::new("ref".into(), &[Some("paris"), Some("Rome"), None, Some("oslo")]);
        assert_eq!(accuracy(&s, Some(&r), None).unwrap(), 50.0);
    }

    #[test]
    fn test_accuracy_shorter_reference() {
        let s = Series::new("code".into(), &["a", "b", "c", "d"]);
        let r = Series::new("ref".into(), &["a", "b"]);
        assert_eq!(accuracy(&s, Some(&r), None).unwrap(), 50.0);
    }

    #[test]
    fn test_accuracy_empty_columns() {
        let s = Series::new("code".into(), &["a"]);
        let empty = Series::new_empty("ref".into(), &DataType::String);
        assert_eq!(accuracy(&s, Some(&empty), None).unwrap(), 0.0);

        // no tolerance needed when there is nothing to compare
        let empty_f64 = Series::new_empty("v".into(), &DataType::Float64);
        let r = Series::new("ref".into(), &[1.0, 2.0]);
        assert_eq!(accuracy(&empty_f64, Some(&r), None).unwrap(), 0.0);
        assert_eq!(accuracy(&r, Some(&empty_f64), None).unwrap(), 0.0);
        assert_eq!(accuracy(&empty, Some(&s), None).unwrap(), 0.0);
    }

    // ==================== consistency tests ====================

    #[test]
    fn test_consistency_numeric_pair() {
        let df = df![
            "start" => [1.0, 2.0, 3.0, 4.0],
            "end" => [2.0, 2.0, 5.0, 9.0],
        ]
        .unwrap();
        let check = ConsistencyCheck::against("end");
        let mut warnings = Vec::new();
        assert_eq!(
            consistency(&df, "start", Some(&check), &mut warnings).unwrap(),
            100.0
        );

        let df = df![
            "start" => [1.0, 2.0, 6.0, 4.0],
            "end" => [2.0, 2.0, 5.0, 9.0],
        ]
        .unwrap();
        assert_eq!(
            consistency(&df, "start", Some(&check), &mut warnings).unwrap(),
            75.0
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_consistency_nulls_are_consistent() {
        let df = df![
            "a" => [Some(5i64), None, Some(1)],
            "b" => [None, Some(1i64), Some(0)],
        ]
        .unwrap();
        let mut warnings = Vec::new();
        let score = consistency(&df, "a", Some(&ConsistencyCheck::against("b")), &mut warnings)
            .unwrap();
        assert!((score - 100.0 * (1.0 - 1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_date_pair() {
        let parse = |s: &str| parse_date_auto(s);
        let ordered = datetime_series(
            "ordered".into(),
            &[parse("2024-01-01"), parse("2024-02-01")],
        )
        .unwrap();
        let shipped = datetime_series(
            "shipped".into(),
            &[parse("2024-01-03"), parse("2024-01-15")],
        )
        .unwrap();
        let df = DataFrame::new(vec![ordered.into_column(), shipped.into_column()]).unwrap();

        let mut warnings = Vec::new();
        let score = consistency(
            &df,
            "ordered",
            Some(&ConsistencyCheck::against("shipped")),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(score, 50.0);
    }

    #[test]
    fn test_consistency_missing_column_warns() {
        let df = df!["a" => [1i64, 2]].unwrap();
        let mut warnings = Vec::new();

        let score = consistency(
            &df,
            "ghost",
            Some(&ConsistencyCheck::against("a")),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(score, 100.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].column, "ghost");

        let score =
            consistency(&df, "a", Some(&ConsistencyCheck::against("ghost")), &mut warnings)
                .unwrap();
        assert_eq!(score, 100.0);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_consistency_incomparable_pair_warns() {
        let df = df!["n" => [1i64, 2], "t" => ["x", "y"]].unwrap();
        let mut warnings = Vec::new();
        let score =
            consistency(&df, "n", Some(&ConsistencyCheck::against("t")), &mut warnings).unwrap();
        assert_eq!(score, 100.0);
        assert!(warnings[0].message.contains("not comparable"));
        assert_eq!(warnings[0].metric, Some(Metric::Consistency));
    }

    #[test]
    fn test_consistency_without_check_or_rows() {
        let df = df!["a" => [1i64]].unwrap();
        let mut warnings = Vec::new();
        assert_eq!(consistency(&df, "a", None, &mut warnings).unwrap(), 100.0);

        let empty = df!["a" => Vec::<i64>::new(), "b" => Vec::<i64>::new()].unwrap();
        assert_eq!(
            consistency(&empty, "a", Some(&ConsistencyCheck::against("b")), &mut warnings)
                .unwrap(),
            100.0
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_consistency_custom_rule() {
        let df = df![
            "qty" => [1i64, -2, 3, -4],
            "status" => ["ok", "ok", "ok", "void"],
        ]
        .unwrap();
        let check = ConsistencyCheck::rule(|row: &RowView<'_>| {
            row.number("qty").is_some_and(|q| q >= 0.0)
                || row.get("status") == Some(&Cell::Text("void".to_string()))
        });

        let mut warnings = Vec::new();
        assert_eq!(
            consistency(&df, "qty", Some(&check), &mut warnings).unwrap(),
            75.0
        );
    }
}
