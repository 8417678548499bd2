//! Column conversions applied by the preprocessor.

use crate::utils::{
    datetime_series, datetime_values, is_datetime_dtype, is_numeric_dtype, parse_date_auto,
    parse_date_with_format, parse_numeric_string, text_values,
};
use anyhow::Result;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

/// Label given to values outside the most frequent categories.
pub(crate) const OTHER_CATEGORY: &str = "Other";

/// Result of a conversion: the new series plus how many non-null inputs
/// were turned into nulls or otherwise rewritten.
#[derive(Debug)]
pub(crate) struct Converted {
    pub series: Series,
    pub affected: usize,
}

fn count_lost<T, U>(before: &[Option<T>], after: &[Option<U>]) -> usize {
    before
        .iter()
        .zip(after)
        .filter(|(b, a)| b.is_some() && a.is_none())
        .count()
}

/// Parse a column into millisecond datetimes.
///
/// Temporal columns are only normalized. Text cells are parsed with
/// `format` when given, otherwise against the common formats.
pub(crate) fn to_datetime(series: &Series, format: Option<&str>) -> Result<Converted> {
    let name = series.name().clone();

    if is_datetime_dtype(series.dtype()) {
        let values = datetime_values(series)?;
        return Ok(Converted {
            series: datetime_series(name, &values)?,
            affected: 0,
        });
    }

    let raw = text_values(series)?;
    let parsed: Vec<_> = raw
        .iter()
        .map(|value| {
            value.as_deref().and_then(|s| match format {
                Some(fmt) => parse_date_with_format(s, fmt),
                None => parse_date_auto(s),
            })
        })
        .collect();

    Ok(Converted {
        affected: count_lost(&raw, &parsed),
        series: datetime_series(name, &parsed)?,
    })
}

/// Parse a column into Float64.
///
/// Numeric columns are cast directly. Anything else is rendered as text and
/// stripped of every character except digits, `-` and `.` before parsing.
pub(crate) fn to_numeric(series: &Series) -> Result<Converted> {
    if is_numeric_dtype(series.dtype()) {
        return Ok(Converted {
            series: series.cast(&DataType::Float64)?,
            affected: 0,
        });
    }

    let raw = text_values(series)?;
    let parsed: Vec<Option<f64>> = raw
        .iter()
        .map(|value| value.as_deref().and_then(parse_numeric_string))
        .collect();

    Ok(Converted {
        affected: count_lost(&raw, &parsed),
        series: Series::new(series.name().clone(), parsed),
    })
}

/// Trim and lower-case every value; nulls stay null.
pub(crate) fn to_text(series: &Series) -> Result<Converted> {
    let raw = text_values(series)?;
    let mut affected = 0;
    let normalized: Vec<Option<String>> = raw
        .into_iter()
        .map(|value| {
            value.map(|s| {
                let clean = s.trim().to_lowercase();
                if clean != s {
                    affected += 1;
                }
                clean
            })
        })
        .collect();

    Ok(Converted {
        series: Series::new(series.name().clone(), normalized),
        affected,
    })
}

/// Keep the `top_n` most frequent values and bucket the rest into "Other".
///
/// Ties in frequency keep the value seen first in the column. When no value
/// is bucketed the column keeps its dtype; otherwise it becomes String.
pub(crate) fn to_categorical(series: &Series, top_n: usize) -> Result<Converted> {
    let raw = text_values(series)?;
    let keep = top_categories(&raw, top_n);
    if raw.iter().flatten().all(|value| keep.contains(value.as_str())) {
        return Ok(Converted {
            series: series.clone(),
            affected: 0,
        });
    }

    let mut affected = 0;
    let bucketed: Vec<Option<String>> = raw
        .into_iter()
        .map(|value| {
            value.map(|s| {
                if keep.contains(s.as_str()) {
                    s
                } else {
                    affected += 1;
                    OTHER_CATEGORY.to_string()
                }
            })
        })
        .collect();

    Ok(Converted {
        series: Series::new(series.name().clone(), bucketed),
        affected,
    })
}

fn top_categories(values: &[Option<String>], top_n: usize) -> HashSet<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for value in values.iter().flatten() {
        match positions.get(value.as_str()) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(value.as_str(), counts.len());
                counts.push((value.as_str(), 1));
            }
        }
    }

    // stable: equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(top_n)
        .map(|(value, _)| value.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::float_values;

    fn strings(series: &Series) -> Vec<Option<String>> {
        text_values(series).unwrap()
    }

    // ==================== to_numeric tests ====================

    #[test]
    fn test_to_numeric_strips_formatting() {
        let series = Series::new(
            "price".into(),
            &[Some("$1,234.50"), Some("  42 "), Some("n/a"), None, Some("-7 kg")],
        );
        let converted = to_numeric(&series).unwrap();

        assert_eq!(converted.series.dtype(), &DataType::Float64);
        assert_eq!(
            float_values(&converted.series).unwrap(),
            vec![Some(1234.5), Some(42.0), None, None, Some(-7.0)]
        );
        assert_eq!(converted.affected, 1);
    }

    #[test]
    fn test_to_numeric_casts_numeric_dtype() {
        let series = Series::new("n".into(), &[1i32, 2, 3]);
        let converted = to_numeric(&series).unwrap();
        assert_eq!(converted.series.dtype(), &DataType::Float64);
        assert_eq!(converted.affected, 0);
    }

    // ==================== to_datetime tests ====================

    #[test]
    fn test_to_datetime_auto_detect() {
        let series = Series::new(
            "created".into(),
            &[Some("2024-01-15"), Some("01/20/2024"), Some("garbage"), None],
        );
        let converted = to_datetime(&series, None).unwrap();

        assert!(matches!(
            converted.series.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        let values = datetime_values(&converted.series).unwrap();
        assert_eq!(values[0], parse_date_auto("2024-01-15"));
        assert_eq!(values[1], parse_date_auto("2024-01-20"));
        assert_eq!(values[2], None);
        assert_eq!(values[3], None);
        assert_eq!(converted.affected, 1);
    }

    #[test]
    fn test_to_datetime_explicit_format() {
        let series = Series::new("d".into(), &["15/01/2024", "2024-01-15"]);
        let converted = to_datetime(&series, Some("%d/%m/%Y")).unwrap();
        let values = datetime_values(&converted.series).unwrap();
        assert_eq!(values[0], parse_date_auto("2024-01-15"));
        assert_eq!(values[1], None);
    }

    #[test]
    fn test_to_datetime_normalizes_temporal() {
        let date = parse_date_auto("2024-05-05");
        let series = datetime_series("d".into(), &[date]).unwrap();
        let converted = to_datetime(&series, None).unwrap();
        assert_eq!(datetime_values(&converted.series).unwrap(), vec![date]);
    }

    // ==================== to_text tests ====================

    #[test]
    fn test_to_text_trims_and_lowercases() {
        let series = Series::new("name".into(), &[Some("  Alice "), Some("bob"), None]);
        let converted = to_text(&series).unwrap();
        assert_eq!(
            strings(&converted.series),
            vec![Some("alice".to_string()), Some("bob".to_string()), None]
        );
        assert_eq!(converted.affected, 1);
    }

    // ==================== to_categorical tests ====================

    #[test]
    fn test_to_categorical_keeps_top_values() {
        let mut values: Vec<Option<String>> = Vec::new();
        // twelve categories: c0..c9 appear twice, x and y once
        for i in 0..10 {
            values.push(Some(format!("c{}", i)));
            values.push(Some(format!("c{}", i)));
        }
        values.push(Some("x".to_string()));
        values.push(Some("y".to_string()));
        values.push(None);

        let series = Series::new("cat".into(), values);
        let converted = to_categorical(&series, 10).unwrap();
        let out = strings(&converted.series);

        assert_eq!(out[0], Some("c0".to_string()));
        assert_eq!(out[20], Some("Other".to_string()));
        assert_eq!(out[21], Some("Other".to_string()));
        assert_eq!(out[22], None);
        assert_eq!(converted.affected, 2);
    }

    #[test]
    fn test_to_categorical_first_seen_tie_break() {
        let series = Series::new("cat".into(), &["b", "a", "c", "a", "b", "c"]);
        let converted = to_categorical(&series, 2).unwrap();
        assert_eq!(
            strings(&converted.series),
            vec![
                Some("b".to_string()),
                Some("a".to_string()),
                Some("Other".to_string()),
                Some("a".to_string()),
                Some("b".to_string()),
                Some("Other".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_categorical_keeps_dtype_without_bucketing() {
        let series = Series::new("grade".into(), &[Some(1i64), Some(2), Some(2), None, Some(30)]);
        let converted = to_categorical(&series, 10).unwrap();
        assert_eq!(converted.series.dtype(), &DataType::Int64);
        assert_eq!(converted.affected, 0);
        assert!(converted.series.equals_missing(&series));
    }
}
