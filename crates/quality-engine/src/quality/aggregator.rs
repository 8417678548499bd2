//! Runs every metric over every column and reduces the results.

use crate::config::ScoringConfig;
use crate::error::{QualityError, Result};
use crate::metrics::{
    accuracy, completeness, consistency, reliability, timeliness, uniqueness, validity,
};
use crate::types::{ColumnScores, Metric, MetricSummary, QualityWarning, ScoreMatrix};
use crate::utils::is_numeric_dtype;
use chrono::{Local, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Everything one scoring run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub matrix: ScoreMatrix,
    pub overall_score: f64,
    pub summaries: Vec<MetricSummary>,
    pub warnings: Vec<QualityWarning>,
}

/// Where the accuracy reference of a column comes from.
enum Reference<'a> {
    /// No reference configured: accuracy is assumed.
    None,
    Found(&'a Series),
    /// Configured but absent from both tables.
    Unresolved(&'a str),
}

/// Scores tables against a [`ScoringConfig`].
///
/// # Example
///
/// ```rust,ignore
/// let scores = ScoreAggregator::new(&config)
///     .with_reference_table(&reference)
///     .score(&df)?;
/// println!("Overall: {:.1}", scores.overall_score);
/// ```
pub struct ScoreAggregator<'a> {
    config: &'a ScoringConfig,
    reference: Option<&'a DataFrame>,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// Look up reference columns in `table` before the scored table.
    ///
    /// Columns without an explicit mapping use the same-named column here.
    pub fn with_reference_table(mut self, table: &'a DataFrame) -> Self {
        self.reference = Some(table);
        self
    }

    /// Compute the score matrix, overall score and pass-rate summaries.
    ///
    /// Configuration problems are reported before any metric runs. Data
    /// problems in a single column/metric become warnings and the metric's
    /// default score.
    pub fn score(&self, df: &DataFrame) -> Result<QualityScores> {
        self.validate(df)?;

        let threshold = self
            .config
            .threshold_date
            .unwrap_or_else(|| Local::now().naive_local());
        debug!("Scoring {} columns, threshold date {}", df.width(), threshold);

        let mut warnings = Vec::new();
        let mut rows = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            rows.push(self.score_column(
                df,
                column.as_materialized_series(),
                threshold,
                &mut warnings,
            )?);
        }

        let matrix = ScoreMatrix::new(rows);
        let overall_score = matrix.overall_score();
        let summaries = matrix.metric_summaries(self.config.pass_threshold);

        info!(
            "Scored {} columns: overall {:.2}, {} warnings",
            matrix.len(),
            overall_score,
            warnings.len()
        );

        Ok(QualityScores {
            matrix,
            overall_score,
            summaries,
            warnings,
        })
    }

    fn validate(&self, df: &DataFrame) -> Result<()> {
        self.config.validate()?;

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().as_str();
            // empty columns score 0 for accuracy without needing a tolerance
            if is_numeric_dtype(series.dtype())
                && !series.is_empty()
                && matches!(self.resolve_reference(df, name), Reference::Found(r) if !r.is_empty())
                && self.config.tolerance_for(name).is_none()
            {
                return Err(QualityError::MissingTolerance {
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve_reference<'b>(&'b self, df: &'b DataFrame, column: &str) -> Reference<'b> {
        let lookup = |table: &'b DataFrame, name: &str| {
            table
                .column(name)
                .ok()
                .map(|c| c.as_materialized_series())
        };

        match self.config.reference_columns.get(column) {
            Some(name) => self
                .reference
                .and_then(|table| lookup(table, name.as_str()))
                .or_else(|| lookup(df, name.as_str()))
                .map_or(Reference::Unresolved(name.as_str()), Reference::Found),
            None => self
                .reference
                .and_then(|table| lookup(table, column))
                .map_or(Reference::None, Reference::Found),
        }
    }

    fn score_column(
        &self,
        df: &DataFrame,
        series: &Series,
        threshold: NaiveDateTime,
        warnings: &mut Vec<QualityWarning>,
    ) -> Result<ColumnScores> {
        let name = series.name().to_string();
        let validator = self.config.validators.resolve(&name);

        let reference = match self.resolve_reference(df, &name) {
            Reference::None => None,
            Reference::Found(series) => Some(series),
            Reference::Unresolved(missing) => {
                warn!("Reference column '{}' for '{}' not found", missing, name);
                warnings.push(QualityWarning::metric(
                    &name,
                    Metric::Accuracy,
                    format!("reference column '{}' not found; accuracy assumed", missing),
                ));
                None
            }
        };

        let mut recorded = |metric: Metric, result: Result<f64>| -> Result<f64> {
            match result {
                Ok(score) => Ok(score.clamp(0.0, 100.0)),
                Err(e) if e.is_configuration_error() => Err(e),
                Err(e) => {
                    let fallback = metric.default_score();
                    warn!("{} of '{}' defaulted to {}: {}", metric, name, fallback, e);
                    warnings.push(QualityWarning::metric(&name, metric, e.to_string()));
                    Ok(fallback)
                }
            }
        };

        let completeness = recorded(Metric::Completeness, Ok(completeness(series)))?;
        let uniqueness = recorded(Metric::Uniqueness, uniqueness(series))?;
        let validity = recorded(Metric::Validity, validity(series, validator))?;
        let timeliness = recorded(Metric::Timeliness, timeliness(series, Some(threshold)))?;
        let accuracy = recorded(
            Metric::Accuracy,
            accuracy(series, reference, self.config.tolerance_for(&name)),
        )?;
        let reliability = recorded(Metric::Reliability, reliability(series))?;

        let mut consistency_warnings = Vec::new();
        let consistency_result = consistency(
            df,
            &name,
            self.config.consistency.get(&name),
            &mut consistency_warnings,
        );
        let consistency = recorded(Metric::Consistency, consistency_result)?;
        warnings.extend(consistency_warnings);

        Ok(ColumnScores {
            column: name,
            completeness,
            uniqueness,
            validity,
            timeliness,
            consistency,
            accuracy,
            reliability,
        })
    }
}

/// Score `df` with `config` and no reference table.
pub fn calculate_scores(df: &DataFrame, config: &ScoringConfig) -> Result<QualityScores> {
    ScoreAggregator::new(config).score(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RowView;
    use crate::utils::{datetime_series, parse_date_auto};

    fn config() -> ScoringConfig {
        ScoringConfig::builder()
            .threshold_date(parse_date_auto("2024-01-01").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_matrix_shape_and_defaults() {
        let df = df![
            "id" => [1i64, 2, 3, 4],
            "name" => ["a", "b", "c", "d"],
        ]
        .unwrap();
        let scores = calculate_scores(&df, &config()).unwrap();

        assert_eq!(scores.matrix.len(), 2);
        let id = scores.matrix.column("id").unwrap();
        assert_eq!(id.completeness, 100.0);
        assert_eq!(id.uniqueness, 100.0);
        assert_eq!(id.validity, 100.0);
        assert_eq!(id.timeliness, 100.0);
        assert_eq!(id.consistency, 100.0);
        assert_eq!(id.accuracy, 100.0);
        assert_eq!(id.reliability, 100.0);
        assert_eq!(scores.overall_score, 100.0);
        assert!(scores.warnings.is_empty());
        assert_eq!(scores.summaries.len(), 7);
    }

    #[test]
    fn test_email_validity_through_registry() {
        let df = df![
            "email" => [Some("a@b.com"), Some("bad"), Some("c@d.com"), None],
        ]
        .unwrap();
        let scores = calculate_scores(&df, &config()).unwrap();
        assert_eq!(scores.matrix.score("email", Metric::Validity), Some(50.0));
        assert_eq!(scores.matrix.score("email", Metric::Completeness), Some(75.0));
    }

    #[test]
    fn test_threshold_defaults_to_now() {
        let past = parse_date_auto("2000-01-01");
        let series = datetime_series("d".into(), &[past]).unwrap();
        let df = DataFrame::new(vec![series.into_column()]).unwrap();

        let scores = calculate_scores(&df, &ScoringConfig::default()).unwrap();
        assert_eq!(scores.matrix.score("d", Metric::Timeliness), Some(0.0));
    }

    #[test]
    fn test_reference_within_table() {
        let df = df![
            "price" => [10.0, 20.0, 30.0, 40.0],
            "list" => [10.1, 25.0, 30.0, 40.4],
        ]
        .unwrap();
        let config = ScoringConfig::builder()
            .reference_column("price", "list")
            .tolerance("price", 0.5)
            .build()
            .unwrap();
        let scores = calculate_scores(&df, &config).unwrap();
        assert_eq!(scores.matrix.score("price", Metric::Accuracy), Some(75.0));
        assert_eq!(scores.matrix.score("list", Metric::Accuracy), Some(100.0));
    }

    #[test]
    fn test_missing_tolerance_fails_before_scoring() {
        let df = df!["price" => [1.0, 2.0], "list" => [1.0, 2.0]].unwrap();
        let config = ScoringConfig::builder()
            .reference_column("price", "list")
            .build()
            .unwrap();
        let err = calculate_scores(&df, &config).unwrap_err();
        assert!(matches!(err, QualityError::MissingTolerance { ref column } if column == "price"));
    }

    #[test]
    fn test_reference_table_same_name() {
        let df = df![
            "code" => ["a", "b", "c", "d"],
            "qty" => [1i64, 2, 3, 4],
        ]
        .unwrap();
        let reference = df![
            "code" => ["a", "x", "c", "d"],
            "qty" => [1i64, 2, 9, 4],
        ]
        .unwrap();
        let config = ScoringConfig::builder()
            .default_tolerance(0.0)
            .build()
            .unwrap();

        let scores = ScoreAggregator::new(&config)
            .with_reference_table(&reference)
            .score(&df)
            .unwrap();
        assert_eq!(scores.matrix.score("code", Metric::Accuracy), Some(75.0));
        assert_eq!(scores.matrix.score("qty", Metric::Accuracy), Some(75.0));
    }

    #[test]
    fn test_unresolved_reference_warns() {
        let df = df!["code" => ["a", "b"]].unwrap();
        let config = ScoringConfig::builder()
            .reference_column("code", "ghost")
            .build()
            .unwrap();
        let scores = calculate_scores(&df, &config).unwrap();
        assert_eq!(scores.matrix.score("code", Metric::Accuracy), Some(100.0));
        assert_eq!(scores.warnings.len(), 1);
        assert_eq!(scores.warnings[0].metric, Some(Metric::Accuracy));
    }

    #[test]
    fn test_consistency_missing_column_is_warning() {
        let df = df!["a" => [1i64, 2]].unwrap();
        let config = ScoringConfig::builder()
            .consistency_against("a", "ghost")
            .build()
            .unwrap();
        let scores = calculate_scores(&df, &config).unwrap();
        assert_eq!(scores.matrix.score("a", Metric::Consistency), Some(100.0));
        assert_eq!(scores.warnings.len(), 1);
    }

    #[test]
    fn test_consistency_rule_through_config() {
        let df = df!["lo" => [1i64, 5, 2, 3], "hi" => [2i64, 4, 3, 4]].unwrap();
        let config = ScoringConfig::builder()
            .consistency_rule("lo", |row: &RowView<'_>| {
                match (row.number("lo"), row.number("hi")) {
                    (Some(lo), Some(hi)) => lo < hi,
                    _ => true,
                }
            })
            .build()
            .unwrap();
        let scores = calculate_scores(&df, &config).unwrap();
        assert_eq!(scores.matrix.score("lo", Metric::Consistency), Some(75.0));
    }

    #[test]
    fn test_invalid_pass_threshold_rejected() {
        let df = df!["a" => [1i64]].unwrap();
        let config = ScoringConfig {
            pass_threshold: -5.0,
            ..Default::default()
        };
        let err = calculate_scores(&df, &config).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_empty_table() {
        let df = DataFrame::empty();
        let scores = calculate_scores(&df, &config()).unwrap();
        assert!(scores.matrix.is_empty());
        assert_eq!(scores.overall_score, 0.0);
        assert!(scores.summaries.iter().all(|s| s.passing_percentage == 0.0));
    }

    #[test]
    fn test_zero_row_column() {
        let df = df!["v" => Vec::<f64>::new()].unwrap();
        let scores = calculate_scores(&df, &config()).unwrap();
        let row = scores.matrix.column("v").unwrap();
        assert_eq!(row.completeness, 0.0);
        assert_eq!(row.uniqueness, 0.0);
        assert_eq!(row.validity, 0.0);
        assert_eq!(row.reliability, 0.0);
        assert_eq!(row.accuracy, 100.0);
    }

    #[test]
    fn test_zero_row_reference_without_tolerance() {
        let df = df!["v" => Vec::<f64>::new()].unwrap();
        let reference = df!["v" => Vec::<f64>::new()].unwrap();
        let config = config();

        let scores = ScoreAggregator::new(&config)
            .with_reference_table(&reference)
            .score(&df)
            .unwrap();
        assert_eq!(scores.matrix.score("v", Metric::Accuracy), Some(0.0));
        assert!(scores.warnings.is_empty());
    }
}
