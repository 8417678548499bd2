use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Cells
// ============================================================================

/// A single typed cell value.
///
/// Validators, consistency rules and exact-match accuracy work on cells
/// rather than on raw Polars values so their contracts do not depend on
/// the physical dtype of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Bool(bool),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Exact equality where null never matches anything, itself included.
    pub fn matches(&self, other: &Cell) -> bool {
        !self.is_null() && !other.is_null() && self == other
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Date(d) => write!(f, "{}", d),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// The seven quality dimensions scored for every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    Completeness,
    Uniqueness,
    Validity,
    Timeliness,
    Consistency,
    Accuracy,
    Reliability,
}

impl Metric {
    /// All metrics in matrix column order.
    pub const ALL: [Metric; 7] = [
        Metric::Completeness,
        Metric::Uniqueness,
        Metric::Validity,
        Metric::Timeliness,
        Metric::Consistency,
        Metric::Accuracy,
        Metric::Reliability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Completeness => "Completeness",
            Metric::Uniqueness => "Uniqueness",
            Metric::Validity => "Validity",
            Metric::Timeliness => "Timeliness",
            Metric::Consistency => "Consistency",
            Metric::Accuracy => "Accuracy",
            Metric::Reliability => "Reliability",
        }
    }

    /// Score substituted when a calculator fails on a data error.
    pub fn default_score(&self) -> f64 {
        match self {
            Metric::Completeness | Metric::Uniqueness => 0.0,
            _ => 100.0,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// A recovered anomaly: something degraded a column or metric but the run continued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWarning {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    pub message: String,
}

impl QualityWarning {
    pub fn column(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            metric: None,
            message: message.into(),
        }
    }

    pub fn metric(column: impl Into<String>, metric: Metric, message: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            metric: Some(metric),
            message: message.into(),
        }
    }
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.metric {
            Some(metric) => write!(f, "[{}/{}] {}", self.column, metric, self.message),
            None => write!(f, "[{}] {}", self.column, self.message),
        }
    }
}

// ============================================================================
// Score Matrix
// ============================================================================

/// Scores of one column across all seven metrics, each in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScores {
    pub column: String,
    pub completeness: f64,
    pub uniqueness: f64,
    pub validity: f64,
    pub timeliness: f64,
    pub consistency: f64,
    pub accuracy: f64,
    pub reliability: f64,
}

impl ColumnScores {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Completeness => self.completeness,
            Metric::Uniqueness => self.uniqueness,
            Metric::Validity => self.validity,
            Metric::Timeliness => self.timeliness,
            Metric::Consistency => self.consistency,
            Metric::Accuracy => self.accuracy,
            Metric::Reliability => self.reliability,
        }
    }

    /// Metric/score pairs in matrix column order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.iter().map(move |m| (*m, self.get(*m)))
    }

    pub fn mean(&self) -> f64 {
        self.iter().map(|(_, score)| score).sum::<f64>() / Metric::ALL.len() as f64
    }
}

/// Column × metric score matrix, one row per input column in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMatrix {
    rows: Vec<ColumnScores>,
}

impl ScoreMatrix {
    pub fn new(rows: Vec<ColumnScores>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ColumnScores] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnScores> {
        self.rows.iter().find(|row| row.column == name)
    }

    pub fn score(&self, column: &str, metric: Metric) -> Option<f64> {
        self.column(column).map(|row| row.get(metric))
    }

    /// Flat mean of every cell in the matrix; 0 for an empty matrix.
    pub fn overall_score(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .rows
            .iter()
            .flat_map(|row| row.iter().map(|(_, score)| score))
            .sum();
        total / (self.rows.len() * Metric::ALL.len()) as f64
    }

    /// Pass-rate summary of each metric against `threshold`.
    pub fn metric_summaries(&self, threshold: f64) -> Vec<MetricSummary> {
        Metric::ALL
            .iter()
            .map(|metric| {
                let passing_columns: Vec<String> = self
                    .rows
                    .iter()
                    .filter(|row| row.get(*metric) >= threshold)
                    .map(|row| row.column.clone())
                    .collect();
                let passing_percentage = if self.rows.is_empty() {
                    0.0
                } else {
                    passing_columns.len() as f64 / self.rows.len() as f64 * 100.0
                };
                MetricSummary {
                    metric: *metric,
                    threshold,
                    passing_columns,
                    passing_percentage,
                }
            })
            .collect()
    }
}

/// Which columns meet a pass threshold for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub threshold: f64,
    pub passing_columns: Vec<String>,
    pub passing_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perfect(name: &str) -> ColumnScores {
        ColumnScores {
            column: name.to_string(),
            completeness: 100.0,
            uniqueness: 100.0,
            validity: 100.0,
            timeliness: 100.0,
            consistency: 100.0,
            accuracy: 100.0,
            reliability: 100.0,
        }
    }

    #[test]
    fn test_overall_score_all_perfect() {
        let matrix = ScoreMatrix::new(vec![perfect("a"), perfect("b"), perfect("c")]);
        assert_eq!(matrix.overall_score(), 100.0);
    }

    #[test]
    fn test_overall_score_single_zero_cell() {
        let mut degraded = perfect("b");
        degraded.validity = 0.0;
        let matrix = ScoreMatrix::new(vec![perfect("a"), degraded, perfect("c")]);

        let expected = 100.0 - 100.0 / (3.0 * 7.0);
        assert!((matrix.overall_score() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_overall_score_empty_matrix() {
        assert_eq!(ScoreMatrix::default().overall_score(), 0.0);
    }

    #[test]
    fn test_metric_summaries_threshold_inclusive() {
        let mut low = perfect("b");
        low.completeness = 79.9;
        let mut edge = perfect("c");
        edge.completeness = 80.0;
        let matrix = ScoreMatrix::new(vec![perfect("a"), low, edge]);

        let summaries = matrix.metric_summaries(80.0);
        assert_eq!(summaries.len(), 7);

        let completeness = &summaries[0];
        assert_eq!(completeness.metric, Metric::Completeness);
        assert_eq!(completeness.passing_columns, vec!["a", "c"]);
        assert!((completeness.passing_percentage - 200.0 / 3.0).abs() < 1e-9);

        let uniqueness = &summaries[1];
        assert_eq!(uniqueness.passing_percentage, 100.0);
    }

    #[test]
    fn test_metric_summaries_empty_matrix() {
        let summaries = ScoreMatrix::default().metric_summaries(80.0);
        assert!(summaries.iter().all(|s| s.passing_percentage == 0.0));
    }

    #[test]
    fn test_matrix_lookup() {
        let matrix = ScoreMatrix::new(vec![perfect("id")]);
        assert_eq!(matrix.score("id", Metric::Accuracy), Some(100.0));
        assert_eq!(matrix.score("missing", Metric::Accuracy), None);
    }

    #[test]
    fn test_cell_matches_ignores_nulls() {
        assert!(Cell::Text("a".into()).matches(&Cell::Text("a".into())));
        assert!(!Cell::Null.matches(&Cell::Null));
        assert!(!Cell::Number(1.0).matches(&Cell::Text("1".into())));
    }

    #[test]
    fn test_matrix_serializes_as_rows() {
        let matrix = ScoreMatrix::new(vec![perfect("id")]);
        let json = serde_json::to_value(&matrix).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["column"], "id");
        assert_eq!(json[0]["reliability"], 100.0);
    }
}
