//! Data Quality Engine Library
//!
//! Column-level data quality scoring for tabular datasets, built on Polars.
//!
//! # Overview
//!
//! The library scores every column of a table on seven metrics, each in
//! [0, 100]:
//!
//! - **Completeness**: share of non-null cells
//! - **Uniqueness**: distinct non-null values relative to the row count
//! - **Validity**: share of cells accepted by the column's validator
//! - **Timeliness**: share of dates on or after a threshold date
//! - **Consistency**: share of rows that do not violate a cross-column rule
//! - **Accuracy**: share of values matching a reference column
//! - **Reliability**: share of numeric values inside the IQR fences
//!
//! The scores form a [`ScoreMatrix`] that reduces to an overall score and a
//! per-metric pass-rate summary. An optional [`Preprocessor`] first retypes
//! declared columns (dates, numbers, text, categories) and treats outliers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quality_engine::{OutlierMethod, PreprocessConfig, QualityEngine, ScoringConfig};
//! use quality_engine::loader::load_table;
//!
//! let df = load_table("data.csv")?;
//!
//! let preprocess = PreprocessConfig::builder()
//!     .date_columns(["created_at"])
//!     .numeric_columns(["price"])
//!     .outlier_method(OutlierMethod::Winsorize)
//!     .build()?;
//!
//! let scoring = ScoringConfig::builder()
//!     .threshold_date(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().into())
//!     .consistency_against("created_at", "shipped_at")
//!     .build()?;
//!
//! let run = QualityEngine::builder()
//!     .preprocess(preprocess)
//!     .scoring(scoring)
//!     .build()?
//!     .run(&df)?;
//!
//! println!("Overall quality: {:.1}", run.scores.overall_score);
//! for row in run.scores.matrix.rows() {
//!     println!("{}: completeness {:.1}", row.column, row.completeness);
//! }
//! ```
//!
//! # Scoring without preprocessing
//!
//! ```rust,ignore
//! use quality_engine::{ScoringConfig, calculate_scores};
//!
//! let scores = calculate_scores(&df, &ScoringConfig::default())?;
//! ```
//!
//! # Custom rules
//!
//! Validators implement [`Validator`] and are selected by column name through
//! a [`ValidatorRegistry`]. Consistency rules implement [`ConsistencyRule`];
//! any closure over a [`RowView`] is a rule:
//!
//! ```rust,ignore
//! let scoring = ScoringConfig::builder()
//!     .validator(ColumnMatcher::Contains("phone".into()), PatternValidator::new(r"^\+?[0-9 ]+$")?)
//!     .consistency_rule("discount", |row: &RowView<'_>| {
//!         match (row.number("discount"), row.number("price")) {
//!             (Some(d), Some(p)) => d <= p,
//!             _ => true,
//!         }
//!     })
//!     .build()?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod preprocess;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ColumnKind, ConfigValidationError, OutlierMethod, PreprocessConfig, PreprocessConfigBuilder,
    QualityConfigFile, ScoringConfig, ScoringConfigBuilder, ValidatorRule, ValidatorSpec,
};
pub use engine::{QualityEngine, QualityEngineBuilder, QualityRun};
pub use error::{QualityError, Result, ResultExt};
pub use metrics::{
    ColumnMatcher, ConsistencyCheck, ConsistencyRule, EmailValidator, PatternValidator,
    RangeValidator, RowView, Validator, ValidatorRegistry,
};
pub use preprocess::{DeclaredColumn, PreprocessOutcome, Preprocessor};
pub use profiler::{ColumnStatistics, duplicate_rows, profile_columns};
pub use quality::{QualityScores, ScoreAggregator, calculate_scores};
pub use reporting::{QualityReport, ReportGenerator};
pub use types::{Cell, ColumnScores, Metric, MetricSummary, QualityWarning, ScoreMatrix};
