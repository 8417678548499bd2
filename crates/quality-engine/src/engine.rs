//! End-to-end orchestration: preprocess, score, profile.

use crate::config::{PreprocessConfig, ScoringConfig};
use crate::error::{Result, ResultExt};
use crate::preprocess::{DeclaredColumn, Preprocessor};
use crate::profiler::{self, ColumnStatistics};
use crate::quality::{QualityScores, ScoreAggregator};
use crate::types::QualityWarning;
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Output of one [`QualityEngine::run`].
#[derive(Debug, Clone)]
pub struct QualityRun {
    /// The table that was scored.
    pub table: DataFrame,
    pub kinds: Vec<DeclaredColumn>,
    pub steps: Vec<String>,
    pub scores: QualityScores,
    /// Statistics of the input table, before preprocessing.
    pub statistics: Vec<ColumnStatistics>,
    pub duplicate_rows: usize,
    /// Preprocessing warnings followed by scoring warnings.
    pub warnings: Vec<QualityWarning>,
    pub duration_ms: u64,
}

/// Preprocessor and score aggregator wired together.
///
/// # Example
///
/// ```rust,ignore
/// use quality_engine::{QualityEngine, PreprocessConfig, ScoringConfig, OutlierMethod};
///
/// let run = QualityEngine::builder()
///     .preprocess(
///         PreprocessConfig::builder()
///             .numeric_columns(["score"])
///             .outlier_method(OutlierMethod::Cap)
///             .build()?,
///     )
///     .scoring(ScoringConfig::default())
///     .build()?
///     .run(&df)?;
///
/// println!("Overall quality: {:.1}", run.scores.overall_score);
/// ```
#[derive(Debug, Clone)]
pub struct QualityEngine {
    preprocessor: Preprocessor,
    scoring: ScoringConfig,
    reference: Option<DataFrame>,
}

// Runs may be moved onto worker threads
static_assertions::assert_impl_all!(QualityEngine: Send, Sync);

impl QualityEngine {
    /// Create a new engine builder.
    pub fn builder() -> QualityEngineBuilder {
        QualityEngineBuilder::default()
    }

    pub fn scoring_config(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn preprocess_config(&self) -> &PreprocessConfig {
        self.preprocessor.config()
    }

    /// Preprocess `df` (and the reference table, if any), score it and
    /// collect column statistics.
    pub fn run(&self, df: &DataFrame) -> Result<QualityRun> {
        let start = Instant::now();
        info!("Running quality engine on {} rows x {} columns", df.height(), df.width());

        let statistics = profiler::profile_columns(df).context("Profiling input table")?;
        let duplicate_rows = profiler::duplicate_rows(df).context("Counting duplicate rows")?;

        let outcome = self.preprocessor.run(df)?;
        let mut warnings = outcome.warnings;

        let reference = match &self.reference {
            Some(table) => {
                let processed = self.preprocessor.run(table)?;
                warnings.extend(processed.warnings.into_iter().map(|mut w| {
                    w.message = format!("reference table: {}", w.message);
                    w
                }));
                Some(processed.table)
            }
            None => None,
        };

        let mut aggregator = ScoreAggregator::new(&self.scoring);
        if let Some(table) = &reference {
            aggregator = aggregator.with_reference_table(table);
        }
        let scores = aggregator.score(&outcome.table)?;
        warnings.extend(scores.warnings.iter().cloned());

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!("Quality run finished in {}ms", duration_ms);

        Ok(QualityRun {
            table: outcome.table,
            kinds: outcome.kinds,
            steps: outcome.steps,
            scores,
            statistics,
            duplicate_rows,
            warnings,
            duration_ms,
        })
    }
}

/// Builder for [`QualityEngine`].
#[derive(Debug, Default)]
pub struct QualityEngineBuilder {
    preprocess: Option<PreprocessConfig>,
    scoring: Option<ScoringConfig>,
    reference: Option<DataFrame>,
}

static_assertions::assert_impl_all!(QualityEngineBuilder: Send);

impl QualityEngineBuilder {
    /// Set the preprocessing configuration. Default: no retyping.
    pub fn preprocess(mut self, config: PreprocessConfig) -> Self {
        self.preprocess = Some(config);
        self
    }

    /// Set the scoring configuration.
    pub fn scoring(mut self, config: ScoringConfig) -> Self {
        self.scoring = Some(config);
        self
    }

    /// Set a reference dataset for accuracy.
    pub fn reference_table(mut self, table: DataFrame) -> Self {
        self.reference = Some(table);
        self
    }

    /// Build the engine, validating both configurations.
    pub fn build(self) -> Result<QualityEngine> {
        let preprocess = self.preprocess.unwrap_or_default();
        preprocess.validate()?;
        let scoring = self.scoring.unwrap_or_default();
        scoring.validate()?;

        Ok(QualityEngine {
            preprocessor: Preprocessor::new(preprocess),
            scoring,
            reference: self.reference,
        })
    }
}
