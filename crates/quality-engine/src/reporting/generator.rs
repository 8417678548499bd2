use crate::engine::QualityRun;
use crate::preprocess::DeclaredColumn;
use crate::profiler::ColumnStatistics;
use crate::types::{MetricSummary, QualityWarning, ScoreMatrix};
use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Serializable summary of one quality run.
///
/// Used for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the reference file used for accuracy (if any)
    pub reference_file: Option<String>,
    /// Shape of the input table (rows, columns)
    pub shape: (usize, usize),
    pub duration_ms: u64,

    // Scores
    pub overall_score: f64,
    pub pass_threshold: f64,
    pub matrix: ScoreMatrix,
    pub summaries: Vec<MetricSummary>,

    // Table description
    pub duplicate_rows: usize,
    pub column_statistics: Vec<ColumnStatistics>,
    pub column_kinds: Vec<DeclaredColumn>,

    /// Preprocessing steps in the order they ran
    pub preprocessing_steps: Vec<String>,
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    /// Columns whose mean score across all metrics is below `threshold`.
    pub fn weak_columns(&self, threshold: f64) -> Vec<&str> {
        self.matrix
            .rows()
            .iter()
            .filter(|row| row.mean() < threshold)
            .map(|row| row.column.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator writing into `output_dir`.
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Build a report from a finished run.
    ///
    /// `shape` is taken from the scored table, which has the same shape as
    /// the input since preprocessing never adds or drops rows or columns.
    pub fn build_report(
        input_file: &str,
        reference_file: Option<&str>,
        run: &QualityRun,
        pass_threshold: f64,
    ) -> QualityReport {
        QualityReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            reference_file: reference_file.map(String::from),
            shape: (run.table.height(), run.table.width()),
            duration_ms: run.duration_ms,
            overall_score: run.scores.overall_score,
            pass_threshold,
            matrix: run.scores.matrix.clone(),
            summaries: run.scores.summaries.clone(),
            duplicate_rows: run.duplicate_rows,
            column_statistics: run.statistics.clone(),
            column_kinds: run.kinds.clone(),
            preprocessing_steps: run.steps.clone(),
            warnings: run.warnings.clone(),
        }
    }

    /// Write a report to a JSON file.
    ///
    /// If `report_base_name` is "train", the file will be
    /// "train_quality_report.json".
    pub fn write_report_to_file(
        &self,
        report: &QualityReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_quality_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(report.to_json()?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
