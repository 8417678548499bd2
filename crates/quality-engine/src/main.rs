//! CLI entry point for the data quality engine.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use quality_engine::loader::load_table;
use quality_engine::{
    Metric, OutlierMethod, QualityConfigFile, QualityEngine, QualityReport, ReportGenerator,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Keep values as parsed
    None,
    /// Clamp values to the 5th/95th percentiles
    Cap,
    /// Replace the 5% tails with the nearest retained value
    Winsorize,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::None => OutlierMethod::None,
            CliOutlierMethod::Cap => OutlierMethod::Cap,
            CliOutlierMethod::Winsorize => OutlierMethod::Winsorize,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Column-level data quality scoring",
    long_about = "Scores every column of a CSV file on completeness, uniqueness, validity,\n\
                  timeliness, consistency, accuracy and reliability.\n\n\
                  EXAMPLES:\n  \
                  # Score a file with default settings\n  \
                  quality-engine -i data.csv\n\n  \
                  # Parse dates and numbers first, capping outliers\n  \
                  quality-engine -i data.csv --date-columns created --numeric-columns price --outlier-method cap\n\n  \
                  # Compare against a reference dataset\n  \
                  quality-engine -i data.csv --reference truth.csv --default-tolerance 0.01\n\n  \
                  # Machine-readable output\n  \
                  quality-engine -i data.csv --json | jq .overall_score"
)]
struct Args {
    /// Path to the CSV file to score
    #[arg(short, long)]
    input: String,

    /// Reference CSV file for accuracy
    ///
    /// Columns are compared with the same-named column unless mapped
    /// with --reference-column
    #[arg(long)]
    reference: Option<String>,

    /// JSON configuration file
    ///
    /// Command line options are applied on top of the file
    #[arg(long)]
    config: Option<String>,

    /// Columns to parse as dates (comma-separated)
    #[arg(long, value_delimiter = ',')]
    date_columns: Vec<String>,

    /// Columns to parse as numbers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    numeric_columns: Vec<String>,

    /// Columns to trim and lower-case (comma-separated)
    #[arg(long, value_delimiter = ',')]
    text_columns: Vec<String>,

    /// Columns to bucket into their most frequent values (comma-separated)
    #[arg(long, value_delimiter = ',')]
    categorical_columns: Vec<String>,

    /// Date format for a column, as column=FORMAT (chrono syntax, repeatable)
    #[arg(long, value_parser = parse_key_value)]
    date_format: Vec<(String, String)>,

    /// Outlier treatment for numeric columns
    #[arg(long, value_enum)]
    outlier_method: Option<CliOutlierMethod>,

    /// Number of categories kept per categorical column
    #[arg(long)]
    top_categories: Option<usize>,

    /// Dates before this are stale (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    ///
    /// Defaults to now
    #[arg(long)]
    threshold_date: Option<String>,

    /// Reference column for accuracy, as column=reference (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    reference_column: Vec<(String, String)>,

    /// Numeric accuracy tolerance, as column=value (repeatable)
    #[arg(long, value_parser = parse_tolerance)]
    tolerance: Vec<(String, f64)>,

    /// Tolerance for numeric columns without their own
    #[arg(long)]
    default_tolerance: Option<f64>,

    /// Flag rows where column > other, as column=other (repeatable)
    #[arg(long, value_parser = parse_key_value)]
    consistency: Vec<(String, String)>,

    /// Minimum score counted as passing in metric summaries
    #[arg(long)]
    pass_threshold: Option<f64>,

    /// Output directory for reports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the report.
    /// Useful for piping to other tools: `... --json | jq .overall_score`
    #[arg(long)]
    json: bool,

    /// Write the JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_quality_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Parse a `key=value` pair.
fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_tolerance(s: &str) -> std::result::Result<(String, f64), String> {
    let (column, value) = parse_key_value(s)?;
    let value = value
        .parse::<f64>()
        .map_err(|e| format!("invalid tolerance '{}': {}", value, e))?;
    Ok((column, value))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (disabled if --json is set)
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let file_config = load_config(&args)?;

    info!("Loading dataset from: {}", args.input);
    let data = load_table(&args.input)?;
    if data.width() == 0 {
        return Err(anyhow!("Input file has no columns: {}", args.input));
    }
    warn_unknown_columns(&file_config, &data);

    let reference = match &args.reference {
        Some(path) => {
            info!("Loading reference dataset from: {}", path);
            Some(load_table(path)?)
        }
        None => None,
    };

    let scoring = file_config
        .into_scoring_config()
        .map_err(|e| anyhow!("Configuration error: {}", e))?;
    let pass_threshold = scoring.pass_threshold;

    let mut builder = QualityEngine::builder()
        .preprocess(file_config.preprocess.clone())
        .scoring(scoring);
    if let Some(table) = reference {
        builder = builder.reference_table(table);
    }

    let run = builder
        .build()
        .and_then(|engine| engine.run(&data))
        .map_err(|e| {
            if e.is_configuration_error() {
                error!("Configuration error: {}", e);
                anyhow!("Configuration error: {}", e)
            } else {
                error!("Quality run failed: {}", e);
                anyhow!("Quality run failed: {}", e)
            }
        })?;

    let report =
        ReportGenerator::build_report(&args.input, args.reference.as_deref(), &run, pass_threshold);

    // Handle JSON output to stdout
    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    if args.emit_report {
        let input_stem = extract_file_stem(&args.input);
        let generator = ReportGenerator::new(PathBuf::from(&args.output));
        let report_path = generator.write_report_to_file(&report, &input_stem)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report);

    Ok(())
}

/// Read the configuration file, if any, and apply command line options on top.
fn load_config(args: &Args) -> Result<QualityConfigFile> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            QualityConfigFile::from_path(path)
                .map_err(|e| anyhow!("Failed to read configuration {}: {}", path, e))?
        }
        None => QualityConfigFile::default(),
    };

    let preprocess = &mut config.preprocess;
    preprocess.date_columns.extend(args.date_columns.iter().cloned());
    preprocess.numeric_columns.extend(args.numeric_columns.iter().cloned());
    preprocess.text_columns.extend(args.text_columns.iter().cloned());
    preprocess
        .categorical_columns
        .extend(args.categorical_columns.iter().cloned());
    preprocess.date_formats.extend(args.date_format.iter().cloned());
    if let Some(method) = args.outlier_method {
        preprocess.outlier_method = method.into();
    }
    if let Some(n) = args.top_categories {
        preprocess.top_categories = n;
    }
    preprocess
        .validate()
        .map_err(|e| anyhow!("Configuration error: {}", e))?;

    if let Some(date) = &args.threshold_date {
        config.threshold_date = Some(date.clone());
    }
    config
        .reference_columns
        .extend(args.reference_column.iter().cloned());
    config.tolerances.extend(args.tolerance.iter().cloned());
    if let Some(tolerance) = args.default_tolerance {
        config.default_tolerance = Some(tolerance);
    }
    config.consistency.extend(args.consistency.iter().cloned());
    if let Some(threshold) = args.pass_threshold {
        config.pass_threshold = Some(threshold);
    }

    Ok(config)
}

/// Warn about configured columns that the input table does not have.
fn warn_unknown_columns(config: &QualityConfigFile, data: &polars::prelude::DataFrame) {
    let names = data.get_column_names();
    let mut unknown: Vec<&str> = config
        .mentioned_columns()
        .into_iter()
        .filter(|c| !names.iter().any(|n| n.as_str() == *c))
        .collect();
    unknown.sort_unstable();
    if !unknown.is_empty() {
        warn!("Configured columns not in input: {}", unknown.join(", "));
    }
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a human-readable summary of the quality scores.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &QualityReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("DATA QUALITY REPORT");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, report.shape.0, report.shape.1
    );
    if let Some(ref reference) = report.reference_file {
        println!("Reference: {}", reference);
    }
    println!("Duplicate rows: {}", report.duplicate_rows);
    println!("Duration: {}ms", report.duration_ms);
    println!();

    println!("Overall Score: {:.1}", report.overall_score);
    println!();

    // Score matrix
    println!(
        "{:<20} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "Column", "Compl", "Uniq", "Valid", "Timely", "Consist", "Accur", "Reliab"
    );
    println!("{}", "-".repeat(78));
    for row in report.matrix.rows() {
        let scores: Vec<String> = Metric::ALL
            .iter()
            .map(|m| format!("{:>7.1}", row.get(*m)))
            .collect();
        println!("{:<20} {}", truncate_str(&row.column, 19), scores.join(" "));
    }
    println!();

    // Pass rates
    println!("Pass Rates (score >= {:.0}):", report.pass_threshold);
    for summary in &report.summaries {
        println!(
            "  {:<14} {:>5.1}% of columns",
            summary.metric.as_str(),
            summary.passing_percentage
        );
    }
    println!();

    let weak = report.weak_columns(report.pass_threshold);
    if !weak.is_empty() {
        println!("Columns below threshold: {}", weak.join(", "));
        println!();
    }

    if !report.preprocessing_steps.is_empty() {
        println!("Preprocessing:");
        for step in &report.preprocessing_steps {
            println!("  - {}", step);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the JSON report");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("created=%d/%m/%Y").unwrap(),
            ("created".to_string(), "%d/%m/%Y".to_string())
        );
        assert!(parse_key_value("created").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_tolerance() {
        assert_eq!(
            parse_tolerance("price=0.5").unwrap(),
            ("price".to_string(), 0.5)
        );
        assert!(parse_tolerance("price=abc").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "quality-engine",
            "-i",
            "data.csv",
            "--numeric-columns",
            "price,qty",
            "--outlier-method",
            "winsorize",
            "--tolerance",
            "price=0.5",
            "--pass-threshold",
            "90",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.preprocess.numeric_columns, vec!["price", "qty"]);
        assert_eq!(config.preprocess.outlier_method, OutlierMethod::Winsorize);
        assert_eq!(config.tolerances.get("price"), Some(&0.5));
        assert_eq!(config.pass_threshold, Some(90.0));
    }

    #[test]
    fn test_extract_file_stem() {
        assert_eq!(extract_file_stem("data/train.csv"), "train");
        assert_eq!(truncate_str("a_very_long_column_name_here", 10), "a_very_...");
    }
}
