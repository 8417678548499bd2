//! Report generation module.
//!
//! Use [`QualityReport`] to produce one report suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use quality_engine::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report("data/train.csv", None, &run, 80.0);
//! println!("{}", report.to_json()?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"));
//! generator.write_report_to_file(&report, "train")?;
//! ```

mod generator;

pub use generator::{QualityReport, ReportGenerator};
