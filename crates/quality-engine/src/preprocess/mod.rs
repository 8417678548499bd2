//! Column type normalization ahead of scoring.
//!
//! The [`Preprocessor`] retypes the columns named in a [`PreprocessConfig`]
//! and returns a new table; the input table is never modified. A column that
//! fails to convert is left as it was and reported as a warning.

mod converters;
mod outliers;

use crate::config::{ColumnKind, PreprocessConfig};
use crate::error::{QualityError, Result};
use crate::types::QualityWarning;
use crate::utils::is_valid_date_format;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use converters::OTHER_CATEGORY;

/// Declared kind of one column after preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredColumn {
    pub column: String,
    pub kind: ColumnKind,
}

/// What the preprocessor produced.
#[derive(Debug, Clone)]
pub struct PreprocessOutcome {
    /// Table with converted columns replaced.
    pub table: DataFrame,
    /// Kind of every column in table order; failed conversions stay `Untyped`.
    pub kinds: Vec<DeclaredColumn>,
    /// Human-readable log of what was done.
    pub steps: Vec<String>,
    pub warnings: Vec<QualityWarning>,
}

impl PreprocessOutcome {
    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.kinds
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.kind)
    }
}

/// Applies a [`PreprocessConfig`] to tables.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Convert every configured column of `df`.
    ///
    /// Configuration conflicts fail before any column is touched. Missing
    /// columns and failed conversions become warnings.
    pub fn run(&self, df: &DataFrame) -> Result<PreprocessOutcome> {
        self.config.validate()?;

        if self.config.is_noop() {
            debug!("No columns declared for preprocessing");
            return Ok(PreprocessOutcome {
                table: df.clone(),
                kinds: untyped_kinds(df),
                steps: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let mut table = df.clone();
        let mut converted: Vec<(String, ColumnKind)> = Vec::new();
        let mut steps = Vec::new();
        let mut warnings = Vec::new();

        for (column, kind) in self.config.declared_columns() {
            let Ok(source) = table.column(column).map(|c| c.as_materialized_series().clone())
            else {
                warn!("Column '{}' declared {} but not found; skipping", column, kind);
                warnings.push(QualityWarning::column(
                    column,
                    format!("declared {} but not present in the table", kind),
                ));
                continue;
            };

            match self
                .convert(&source, kind)
                .and_then(|(series, step)| {
                    table
                        .replace(column, series)
                        .map_err(QualityError::from)?;
                    Ok(step)
                }) {
                Ok(step) => {
                    debug!("{}", step);
                    steps.push(step);
                    converted.push((column.to_string(), kind));
                }
                Err(e) => {
                    warn!("Failed to convert column '{}' to {}: {}", column, kind, e);
                    warnings.push(QualityWarning::column(column, e.to_string()));
                }
            }
        }

        let kinds = table
            .get_column_names()
            .iter()
            .map(|name| {
                let kind = converted
                    .iter()
                    .find(|(c, _)| c.as_str() == name.as_str())
                    .map_or(ColumnKind::Untyped, |(_, k)| *k);
                DeclaredColumn {
                    column: name.to_string(),
                    kind,
                }
            })
            .collect();

        info!(
            "Preprocessing complete: {} columns converted, {} warnings",
            converted.len(),
            warnings.len()
        );

        Ok(PreprocessOutcome {
            table,
            kinds,
            steps,
            warnings,
        })
    }

    fn convert(&self, series: &Series, kind: ColumnKind) -> Result<(Series, String)> {
        let name = series.name().to_string();
        let failed = |reason: anyhow::Error| QualityError::TypeConversionFailed {
            column: name.clone(),
            target_type: kind.to_string(),
            reason: reason.to_string(),
        };

        match kind {
            ColumnKind::Date => {
                let format = self.config.date_formats.get(&name).map(String::as_str);
                if let Some(fmt) = format
                    && !is_valid_date_format(fmt)
                {
                    return Err(QualityError::InvalidDateFormat {
                        column: name.clone(),
                        format: fmt.to_string(),
                    });
                }
                let out = converters::to_datetime(series, format).map_err(failed)?;
                let how = format.map_or("auto-detected format".to_string(), |f| {
                    format!("format '{}'", f)
                });
                Ok((
                    out.series,
                    format!(
                        "Parsed '{}' as dates with {} ({} unparseable values set to null)",
                        name, how, out.affected
                    ),
                ))
            }
            ColumnKind::Numeric => {
                let out = converters::to_numeric(series).map_err(failed)?;
                let (treated, changed) =
                    outliers::treat_outliers(&out.series, self.config.outlier_method)
                        .map_err(failed)?;
                let mut step = format!(
                    "Parsed '{}' as numbers ({} unparseable values set to null)",
                    name, out.affected
                );
                if changed > 0 {
                    step.push_str(&format!(
                        "; {:?} adjusted {} outliers",
                        self.config.outlier_method, changed
                    ));
                }
                Ok((treated, step))
            }
            ColumnKind::Text => {
                let out = converters::to_text(series).map_err(failed)?;
                Ok((
                    out.series,
                    format!("Normalized text in '{}' ({} values changed)", name, out.affected),
                ))
            }
            ColumnKind::Categorical => {
                let out = converters::to_categorical(series, self.config.top_categories)
                    .map_err(failed)?;
                Ok((
                    out.series,
                    format!(
                        "Kept top {} categories in '{}' ({} values bucketed into '{}')",
                        self.config.top_categories, name, out.affected, OTHER_CATEGORY
                    ),
                ))
            }
            ColumnKind::Untyped => Ok((series.clone(), format!("Left '{}' unchanged", name))),
        }
    }
}

fn untyped_kinds(df: &DataFrame) -> Vec<DeclaredColumn> {
    df.get_column_names()
        .iter()
        .map(|name| DeclaredColumn {
            column: name.to_string(),
            kind: ColumnKind::Untyped,
        })
        .collect()
}
