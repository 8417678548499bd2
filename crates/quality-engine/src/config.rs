//! Configuration types for preprocessing and scoring.
//!
//! Both configurations use the builder pattern and are validated when built.
//! [`QualityConfigFile`] is the JSON form read by the CLI.

use crate::metrics::{
    ColumnMatcher, ConsistencyCheck, ConsistencyRule, EmailValidator, PatternValidator,
    RangeValidator, Validator, ValidatorRegistry,
};
use crate::utils::parse_date_auto;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Declared kind of a column, assigned by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColumnKind {
    Date,
    Numeric,
    Text,
    Categorical,
    /// Column left with the dtype it was loaded with.
    #[default]
    Untyped,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Date => "date",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Untyped => "untyped",
        };
        f.write_str(name)
    }
}

/// Outlier treatment applied to numeric columns after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutlierMethod {
    /// Keep values as parsed
    #[default]
    None,
    /// Clamp values to the [5th, 95th] percentile range
    Cap,
    /// Replace the 5% tails with the nearest retained value
    Winsorize,
}

/// Default number of categories kept before bucketing into "Other".
pub const DEFAULT_TOP_CATEGORIES: usize = 10;

/// Default pass threshold for per-metric summaries.
pub const DEFAULT_PASS_THRESHOLD: f64 = 80.0;

// =============================================================================
// Preprocessing
// =============================================================================

/// Which columns to retype and how.
///
/// # Example
///
/// ```rust,ignore
/// use quality_engine::config::{OutlierMethod, PreprocessConfig};
///
/// let config = PreprocessConfig::builder()
///     .date_columns(["created_at"])
///     .numeric_columns(["price"])
///     .date_format("created_at", "%d/%m/%Y")
///     .outlier_method(OutlierMethod::Cap)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Columns parsed into millisecond datetimes.
    pub date_columns: Vec<String>,

    /// Columns stripped of formatting and parsed into Float64.
    pub numeric_columns: Vec<String>,

    /// Columns trimmed and lower-cased.
    pub text_columns: Vec<String>,

    /// Columns bucketed to their most frequent values.
    pub categorical_columns: Vec<String>,

    /// chrono format per date column. Columns without one are auto-detected.
    pub date_formats: HashMap<String, String>,

    /// Outlier treatment for numeric columns.
    /// Default: None
    pub outlier_method: OutlierMethod,

    /// Number of categories kept per categorical column.
    /// Default: 10
    pub top_categories: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            date_columns: Vec::new(),
            numeric_columns: Vec::new(),
            text_columns: Vec::new(),
            categorical_columns: Vec::new(),
            date_formats: HashMap::new(),
            outlier_method: OutlierMethod::default(),
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

impl PreprocessConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Every column named in a kind list, paired with its kind, in list order.
    pub fn declared_columns(&self) -> Vec<(&str, ColumnKind)> {
        self.kind_lists()
            .into_iter()
            .flat_map(|(kind, columns)| columns.iter().map(move |c| (c.as_str(), kind)))
            .collect()
    }

    /// True when no column is scheduled for retyping.
    pub fn is_noop(&self) -> bool {
        self.kind_lists().iter().all(|(_, columns)| columns.is_empty())
    }

    fn kind_lists(&self) -> [(ColumnKind, &Vec<String>); 4] {
        [
            (ColumnKind::Date, &self.date_columns),
            (ColumnKind::Numeric, &self.numeric_columns),
            (ColumnKind::Text, &self.text_columns),
            (ColumnKind::Categorical, &self.categorical_columns),
        ]
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.top_categories == 0 {
            return Err(ConfigValidationError::InvalidTopCategories(
                self.top_categories,
            ));
        }

        let mut seen: HashMap<&str, ColumnKind> = HashMap::new();
        for (column, kind) in self.declared_columns() {
            if let Some(first) = seen.insert(column, kind)
                && first != kind
            {
                return Err(ConfigValidationError::ConflictingColumnKinds {
                    column: column.to_string(),
                    first,
                    second: kind,
                });
            }
        }

        Ok(())
    }
}

/// Builder for [`PreprocessConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PreprocessConfigBuilder {
    config: PreprocessConfig,
}

fn owned<I, S>(columns: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into)
}

impl PreprocessConfigBuilder {
    /// Add columns to parse as dates.
    pub fn date_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.date_columns.extend(owned(columns));
        self
    }

    /// Add columns to parse as numbers.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.numeric_columns.extend(owned(columns));
        self
    }

    /// Add columns to normalize as free text.
    pub fn text_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.text_columns.extend(owned(columns));
        self
    }

    /// Add columns to bucket as categories.
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.categorical_columns.extend(owned(columns));
        self
    }

    /// Set the chrono format used to parse one date column.
    pub fn date_format(mut self, column: impl Into<String>, format: impl Into<String>) -> Self {
        self.config.date_formats.insert(column.into(), format.into());
        self
    }

    /// Set the outlier treatment for numeric columns.
    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.config.outlier_method = method;
        self
    }

    /// Set how many categories survive bucketing.
    pub fn top_categories(mut self, n: usize) -> Self {
        self.config.top_categories = n;
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PreprocessConfig` or an error if validation fails.
    pub fn build(self) -> Result<PreprocessConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Inputs the score aggregator needs beyond the table itself.
///
/// `threshold_date` falls back to the current local date-time when the
/// aggregator runs. Numeric columns that resolve a reference column need a
/// tolerance, either per column or through `default_tolerance`.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Dates before this are stale for timeliness.
    pub threshold_date: Option<NaiveDateTime>,

    /// Column name -> reference column name for accuracy.
    pub reference_columns: HashMap<String, String>,

    /// Per-column absolute tolerance for numeric accuracy.
    pub tolerances: HashMap<String, f64>,

    /// Tolerance for numeric columns without their own entry.
    pub default_tolerance: Option<f64>,

    /// Consistency check per column.
    pub consistency: HashMap<String, ConsistencyCheck>,

    /// Validators selected by column name for validity.
    pub validators: ValidatorRegistry,

    /// Minimum score counted as passing in metric summaries.
    /// Default: 80
    pub pass_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold_date: None,
            reference_columns: HashMap::new(),
            tolerances: HashMap::new(),
            default_tolerance: None,
            consistency: HashMap::new(),
            validators: ValidatorRegistry::with_defaults(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

impl ScoringConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::default()
    }

    /// Tolerance for a column, falling back to the default tolerance.
    pub fn tolerance_for(&self, column: &str) -> Option<f64> {
        self.tolerances
            .get(column)
            .copied()
            .or(self.default_tolerance)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=100.0).contains(&self.pass_threshold) {
            return Err(ConfigValidationError::InvalidPassThreshold(
                self.pass_threshold,
            ));
        }

        let per_column = self.tolerances.iter().map(|(c, v)| (c.as_str(), *v));
        let default = self.default_tolerance.map(|v| ("<default>", v));
        for (column, value) in per_column.chain(default) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigValidationError::InvalidTolerance {
                    column: column.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

/// Builder for [`ScoringConfig`] with fluent API.
#[derive(Debug)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
    custom_validators: Vec<(ColumnMatcher, Arc<dyn Validator>)>,
    default_validators: bool,
}

impl Default for ScoringConfigBuilder {
    fn default() -> Self {
        Self {
            config: ScoringConfig {
                validators: ValidatorRegistry::new(),
                ..ScoringConfig::default()
            },
            custom_validators: Vec::new(),
            default_validators: true,
        }
    }
}

impl ScoringConfigBuilder {
    /// Set the timeliness threshold.
    pub fn threshold_date(mut self, date: NaiveDateTime) -> Self {
        self.config.threshold_date = Some(date);
        self
    }

    /// Compare `column` against `reference` for accuracy.
    pub fn reference_column(
        mut self,
        column: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.config
            .reference_columns
            .insert(column.into(), reference.into());
        self
    }

    /// Set the numeric accuracy tolerance for one column.
    pub fn tolerance(mut self, column: impl Into<String>, tolerance: f64) -> Self {
        self.config.tolerances.insert(column.into(), tolerance);
        self
    }

    /// Set the tolerance used by numeric columns without their own.
    pub fn default_tolerance(mut self, tolerance: f64) -> Self {
        self.config.default_tolerance = Some(tolerance);
        self
    }

    /// Flag rows where `column` is greater than `other`.
    pub fn consistency_against(
        mut self,
        column: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        self.config
            .consistency
            .insert(column.into(), ConsistencyCheck::against(other));
        self
    }

    /// Score `column` with a custom row rule.
    pub fn consistency_rule(
        mut self,
        column: impl Into<String>,
        rule: impl ConsistencyRule + 'static,
    ) -> Self {
        self.config
            .consistency
            .insert(column.into(), ConsistencyCheck::rule(rule));
        self
    }

    /// Register a validator. Custom validators take precedence over the defaults.
    pub fn validator(mut self, matcher: ColumnMatcher, validator: impl Validator + 'static) -> Self {
        self.custom_validators.push((matcher, Arc::new(validator)));
        self
    }

    /// Include or drop the built-in validators (email columns).
    pub fn default_validators(mut self, include: bool) -> Self {
        self.default_validators = include;
        self
    }

    /// Set the pass threshold for metric summaries.
    pub fn pass_threshold(mut self, threshold: f64) -> Self {
        self.config.pass_threshold = threshold;
        self
    }

    /// Build the configuration.
    pub fn build(mut self) -> Result<ScoringConfig, ConfigValidationError> {
        let mut registry = ValidatorRegistry::new();
        for (matcher, validator) in self.custom_validators {
            registry.register(matcher, validator);
        }
        if self.default_validators {
            registry.register_defaults();
        }
        self.config.validators = registry;

        self.config.validate()?;
        Ok(self.config)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column '{column}' is declared both {first} and {second}")]
    ConflictingColumnKinds {
        column: String,
        first: ColumnKind,
        second: ColumnKind,
    },

    #[error("Invalid top categories: {0} (must be at least 1)")]
    InvalidTopCategories(usize),

    #[error("Invalid pass threshold: {0} (must be between 0 and 100)")]
    InvalidPassThreshold(f64),

    #[error("Invalid tolerance for '{column}': {value} (must be a non-negative number)")]
    InvalidTolerance { column: String, value: f64 },

    #[error("Invalid threshold date '{0}'")]
    InvalidThresholdDate(String),

    #[error("Invalid validator pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid range validator: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },
}

/// Parse a threshold date given as a date or a date-time.
pub fn parse_threshold_date(value: &str) -> Result<NaiveDateTime, ConfigValidationError> {
    parse_date_auto(value).ok_or_else(|| ConfigValidationError::InvalidThresholdDate(value.to_string()))
}

// =============================================================================
// Configuration file
// =============================================================================

/// Validator declared in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorSpec {
    Email,
    Pattern {
        pattern: String,
    },
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

impl ValidatorSpec {
    /// Instantiate the described validator.
    pub fn build(&self) -> Result<Arc<dyn Validator>, ConfigValidationError> {
        match self {
            ValidatorSpec::Email => Ok(Arc::new(EmailValidator)),
            ValidatorSpec::Pattern { pattern } => PatternValidator::new(pattern)
                .map(|v| Arc::new(v) as Arc<dyn Validator>)
                .map_err(|e| ConfigValidationError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }),
            ValidatorSpec::Range { min, max } => {
                if let (Some(lo), Some(hi)) = (min, max)
                    && lo > hi
                {
                    return Err(ConfigValidationError::InvalidRange { min: *lo, max: *hi });
                }
                Ok(Arc::new(RangeValidator::new(*min, *max)))
            }
        }
    }
}

/// A validator bound to the columns it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRule {
    pub column: ColumnMatcher,
    pub validator: ValidatorSpec,
}

/// JSON configuration file accepted by the CLI.
///
/// ```json
/// {
///   "preprocess": { "date_columns": ["created"], "outlier_method": "Cap" },
///   "threshold_date": "2024-01-01",
///   "reference_columns": { "price": "list_price" },
///   "tolerances": { "price": 0.5 },
///   "consistency": { "start": "end" },
///   "validators": [{ "column": { "contains": "phone" }, "validator": { "kind": "pattern", "pattern": "^\\+?[0-9 ]+$" } }],
///   "pass_threshold": 80
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfigFile {
    pub preprocess: PreprocessConfig,
    pub threshold_date: Option<String>,
    pub reference_columns: HashMap<String, String>,
    pub tolerances: HashMap<String, f64>,
    pub default_tolerance: Option<f64>,
    /// Column -> column it must not exceed.
    pub consistency: HashMap<String, String>,
    pub validators: Vec<ValidatorRule>,
    pub pass_threshold: Option<f64>,
}

impl QualityConfigFile {
    /// Read and parse a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Convert the file's scoring section into a validated [`ScoringConfig`].
    ///
    /// Validators from the file are registered ahead of the built-in ones.
    pub fn into_scoring_config(&self) -> Result<ScoringConfig, ConfigValidationError> {
        let mut builder = ScoringConfig::builder();

        if let Some(date) = &self.threshold_date {
            builder = builder.threshold_date(parse_threshold_date(date)?);
        }
        for (column, reference) in &self.reference_columns {
            builder = builder.reference_column(column, reference);
        }
        for (column, tolerance) in &self.tolerances {
            builder = builder.tolerance(column, *tolerance);
        }
        if let Some(tolerance) = self.default_tolerance {
            builder = builder.default_tolerance(tolerance);
        }
        for (column, other) in &self.consistency {
            builder = builder.consistency_against(column, other);
        }
        for rule in &self.validators {
            builder
                .custom_validators
                .push((rule.column.clone(), rule.validator.build()?));
        }
        if let Some(threshold) = self.pass_threshold {
            builder = builder.pass_threshold(threshold);
        }

        builder.build()
    }

    /// Names of all columns mentioned anywhere in the file.
    pub fn mentioned_columns(&self) -> HashSet<&str> {
        self.preprocess
            .declared_columns()
            .into_iter()
            .map(|(c, _)| c)
            .chain(self.reference_columns.keys().map(String::as_str))
            .chain(self.tolerances.keys().map(String::as_str))
            .chain(self.consistency.iter().flat_map(|(a, b)| [a.as_str(), b.as_str()]))
            .collect()
    }
}
