//! Error types for the data quality engine.
//!
//! Errors fall into two families. Configuration errors (a required
//! parameter is absent or malformed) surface to the caller and are never
//! replaced by a default. Data errors (a missing column, a type mismatch,
//! a failed conversion) are what the engine measures, so the aggregator
//! absorbs them into a warning and the metric's default score.
//!
//! Errors are serializable so they can be embedded in JSON reports.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the quality engine.
#[derive(Error, Debug)]
pub enum QualityError {
    /// A date column was scored for timeliness without a threshold date.
    #[error("Threshold date must be provided to score timeliness of date column '{column}'")]
    MissingThresholdDate { column: String },

    /// A numeric column was compared against a reference without a tolerance.
    #[error("Tolerance must be provided to score accuracy of numeric column '{column}'")]
    MissingTolerance { column: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A date format string could not be compiled.
    #[error("Invalid date format '{format}' for column '{column}'")]
    InvalidDateFormat { column: String, format: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Two columns share a name once labels are trimmed.
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// Two columns cannot be ordered against each other.
    #[error("Columns '{left}' and '{right}' are not comparable")]
    IncomparableColumns { left: String, right: String },

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<QualityError>,
    },
}

impl QualityError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        QualityError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for report consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingThresholdDate { .. } => "MISSING_THRESHOLD_DATE",
            Self::MissingTolerance { .. } => "MISSING_TOLERANCE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidDateFormat { .. } => "INVALID_DATE_FORMAT",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::IncomparableColumns { .. } => "INCOMPARABLE_COLUMNS",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check whether this error means the caller supplied an unusable configuration.
    ///
    /// Configuration errors are never absorbed into a default score.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::MissingThresholdDate { .. }
            | Self::MissingTolerance { .. }
            | Self::InvalidConfig(_)
            | Self::InvalidDateFormat { .. } => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for QualityError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        QualityError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for QualityError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("QualityError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for quality engine operations.
pub type Result<T> = std::result::Result<T, QualityError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| QualityError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            QualityError::MissingThresholdDate {
                column: "created".to_string()
            }
            .error_code(),
            "MISSING_THRESHOLD_DATE"
        );
        assert_eq!(
            QualityError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_configuration_errors() {
        assert!(
            QualityError::MissingTolerance {
                column: "price".to_string()
            }
            .is_configuration_error()
        );
        assert!(QualityError::InvalidConfig("bad".to_string()).is_configuration_error());
        assert!(!QualityError::ColumnNotFound("x".to_string()).is_configuration_error());
        assert!(
            !QualityError::IncomparableColumns {
                left: "a".to_string(),
                right: "b".to_string()
            }
            .is_configuration_error()
        );
    }

    #[test]
    fn test_context_preserves_classification() {
        let error = QualityError::MissingThresholdDate {
            column: "shipped".to_string(),
        }
        .with_context("While scoring timeliness");
        assert!(error.to_string().contains("While scoring timeliness"));
        assert_eq!(error.error_code(), "MISSING_THRESHOLD_DATE");
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = QualityError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }
}
