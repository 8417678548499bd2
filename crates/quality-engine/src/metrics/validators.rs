//! Cell validators and the registry that assigns them to columns.

use crate::types::Cell;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Email address shape: local part, `@`, domain with a 2+ letter TLD.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("Invalid regex: email")
});

/// A predicate over non-null cells used by the validity metric.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Short name shown in logs and reports.
    fn name(&self) -> &str;

    /// Check a single non-null cell.
    fn is_valid(&self, cell: &Cell) -> bool;
}

/// Matches the text rendering of a cell against an email pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl Validator for EmailValidator {
    fn name(&self) -> &str {
        "email"
    }

    fn is_valid(&self, cell: &Cell) -> bool {
        match cell {
            Cell::Null => false,
            Cell::Text(s) => EMAIL_REGEX.is_match(s),
            other => EMAIL_REGEX.is_match(&other.to_string()),
        }
    }
}

/// Matches the text rendering of a cell against a user regex.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    regex: Regex,
}

impl PatternValidator {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Validator for PatternValidator {
    fn name(&self) -> &str {
        "pattern"
    }

    fn is_valid(&self, cell: &Cell) -> bool {
        match cell {
            Cell::Null => false,
            Cell::Text(s) => self.regex.is_match(s),
            other => self.regex.is_match(&other.to_string()),
        }
    }
}

/// Accepts numeric cells inside an inclusive range; other cells are invalid.
#[derive(Debug, Clone, Copy)]
pub struct RangeValidator {
    min: Option<f64>,
    max: Option<f64>,
}

impl RangeValidator {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

impl Validator for RangeValidator {
    fn name(&self) -> &str {
        "range"
    }

    fn is_valid(&self, cell: &Cell) -> bool {
        let Some(value) = cell.as_number() else {
            return false;
        };
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// How a registry entry selects columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMatcher {
    /// Exact column name.
    Exact(String),
    /// Case-insensitive substring of the column name.
    Contains(String),
}

impl ColumnMatcher {
    pub fn matches(&self, column: &str) -> bool {
        match self {
            ColumnMatcher::Exact(name) => column == name,
            ColumnMatcher::Contains(fragment) => column
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
        }
    }
}

/// Ordered validator registry. The first entry whose matcher accepts a
/// column name wins.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    entries: Vec<(ColumnMatcher, Arc<dyn Validator>)>,
}

impl ValidatorRegistry {
    /// An empty registry: every column scores 100 for validity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in rules (columns containing "email").
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    pub fn register(&mut self, matcher: ColumnMatcher, validator: Arc<dyn Validator>) -> &mut Self {
        self.entries.push((matcher, validator));
        self
    }

    /// Append the built-in rules after any registered so far.
    pub fn register_defaults(&mut self) -> &mut Self {
        self.register(
            ColumnMatcher::Contains("email".to_string()),
            Arc::new(EmailValidator),
        )
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, matcher: ColumnMatcher, validator: impl Validator + 'static) -> Self {
        self.register(matcher, Arc::new(validator));
        self
    }

    pub fn resolve(&self, column: &str) -> Option<&dyn Validator> {
        self.entries
            .iter()
            .find(|(matcher, _)| matcher.matches(column))
            .map(|(_, validator)| validator.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_email_validator() {
        let v = EmailValidator;
        assert!(v.is_valid(&text("a@b.com")));
        assert!(v.is_valid(&text("first.last+tag@mail.example.org")));
        assert!(!v.is_valid(&text("bad")));
        assert!(!v.is_valid(&text("a@b.c")));
        assert!(!v.is_valid(&text("a b@c.com")));
        assert!(!v.is_valid(&Cell::Null));
        assert!(!v.is_valid(&Cell::Number(3.0)));
    }

    #[test]
    fn test_pattern_validator_renders_non_text() {
        let v = PatternValidator::new(r"^\d{3}$").unwrap();
        assert!(v.is_valid(&text("123")));
        assert!(v.is_valid(&Cell::Number(123.0)));
        assert!(!v.is_valid(&text("12a")));
        assert_eq!(v.pattern(), r"^\d{3}$");
        assert!(PatternValidator::new("(").is_err());
    }

    #[test]
    fn test_range_validator() {
        let v = RangeValidator::new(Some(0.0), Some(10.0));
        assert!(v.is_valid(&Cell::Number(0.0)));
        assert!(v.is_valid(&Cell::Number(10.0)));
        assert!(!v.is_valid(&Cell::Number(10.5)));
        assert!(!v.is_valid(&text("5")));

        let open = RangeValidator::new(None, Some(1.0));
        assert!(open.is_valid(&Cell::Number(-1e9)));
    }

    #[test]
    fn test_column_matcher() {
        assert!(ColumnMatcher::Contains("email".into()).matches("Work_EMAIL"));
        assert!(!ColumnMatcher::Contains("email".into()).matches("mail"));
        assert!(ColumnMatcher::Exact("id".into()).matches("id"));
        assert!(!ColumnMatcher::Exact("id".into()).matches("ID"));
    }

    #[test]
    fn test_registry_first_match_wins() {
        let registry = ValidatorRegistry::new()
            .with(
                ColumnMatcher::Exact("backup_email".into()),
                PatternValidator::new(".*").unwrap(),
            )
            .with(ColumnMatcher::Contains("email".into()), EmailValidator);

        assert_eq!(registry.resolve("backup_email").unwrap().name(), "pattern");
        assert_eq!(registry.resolve("email").unwrap().name(), "email");
        assert!(registry.resolve("name").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_default_registry() {
        let registry = ValidatorRegistry::with_defaults();
        assert_eq!(registry.resolve("customer_email").unwrap().name(), "email");
        assert!(ValidatorRegistry::new().is_empty());
    }
}
