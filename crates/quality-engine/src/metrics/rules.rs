//! Row-level consistency rules.

use crate::types::Cell;
use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;

/// Read-only view of one row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    names: &'a [String],
    columns: &'a [Vec<Cell>],
    row: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(names: &'a [String], columns: &'a [Vec<Cell>], row: usize) -> Self {
        Self {
            names,
            columns,
            row,
        }
    }

    /// Cell of `column` in this row; `None` when the column does not exist.
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let idx = self.names.iter().position(|name| name == column)?;
        self.columns.get(idx).and_then(|cells| cells.get(self.row))
    }

    /// Numeric value of `column`, if present and numeric.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_number)
    }

    /// Date value of `column`, if present and a date.
    pub fn date(&self, column: &str) -> Option<NaiveDateTime> {
        self.get(column).and_then(Cell::as_date)
    }

    /// Zero-based row position.
    pub fn index(&self) -> usize {
        self.row
    }
}

/// A predicate deciding whether a row is consistent.
///
/// Any `Fn(&RowView) -> bool + Send + Sync` closure is a rule:
///
/// ```rust,ignore
/// let rule = |row: &RowView| row.number("discount") <= row.number("price");
/// ```
pub trait ConsistencyRule: Send + Sync {
    fn is_consistent(&self, row: &RowView<'_>) -> bool;
}

impl<F> ConsistencyRule for F
where
    F: Fn(&RowView<'_>) -> bool + Send + Sync,
{
    fn is_consistent(&self, row: &RowView<'_>) -> bool {
        self(row)
    }
}

/// Consistency check configured for one column.
#[derive(Clone)]
pub enum ConsistencyCheck {
    /// Rows where the scored column is greater than this column are inconsistent.
    NotGreaterThan(String),
    /// Rows rejected by the rule are inconsistent.
    Rule(Arc<dyn ConsistencyRule>),
}

impl ConsistencyCheck {
    pub fn against(other: impl Into<String>) -> Self {
        ConsistencyCheck::NotGreaterThan(other.into())
    }

    pub fn rule(rule: impl ConsistencyRule + 'static) -> Self {
        ConsistencyCheck::Rule(Arc::new(rule))
    }
}

impl fmt::Debug for ConsistencyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyCheck::NotGreaterThan(other) => {
                f.debug_tuple("NotGreaterThan").field(other).finish()
            }
            ConsistencyCheck::Rule(_) => f.write_str("Rule(..)"),
        }
    }
}
