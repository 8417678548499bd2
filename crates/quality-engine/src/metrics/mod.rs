//! The seven quality metrics.
//!
//! Each calculator is a pure function over one column (or, for consistency,
//! the whole table) and returns a score in [0, 100]:
//!
//! - [`completeness`], [`uniqueness`], [`validity`], [`timeliness`] and
//!   [`reliability`] look at a single column.
//! - [`accuracy`] compares a column against a reference column.
//! - [`consistency`] evaluates a [`ConsistencyCheck`] row by row.

mod column;
mod comparison;
mod rules;
mod validators;

pub use column::{completeness, reliability, timeliness, uniqueness, validity};
pub use comparison::{accuracy, consistency};
pub use rules::{ConsistencyCheck, ConsistencyRule, RowView};
pub use validators::{
    ColumnMatcher, EmailValidator, PatternValidator, RangeValidator, Validator, ValidatorRegistry,
};
