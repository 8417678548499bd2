//! Score aggregation.
//!
//! The [`ScoreAggregator`] runs each of the seven metrics once per column,
//! assembles the column × metric [`ScoreMatrix`](crate::types::ScoreMatrix)
//! and reduces it to an overall score and per-metric pass rates.

mod aggregator;

pub use aggregator::{QualityScores, ScoreAggregator, calculate_scores};
