//! Scoring
//!
//! Turns judge replies into [`ScoreResult`]s and combines them into one
//! weighted value.

mod aggregator;
mod verdict;
mod weights;

pub use aggregator::{AggregateReport, Contribution, ScoreAggregator};
pub use verdict::{ScoreResult, parse_verdict};
pub use weights::WeightTable;
