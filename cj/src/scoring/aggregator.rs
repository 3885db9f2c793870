//! Weighted score aggregation
//!
//! Each judged criterion contributes `(score / 5) * weight`. Criteria in the
//! weight table without a score are left out rather than counted as zero.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::verdict::check_score;
use super::{ScoreResult, WeightTable};
use crate::criteria::SCORE_MAX;
use crate::error::{EvalError, Result};

/// One criterion's share of the aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub criterion: String,
    pub score: i64,
    pub weight: f64,
    pub contribution: f64,
}

/// Aggregate score with the per-criterion detail behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Weighted sum of normalized scores
    pub total: f64,
    /// Sum of the weights of scored criteria
    pub covered_weight: f64,
    pub contributions: Vec<Contribution>,
    /// Weighted criteria that had no score
    pub unscored: Vec<String>,
}

impl AggregateReport {
    /// Total rescaled to the covered weight, `None` when nothing was scored
    pub fn normalized(&self) -> Option<f64> {
        (self.covered_weight > 0.0).then(|| self.total / self.covered_weight)
    }
}

/// Combines per-criterion scores using a fixed weight table
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    weights: WeightTable,
}

impl ScoreAggregator {
    pub fn new(weights: WeightTable) -> Self {
        debug!(count = weights.len(), total = weights.total(), "ScoreAggregator::new: called");
        Self { weights }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Weighted sum of `(score / 5) * weight` over the weighted criteria present in `scores`
    ///
    /// Every score is range-checked, including scores for criteria the table does not weight.
    pub fn aggregate(&self, scores: &BTreeMap<String, i64>) -> Result<f64> {
        Ok(self.breakdown(scores)?.total)
    }

    /// Like [`aggregate`](Self::aggregate) but keeps the per-criterion detail
    pub fn breakdown(&self, scores: &BTreeMap<String, i64>) -> Result<AggregateReport> {
        debug!(scored = scores.len(), "ScoreAggregator::breakdown: called");
        for (criterion, score) in scores {
            check_score(criterion, *score)?;
        }

        let mut contributions = Vec::new();
        let mut unscored = Vec::new();
        for (criterion, weight) in self.weights.iter() {
            match scores.get(criterion) {
                Some(&score) => contributions.push(Contribution {
                    criterion: criterion.to_string(),
                    score,
                    weight,
                    contribution: (score as f64 / SCORE_MAX as f64) * weight,
                }),
                None => {
                    debug!(%criterion, "ScoreAggregator::breakdown: no score, excluded");
                    unscored.push(criterion.to_string());
                }
            }
        }

        let total: f64 = contributions.iter().map(|c| c.contribution).sum();
        let covered_weight: f64 = contributions.iter().map(|c| c.weight).sum();
        info!(total, covered_weight, unscored = unscored.len(), "Aggregated criterion scores");

        Ok(AggregateReport {
            total,
            covered_weight,
            contributions,
            unscored,
        })
    }

    /// Aggregate parsed judge results; each criterion may appear once
    pub fn aggregate_results(&self, results: &[ScoreResult]) -> Result<AggregateReport> {
        debug!(count = results.len(), "ScoreAggregator::aggregate_results: called");
        let mut scores = BTreeMap::new();
        for result in results {
            if scores.insert(result.criterion.clone(), result.score).is_some() {
                return Err(EvalError::DuplicateScore {
                    name: result.criterion.clone(),
                });
            }
        }
        self.breakdown(&scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario_weights() -> WeightTable {
        WeightTable::new()
            .with("A", 0.15)
            .with("B", 0.15)
            .with("C", 0.10)
            .with("D", 0.15)
            .with("E", 0.05)
            .with("F", 0.05)
    }

    fn scores(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_reference_scenario() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let total = aggregator
            .aggregate(&scores(&[("A", 5), ("B", 4), ("C", 5), ("D", 3), ("E", 5), ("F", 4)]))
            .unwrap();
        assert!((total - 0.55).abs() < 1e-9, "total was {}", total);
    }

    #[test]
    fn test_missing_criteria_are_excluded() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let report = aggregator.breakdown(&scores(&[("A", 5), ("C", 5)])).unwrap();

        assert!((report.total - 0.25).abs() < 1e-9);
        assert!((report.covered_weight - 0.25).abs() < 1e-9);
        assert_eq!(report.unscored, vec!["B", "D", "E", "F"]);
        assert!((report.normalized().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unweighted_scores_do_not_contribute() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let report = aggregator.breakdown(&scores(&[("A", 5), ("Z", 5)])).unwrap();
        assert_eq!(report.contributions.len(), 1);
        assert!((report.total - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_empty_scores() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let report = aggregator.breakdown(&BTreeMap::new()).unwrap();
        assert_eq!(report.total, 0.0);
        assert!(report.normalized().is_none());
    }

    #[test]
    fn test_out_of_range_even_when_unweighted() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let err = aggregator.aggregate(&scores(&[("A", 5), ("Z", 6)])).unwrap_err();
        assert!(matches!(err, EvalError::OutOfRange { ref criterion, score: 6, .. } if criterion == "Z"));
    }

    #[test]
    fn test_aggregate_results_rejects_duplicates() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let results = vec![
            ScoreResult::new("A", 5, "good").unwrap(),
            ScoreResult::new("A", 3, "second opinion").unwrap(),
        ];
        let err = aggregator.aggregate_results(&results).unwrap_err();
        assert!(matches!(err, EvalError::DuplicateScore { ref name } if name == "A"));
    }

    #[test]
    fn test_aggregate_results() {
        let aggregator = ScoreAggregator::new(scenario_weights());
        let results = vec![
            ScoreResult::new("A", 5, "").unwrap(),
            ScoreResult::new("D", 3, "").unwrap(),
        ];
        let report = aggregator.aggregate_results(&results).unwrap();
        assert!((report.total - 0.24).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_any_out_of_range_score_fails(
            valid in proptest::collection::btree_map("[A-F]", 1i64..=5, 0..6),
            bad_name in "[A-Z]",
            bad_score in prop_oneof![i64::MIN..1i64, 6i64..i64::MAX],
        ) {
            let mut all = valid;
            all.insert(bad_name, bad_score);

            let aggregator = ScoreAggregator::new(scenario_weights());
            let is_out_of_range = matches!(aggregator.aggregate(&all), Err(EvalError::OutOfRange { .. }));
            prop_assert!(is_out_of_range);
        }

        #[test]
        fn prop_in_range_total_is_bounded_by_weight(
            valid in proptest::collection::btree_map("[A-F]", 1i64..=5, 0..6),
        ) {
            let weights = scenario_weights();
            let total = ScoreAggregator::new(weights.clone()).aggregate(&valid).unwrap();
            prop_assert!(total >= 0.0);
            prop_assert!(total <= weights.total() + 1e-9);
        }
    }
}
