//! Criterion weight tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EvalError, Result};

/// Criterion name to weight fraction
///
/// The table does not need to sum to 1.0; the judge-scored criteria carry
/// 0.65 of the overall score and the rest belongs to code-based checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, criterion: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(criterion.into(), weight);
        self
    }

    pub fn insert(&mut self, criterion: impl Into<String>, weight: f64) -> Option<f64> {
        self.weights.insert(criterion.into(), weight)
    }

    pub fn get(&self, criterion: &str) -> Option<f64> {
        self.weights.get(criterion).copied()
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Every weight must be a finite fraction in [0, 1]
    pub fn validate(&self) -> Result<()> {
        debug!(count = self.weights.len(), total = self.total(), "WeightTable::validate: called");
        for (name, weight) in &self.weights {
            if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
                return Err(EvalError::InvalidDefinition {
                    name: name.clone(),
                    reason: format!("weight {} is outside [0, 1]", weight),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, f64)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, f64>> for WeightTable {
    fn from(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total() {
        let table = WeightTable::new()
            .with("response_relevance", 0.15)
            .with("response_coherence", 0.10);
        assert!((table.total() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_negative() {
        let table = WeightTable::new().with("response_relevance", -0.1);
        assert!(matches!(table.validate(), Err(EvalError::InvalidDefinition { .. })));
    }

    #[test]
    fn test_deserialize_from_yaml_map() {
        let table: WeightTable = serde_yaml::from_str("response_relevance: 0.2\nresponse_coherence: 0.05\n").unwrap();
        assert_eq!(table.get("response_relevance"), Some(0.2));
        assert_eq!(table.len(), 2);
    }
}
