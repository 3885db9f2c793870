//! Evaluation input
//!
//! The values a caller supplies for one evaluation call, keyed by [`Variable`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::criteria::{CriterionDefinition, Variable};

/// Variable values for a single evaluation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationInput {
    values: BTreeMap<Variable, String>,
}

impl EvaluationInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, variable: Variable, value: impl Into<String>) -> Self {
        self.values.insert(variable, value.into());
        self
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, variable: Variable, value: impl Into<String>) -> Option<String> {
        self.values.insert(variable, value.into())
    }

    pub fn remove(&mut self, variable: Variable) -> Option<String> {
        self.values.remove(&variable)
    }

    pub fn get(&self, variable: Variable) -> Option<&str> {
        self.values.get(&variable).map(|s| s.as_str())
    }

    pub fn contains(&self, variable: Variable) -> bool {
        self.values.contains_key(&variable)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Required variables of `definition` that this input does not supply
    pub fn missing_for(&self, definition: &CriterionDefinition) -> Vec<Variable> {
        definition
            .required_variables
            .iter()
            .filter(|var| !self.contains(**var))
            .copied()
            .collect()
    }

    /// Template context holding only the variables `definition` declares
    pub(crate) fn context_for(&self, definition: &CriterionDefinition) -> Map<String, Value> {
        debug!(criterion = %definition.name, supplied = self.values.len(), "EvaluationInput::context_for: called");
        self.values
            .iter()
            .filter(|(var, _)| definition.declares(**var))
            .map(|(var, value)| (var.as_str().to_string(), Value::String(value.clone())))
            .collect()
    }
}

impl FromIterator<(Variable, String)> for EvaluationInput {
    fn from_iter<I: IntoIterator<Item = (Variable, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
