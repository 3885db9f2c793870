//! Tool usage check
//!
//! Compares the tools the agent called against the tools the golden dataset
//! expects. Scored in code, not by the judge model.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

/// Outcome of comparing expected and actual tool calls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUsageReport {
    /// Fraction in [0, 1]
    pub score: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

/// Split a comma-separated tool list, trimming entries and dropping empties
pub fn parse_tool_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_set<S: AsRef<str>>(tools: &[S]) -> BTreeSet<String> {
    tools
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score tool usage
///
/// - nothing expected: 1.0 if nothing was used, else 0.0
/// - something expected but nothing used: 0.0
/// - otherwise the fraction of expected tools that were used
pub fn check_tool_usage<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> ToolUsageReport {
    let expected = to_set(expected);
    let actual = to_set(actual);
    debug!(expected = expected.len(), actual = actual.len(), "check_tool_usage: called");

    let matched: Vec<String> = expected.intersection(&actual).cloned().collect();
    let missing: Vec<String> = expected.difference(&actual).cloned().collect();
    let unexpected: Vec<String> = actual.difference(&expected).cloned().collect();

    let score = if expected.is_empty() {
        if actual.is_empty() { 1.0 } else { 0.0 }
    } else if actual.is_empty() {
        0.0
    } else {
        matched.len() as f64 / expected.len() as f64
    };

    debug!(%score, "check_tool_usage: complete");
    ToolUsageReport {
        score,
        matched,
        missing,
        unexpected,
    }
}
