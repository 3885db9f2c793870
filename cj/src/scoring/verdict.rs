//! Judge verdict parsing
//!
//! The judge model is asked to reply with `Score: N` and `Justification: ...`,
//! but models drift, so a JSON object with a `score` field is accepted too.

use std::num::IntErrorKind;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::criteria::{SCORE_MAX, SCORE_MIN};
use crate::error::{EvalError, Result};

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bscore\b\**\s*[:=]\s*\**\s*(-?\d+)").expect("valid score regex"));

static JUSTIFICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\b(?:justification|reasoning|explanation)\b\**\s*[:=]\s*\**\s*(.*)")
        .expect("valid justification regex")
});

const JUSTIFICATION_KEYS: [&str; 3] = ["justification", "reasoning", "explanation"];

/// Positions after a `{` tried as the start of a JSON verdict
const MAX_JSON_CANDIDATES: usize = 32;

/// A judge's score for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub criterion: String,
    pub score: i64,
    pub justification: String,
}

impl ScoreResult {
    /// Build a result, rejecting scores outside [1, 5]
    pub fn new(criterion: impl Into<String>, score: i64, justification: impl Into<String>) -> Result<Self> {
        let criterion = criterion.into();
        check_score(&criterion, score)?;
        Ok(Self {
            criterion,
            score,
            justification: justification.into(),
        })
    }
}

/// Fail with `OutOfRange` unless `score` is within [1, 5]
pub(crate) fn check_score(criterion: &str, score: i64) -> Result<()> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        debug!(%criterion, %score, "check_score: out of range");
        return Err(EvalError::OutOfRange {
            criterion: criterion.to_string(),
            score,
            min: SCORE_MIN,
            max: SCORE_MAX,
        });
    }
    Ok(())
}

/// Parse the judge model's reply for `criterion`
pub fn parse_verdict(criterion: &str, text: &str) -> Result<ScoreResult> {
    debug!(%criterion, text_len = text.len(), "parse_verdict: called");

    if let Some((score, justification)) = parse_json(text) {
        debug!(%criterion, %score, "parse_verdict: parsed JSON verdict");
        return ScoreResult::new(criterion, score, justification);
    }

    if let Some((score, justification)) = parse_labelled(text) {
        debug!(%criterion, %score, "parse_verdict: parsed labelled verdict");
        return ScoreResult::new(criterion, score, justification);
    }

    Err(EvalError::UnparseableVerdict {
        criterion: criterion.to_string(),
        reason: "no score found".to_string(),
    })
}

/// First JSON object in the text that carries a usable `score`
///
/// Only the first few `{` positions are tried so a reply full of stray braces
/// stays linear.
fn parse_json(text: &str) -> Option<(i64, String)> {
    for (idx, _) in text.match_indices('{').take(MAX_JSON_CANDIDATES) {
        let Some(Ok(value)) = serde_json::Deserializer::from_str(&text[idx..])
            .into_iter::<Value>()
            .next()
        else {
            continue;
        };
        let Some(score) = value.get("score").and_then(score_from_json) else {
            continue;
        };
        let justification = JUSTIFICATION_KEYS
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .trim()
            .to_string();
        return Some((score, justification));
    }
    None
}

/// Integer parse that saturates on overflow, so huge scores still read as out of range
fn parse_score_digits(digits: &str) -> Option<i64> {
    match digits.trim().parse::<i64>() {
        Ok(score) => Some(score),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

fn score_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => parse_score_digits(s),
        _ => None,
    }
}

fn parse_labelled(text: &str) -> Option<(i64, String)> {
    let score = parse_score_digits(&SCORE_RE.captures(text)?[1])?;
    let justification = JUSTIFICATION_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default();
    Some((score, justification))
}
