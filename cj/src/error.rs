//! Evaluation error types

use std::path::PathBuf;
use thiserror::Error;

use crate::criteria::Variable;

/// Errors raised by the registry, formatter, aggregator and verdict parser
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Criterion not found: {name}")]
    NotFound { name: String },

    #[error("Missing required variable '{variable}' for criterion {criterion}")]
    MissingVariable { criterion: String, variable: Variable },

    #[error("Score {score} for criterion {criterion} is outside [{min}, {max}]")]
    OutOfRange {
        criterion: String,
        score: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid criterion definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Criterion '{name}' defined twice in {}", dir.display())]
    DuplicateCriterion { name: String, dir: PathBuf },

    #[error("Criterion '{name}' scored more than once")]
    DuplicateScore { name: String },

    #[error("Unknown template variable: {0}")]
    UnknownVariable(String),

    #[error("Unparseable judge response for {criterion}: {reason}")]
    UnparseableVerdict { criterion: String, reason: String },

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to render template for {criterion}: {source}")]
    Render {
        criterion: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

impl EvalError {
    /// True for errors caused by definition files or configuration rather than a single call
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            EvalError::InvalidDefinition { .. }
                | EvalError::DuplicateCriterion { .. }
                | EvalError::Io { .. }
                | EvalError::Yaml { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
