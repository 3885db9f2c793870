//! cruisejudge - LLM-as-judge evaluation criteria for a cruise booking agent
//!
//! Holds the rubric prompts a judge model scores the agent against, fills them
//! in from an evaluation record, and combines the judge's per-criterion scores
//! into one weighted number.
//!
//! # Core Concepts
//!
//! - **Registry**: named criterion definitions, built once and passed around read-only
//! - **Formatter**: substitutes typed [`Variable`]s into a criterion's template
//! - **Aggregator**: `sum((score / 5) * weight)` over the criteria that were scored
//!
//! # Modules
//!
//! - [`criteria`] - Criterion definitions and the registry
//! - [`prompts`] - Evaluation input and prompt rendering
//! - [`scoring`] - Verdict parsing and weighted aggregation
//! - [`checks`] - Code-based checks scored without the judge
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use cruisejudge::{CriterionRegistry, EvaluationInput, Formatter, ScoreAggregator, Variable};
//!
//! let registry = CriterionRegistry::builtin().unwrap();
//! let coherence = registry.get("response_coherence").unwrap();
//!
//! let input = EvaluationInput::new().with(Variable::Output, "The Alaska sailing departs June 3.");
//! let prompt = Formatter::new().format(coherence, &input).unwrap();
//! assert!(prompt.contains("Alaska sailing"));
//!
//! let scores = BTreeMap::from([("response_coherence".to_string(), 5)]);
//! let total = ScoreAggregator::new(registry.weight_table()).aggregate(&scores).unwrap();
//! assert!((total - 0.10).abs() < 1e-9);
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod criteria;
pub mod error;
pub mod prompts;
pub mod scoring;

pub use checks::{SqlSyntaxReport, ToolUsageReport, check_sql_syntax, check_tool_usage};
pub use config::Config;
pub use criteria::{CriterionDefinition, CriterionKind, CriterionRegistry, Variable};
pub use error::{EvalError, Result};
pub use prompts::{EvaluationInput, Formatter};
pub use scoring::{AggregateReport, ScoreAggregator, ScoreResult, WeightTable, parse_verdict};
