//! Evaluation criteria
//!
//! Each criterion is a rubric prompt for the judge model plus the metadata
//! needed to score it: weight, score range and the variables its template uses.
//!
//! Definition loading chain:
//! 1. Builtin definitions embedded from `prompts/*.yml`
//! 2. `~/.config/cruisejudge/criteria/*.yml` (user overrides)
//! 3. `.cruisejudge/criteria/*.yml` (project overrides)

mod definition;
pub mod embedded;
mod registry;
mod variable;

pub use definition::{CriterionDefinition, CriterionKind, SCORE_MAX, SCORE_MIN, ScoreRange};
pub use registry::CriterionRegistry;
pub use variable::Variable;
