//! Judge prompt rendering
//!
//! Criterion templates use Handlebars syntax for variable substitution.

mod formatter;
mod input;

pub use formatter::Formatter;
pub use input::EvaluationInput;
