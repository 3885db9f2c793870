//! Prompt formatter
//!
//! Renders a criterion template with the caller's variables. Required variables
//! are checked before any substitution; optional ones render empty when absent.

use handlebars::Handlebars;
use tracing::{debug, info};

use super::EvaluationInput;
use crate::criteria::CriterionDefinition;
use crate::error::{EvalError, Result};

/// Renders judge prompts from criterion definitions
pub struct Formatter {
    /// Handlebars template engine (escaping disabled, values are inserted verbatim)
    hbs: Handlebars<'static>,
}

impl Formatter {
    pub fn new() -> Self {
        debug!("Formatter::new: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs }
    }

    /// Render the judge prompt for `definition`
    ///
    /// Fails with [`EvalError::MissingVariable`] naming the first absent required
    /// variable. Values are not inspected; length and content are the caller's concern.
    pub fn format(&self, definition: &CriterionDefinition, input: &EvaluationInput) -> Result<String> {
        debug!(criterion = %definition.name, supplied = input.len(), "Formatter::format: called");

        if let Some(variable) = input.missing_for(definition).into_iter().next() {
            debug!(criterion = %definition.name, %variable, "Formatter::format: missing required variable");
            return Err(EvalError::MissingVariable {
                criterion: definition.name.clone(),
                variable,
            });
        }

        let context = input.context_for(definition);
        let prompt = self
            .hbs
            .render_template(&definition.template, &context)
            .map_err(|source| EvalError::Render {
                criterion: definition.name.clone(),
                source: Box::new(source),
            })?;

        info!(criterion = %definition.name, prompt_len = prompt.len(), "Rendered judge prompt");
        Ok(prompt)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}
