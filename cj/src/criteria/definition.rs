//! Criterion definitions as loaded from YAML

use std::collections::BTreeSet;
use std::fmt;

use handlebars::template::{BlockParam, HelperTemplate, Parameter, TemplateElement};
use handlebars::{Path, PathSeg, Template};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Variable;
use crate::error::{EvalError, Result};

/// Lowest score a judge may award
pub const SCORE_MIN: i64 = 1;
/// Highest score a judge may award
pub const SCORE_MAX: i64 = 5;

/// Helpers handlebars registers by default
const BUILTIN_HELPERS: [&str; 17] = [
    "if", "unless", "each", "with", "lookup", "raw", "log", "eq", "ne", "gt", "gte", "lt", "lte", "and", "or", "not",
    "len",
];

/// Variable references found by walking a compiled template
#[derive(Debug, Default)]
struct References {
    names: BTreeSet<String>,
    /// Block params (`as |item|`) in scope
    locals: Vec<String>,
}

impl References {
    fn walk(&mut self, template: &Template) -> std::result::Result<(), String> {
        for element in &template.elements {
            match element {
                TemplateElement::RawString(_) | TemplateElement::Comment(_) => {}
                TemplateElement::Expression(helper)
                | TemplateElement::HtmlExpression(helper)
                | TemplateElement::HelperBlock(helper) => self.helper(helper)?,
                _ => return Err("partials and decorators are not supported".to_string()),
            }
        }
        Ok(())
    }

    fn helper(&mut self, helper: &HelperTemplate) -> std::result::Result<(), String> {
        match &helper.name {
            Parameter::Name(name) if BUILTIN_HELPERS.contains(&name.as_str()) => {}
            // `{{#input}}` with no such helper is a section over the variable
            Parameter::Name(name) => {
                self.names.insert(name.clone());
            }
            other => self.param(other)?,
        }
        for param in helper.params.iter().chain(helper.hash.values()) {
            self.param(param)?;
        }

        let scoped: Vec<String> = match &helper.block_param {
            Some(BlockParam::Single(p)) => vec![p],
            Some(BlockParam::Pair((a, b))) => vec![a, b],
            _ => Vec::new(),
        }
        .into_iter()
        .filter_map(Parameter::as_name)
        .map(str::to_string)
        .collect();

        let depth = self.locals.len();
        self.locals.extend(scoped);
        if let Some(body) = &helper.template {
            self.walk(body)?;
        }
        self.locals.truncate(depth);

        // `{{else}}` bodies and `{{else if ...}}` chains
        if let Some(inverse) = &helper.inverse {
            self.walk(inverse)?;
        }
        Ok(())
    }

    fn param(&mut self, param: &Parameter) -> std::result::Result<(), String> {
        match param {
            Parameter::Path(path) => self.path(path),
            Parameter::Subexpression(sub) => match sub.element.as_ref() {
                TemplateElement::Expression(helper)
                | TemplateElement::HtmlExpression(helper)
                | TemplateElement::HelperBlock(helper) => self.helper(helper),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn path(&mut self, path: &Path) -> std::result::Result<(), String> {
        // `@index`, `@key` and friends
        let Path::Relative((segs, raw)) = path else {
            return Ok(());
        };
        let named: Vec<&str> = segs
            .iter()
            .filter_map(|seg| match seg {
                PathSeg::Named(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();

        // `this`, `@root`
        let Some(&root) = named.first() else {
            return Ok(());
        };
        if self.locals.iter().any(|local| local == root) {
            return Ok(());
        }
        if named.len() > 1 {
            return Err(format!("'{}' reads a field of text variable '{}'", raw, root));
        }
        self.names.insert(root.to_string());
        Ok(())
    }
}

/// How a criterion is scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriterionKind {
    /// Scored by an external judge model from a formatted prompt
    #[default]
    LlmAsJudge,
    /// Scored deterministically in code
    CodeBased,
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LlmAsJudge => write!(f, "llm-as-judge"),
            Self::CodeBased => write!(f, "code-based"),
        }
    }
}

/// Inclusive score bounds, written as `[min, max]` in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(i64, i64)", into = "(i64, i64)")]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
}

impl ScoreRange {
    pub fn contains(&self, score: i64) -> bool {
        score >= self.min && score <= self.max
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            min: SCORE_MIN,
            max: SCORE_MAX,
        }
    }
}

impl TryFrom<(i64, i64)> for ScoreRange {
    type Error = String;

    fn try_from((min, max): (i64, i64)) -> std::result::Result<Self, Self::Error> {
        if min >= max {
            return Err(format!("score range [{}, {}] is empty", min, max));
        }
        Ok(Self { min, max })
    }
}

impl From<ScoreRange> for (i64, i64) {
    fn from(range: ScoreRange) -> Self {
        (range.min, range.max)
    }
}

impl fmt::Display for ScoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A single evaluation criterion: rubric prompt plus scoring metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CriterionDefinition {
    /// Unique key, e.g. `response_relevance`
    pub name: String,

    /// Numeric id used in reports
    #[serde(default)]
    pub criterion_id: u32,

    /// Human-readable name
    #[serde(default)]
    pub criterion_name: String,

    #[serde(rename = "type", default)]
    pub kind: CriterionKind,

    #[serde(default)]
    pub description: String,

    /// Share of the overall score, in [0, 1]
    pub weight: f64,

    #[serde(default)]
    pub score_range: ScoreRange,

    /// Variables the caller must supply
    #[serde(default)]
    pub required_variables: BTreeSet<Variable>,

    /// Variables the template uses when present
    #[serde(default)]
    pub optional_variables: BTreeSet<Variable>,

    /// Handlebars prompt template
    pub template: String,
}

impl CriterionDefinition {
    /// Parse a definition from YAML and validate it
    ///
    /// `origin` names the source (file path or builtin name) in error messages.
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        debug!(%origin, content_len = content.len(), "CriterionDefinition::from_yaml: called");
        let definition: Self = serde_yaml::from_str(content).map_err(|source| EvalError::Yaml {
            origin: origin.to_string(),
            source,
        })?;
        definition.validate()?;
        Ok(definition)
    }

    /// Name shown to humans, falling back to the key
    pub fn display_name(&self) -> &str {
        if self.criterion_name.is_empty() {
            &self.name
        } else {
            &self.criterion_name
        }
    }

    /// True if the variable is declared as required or optional
    pub fn declares(&self, variable: Variable) -> bool {
        self.required_variables.contains(&variable) || self.optional_variables.contains(&variable)
    }

    /// Variable names the template references
    ///
    /// Covers plain expressions, block helper arguments, `{{else if}}` chains and
    /// sub-expressions. Block params and `this` are not variables and are skipped.
    pub fn placeholders(&self) -> Result<BTreeSet<String>> {
        let template = Template::compile(&self.template)
            .map_err(|e| self.invalid(format!("template does not compile: {}", e)))?;
        let mut references = References::default();
        references.walk(&template).map_err(|reason| self.invalid(reason))?;
        Ok(references.names)
    }

    fn invalid(&self, reason: String) -> EvalError {
        EvalError::InvalidDefinition {
            name: self.name.clone(),
            reason,
        }
    }

    /// Check the invariants every loaded definition must hold
    pub fn validate(&self) -> Result<()> {
        debug!(name = %self.name, "CriterionDefinition::validate: called");
        let invalid = |reason: String| self.invalid(reason);

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }

        if !self.weight.is_finite() || !(0.0..=1.0).contains(&self.weight) {
            return Err(invalid(format!("weight {} is outside [0, 1]", self.weight)));
        }

        if self.score_range != ScoreRange::default() {
            return Err(invalid(format!(
                "score range {} must be {}",
                self.score_range,
                ScoreRange::default()
            )));
        }

        if let Some(both) = self.required_variables.intersection(&self.optional_variables).next() {
            return Err(invalid(format!("variable '{}' is both required and optional", both)));
        }

        for name in self.placeholders()? {
            let variable = name
                .parse::<Variable>()
                .map_err(|_| invalid(format!("template references unknown variable '{}'", name)))?;
            if !self.declares(variable) {
                return Err(invalid(format!("template references undeclared variable '{}'", name)));
            }
        }

        debug!(name = %self.name, "CriterionDefinition::validate: ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELEVANCE_YAML: &str = r#"
name: response_relevance
criterion-id: 1
criterion-name: Response Relevance
type: llm-as-judge
weight: 0.15
score-range: [1, 5]
description: Is the response on topic?
required-variables: [input, output, expected_response_type]
template: |
  Query: {{input}}
  Expected: {{expected_response_type}}
  Response: {{output}}
"#;

    #[test]
    fn test_deserialize_definition() {
        let def = CriterionDefinition::from_yaml(RELEVANCE_YAML, "test").unwrap();

        assert_eq!(def.name, "response_relevance");
        assert_eq!(def.criterion_id, 1);
        assert_eq!(def.display_name(), "Response Relevance");
        assert_eq!(def.kind, CriterionKind::LlmAsJudge);
        assert_eq!(def.weight, 0.15);
        assert_eq!(def.score_range, ScoreRange { min: 1, max: 5 });
        assert_eq!(def.required_variables.len(), 3);
        assert!(def.optional_variables.is_empty());
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
name: minimal
weight: 0.1
required-variables: [output]
template: "Rate {{output}}"
"#;
        let def = CriterionDefinition::from_yaml(yaml, "test").unwrap();

        assert_eq!(def.kind, CriterionKind::LlmAsJudge);
        assert_eq!(def.score_range, ScoreRange::default());
        assert_eq!(def.display_name(), "minimal");
    }

    #[test]
    fn test_placeholders_include_block_helpers() {
        let yaml = r#"
name: with_optional
weight: 0.1
required-variables: [output]
optional-variables: [input]
template: "{{#if input}}Q: {{input}}{{else}}none{{/if}} A: {{{output}}}"
"#;
        let def = CriterionDefinition::from_yaml(yaml, "test").unwrap();
        let placeholders = def.placeholders().unwrap();

        assert_eq!(placeholders.len(), 2);
        assert!(placeholders.contains("input"));
        assert!(placeholders.contains("output"));
    }

    #[test]
    fn test_rejects_weight_above_one() {
        let yaml = RELEVANCE_YAML.replace("weight: 0.15", "weight: 1.5");
        let err = CriterionDefinition::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::InvalidDefinition { ref reason, .. } if reason.contains("weight")));
    }

    #[test]
    fn test_rejects_other_score_range() {
        let yaml = RELEVANCE_YAML.replace("score-range: [1, 5]", "score-range: [0, 10]");
        let err = CriterionDefinition::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::InvalidDefinition { ref reason, .. } if reason.contains("score range")));
    }

    #[test]
    fn test_rejects_empty_score_range() {
        let yaml = RELEVANCE_YAML.replace("score-range: [1, 5]", "score-range: [5, 1]");
        let err = CriterionDefinition::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::Yaml { .. }));
    }

    #[test]
    fn test_rejects_undeclared_placeholder() {
        let yaml = RELEVANCE_YAML.replace("required-variables: [input, output, expected_response_type]", "required-variables: [input, output]");
        let err = CriterionDefinition::from_yaml(&yaml, "test").unwrap_err();
        assert!(
            matches!(err, EvalError::InvalidDefinition { ref reason, .. } if reason.contains("undeclared variable 'expected_response_type'"))
        );
    }

    #[test]
    fn test_rejects_unknown_placeholder() {
        let yaml = RELEVANCE_YAML.replace("Query: {{input}}", "Query: {{user_query}}");
        let err = CriterionDefinition::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::InvalidDefinition { ref reason, .. } if reason.contains("unknown variable 'user_query'")));
    }

    #[test]
    fn test_rejects_overlapping_variable_sets() {
        let yaml = format!("{}optional-variables: [input]\n", RELEVANCE_YAML);
        let err = CriterionDefinition::from_yaml(&yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::InvalidDefinition { ref reason, .. } if reason.contains("both required and optional")));
    }

    #[test]
    fn test_rejects_unbalanced_template() {
        let yaml = r#"
name: broken
weight: 0.1
required-variables: [input]
template: "{{#if input}}never closed"
"#;
        let err = CriterionDefinition::from_yaml(yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::InvalidDefinition { ref reason, .. } if reason.contains("does not compile")));
    }

    #[test]
    fn test_rejects_unknown_declared_variable() {
        let yaml = r#"
name: broken
weight: 0.1
required-variables: [query]
template: "{{query}}"
"#;
        let err = CriterionDefinition::from_yaml(yaml, "test").unwrap_err();
        assert!(matches!(err, EvalError::Yaml { .. }));
    }

    fn with_template(template: &str, required: &str, optional: &str) -> Result<CriterionDefinition> {
        let yaml = format!(
            "name: shaped\nweight: 0.1\nrequired-variables: [{}]\noptional-variables: [{}]\ntemplate: '{}'\n",
            required, optional, template
        );
        CriterionDefinition::from_yaml(&yaml, "test")
    }

    fn rejected_with(result: Result<CriterionDefinition>, needle: &str) -> bool {
        matches!(result, Err(EvalError::InvalidDefinition { ref reason, .. }) if reason.contains(needle))
    }

    #[test]
    fn test_rejects_unknown_variable_in_each() {
        let result = with_template("{{#each user_query}}[{{this}}]{{/each}} {{output}}", "output", "");
        assert!(rejected_with(result, "unknown variable 'user_query'"));
    }

    #[test]
    fn test_rejects_undeclared_variable_in_each() {
        let result = with_template("{{#each search_results}}{{this}}{{/each}} {{output}}", "output", "");
        assert!(rejected_with(result, "undeclared variable 'search_results'"));
    }

    #[test]
    fn test_rejects_path_expression() {
        let result = with_template("Q: {{user_query.text}} A: {{output}}", "output", "");
        assert!(rejected_with(result, "reads a field of text variable 'user_query'"));

        let result = with_template("Q: {{input.text}} A: {{output}}", "input, output", "");
        assert!(rejected_with(result, "'input.text'"));
    }

    #[test]
    fn test_rejects_undeclared_variable_in_else_if() {
        let result = with_template(
            "{{#if input}}{{input}}{{else if instructions}}{{instructions}}{{/if}} {{output}}",
            "output",
            "input",
        );
        assert!(rejected_with(result, "undeclared variable 'instructions'"));
    }

    #[test]
    fn test_rejects_undeclared_variable_in_subexpression() {
        let result = with_template("{{#if (eq expected_output \"\")}}none{{/if}} {{output}}", "output", "");
        assert!(rejected_with(result, "undeclared variable 'expected_output'"));
    }

    #[test]
    fn test_rejects_section_over_unknown_variable() {
        let result = with_template("{{#user_query}}x{{/user_query}} {{output}}", "output", "");
        assert!(rejected_with(result, "unknown variable 'user_query'"));
    }

    #[test]
    fn test_rejects_partials() {
        let result = with_template("{{> header}} {{output}}", "output", "");
        assert!(rejected_with(result, "partials"));
    }

    #[test]
    fn test_accepts_nested_helpers_and_block_params() {
        let def = with_template(
            "{{#each output as |line|}}{{@index}}: {{line}}{{/each}}\
             {{#if input}}{{input}}{{else if instructions}}{{instructions}}{{else}}-{{/if}}\
             {{#unless (eq search_results \"\")}}{{search_results}}{{/unless}}",
            "output",
            "input, instructions, search_results",
        )
        .unwrap();

        let placeholders = def.placeholders().unwrap();
        assert_eq!(
            placeholders.into_iter().collect::<Vec<_>>(),
            vec!["input", "instructions", "output", "search_results"]
        );
    }
}
