//! Template variables
//!
//! The closed set of placeholder names a criterion template may reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EvalError;

/// A named placeholder in a criterion template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    /// The user query sent to the agent
    Input,
    /// The agent's response
    Output,
    /// What kind of answer the golden dataset expects (e.g. "itinerary list")
    ExpectedResponseType,
    /// Reference answer from the golden dataset
    ExpectedOutput,
    /// Prior turns of the conversation
    ConversationHistory,
    /// Operating instructions given to the agent
    Instructions,
    /// Records returned by semantic search
    SearchResults,
}

impl Variable {
    pub const ALL: [Variable; 7] = [
        Variable::Input,
        Variable::Output,
        Variable::ExpectedResponseType,
        Variable::ExpectedOutput,
        Variable::ConversationHistory,
        Variable::Instructions,
        Variable::SearchResults,
    ];

    /// Placeholder name as written in templates
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::ExpectedResponseType => "expected_response_type",
            Self::ExpectedOutput => "expected_output",
            Self::ConversationHistory => "conversation_history",
            Self::Instructions => "instructions",
            Self::SearchResults => "search_results",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Variable {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Variable::from_str: called");
        Variable::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| EvalError::UnknownVariable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_roundtrips_every_variable() {
        for var in Variable::ALL {
            assert_eq!(var.as_str().parse::<Variable>().unwrap(), var);
        }
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "query".parse::<Variable>().unwrap_err();
        assert!(matches!(err, EvalError::UnknownVariable(ref name) if name == "query"));
    }

    #[test]
    fn test_deserialize_snake_case() {
        let vars: Vec<Variable> = serde_yaml::from_str("[input, expected_response_type, search_results]").unwrap();
        assert_eq!(
            vars,
            vec![Variable::Input, Variable::ExpectedResponseType, Variable::SearchResults]
        );
    }

    #[test]
    fn test_deserialize_rejects_unknown() {
        let result: Result<Vec<Variable>, _> = serde_yaml::from_str("[input, user_query]");
        assert!(result.is_err());
    }
}
