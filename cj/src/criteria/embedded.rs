//! Builtin criterion definitions
//!
//! These are compiled into the binary from the YAML files in `prompts/`.

use tracing::debug;

pub const RESPONSE_RELEVANCE: &str = include_str!("../../../prompts/response_relevance.yml");
pub const RESPONSE_COMPLETENESS: &str = include_str!("../../../prompts/response_completeness.yml");
pub const RESPONSE_COHERENCE: &str = include_str!("../../../prompts/response_coherence.yml");
pub const QUERY_UNDERSTANDING: &str = include_str!("../../../prompts/query_understanding.yml");
pub const INSTRUCTION_FOLLOWING: &str = include_str!("../../../prompts/instruction_following.yml");
pub const SEMANTIC_SEARCH_QUALITY: &str = include_str!("../../../prompts/semantic_search_quality.yml");

/// Names of the builtin criteria, in criterion-id order
pub const BUILTIN_NAMES: [&str; 6] = [
    "response_relevance",
    "response_completeness",
    "response_coherence",
    "query_understanding",
    "instruction_following",
    "semantic_search_quality",
];

/// Get the embedded definition YAML by criterion name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "response_relevance" => Some(RESPONSE_RELEVANCE),
        "response_completeness" => Some(RESPONSE_COMPLETENESS),
        "response_coherence" => Some(RESPONSE_COHERENCE),
        "query_understanding" => Some(QUERY_UNDERSTANDING),
        "instruction_following" => Some(INSTRUCTION_FOLLOWING),
        "semantic_search_quality" => Some(SEMANTIC_SEARCH_QUALITY),
        _ => {
            debug!(%name, "get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionDefinition;

    #[test]
    fn test_every_builtin_is_embedded() {
        for name in BUILTIN_NAMES {
            assert!(get_embedded(name).is_some(), "missing builtin {}", name);
        }
    }

    #[test]
    fn test_builtin_names_match_file_contents() {
        for name in BUILTIN_NAMES {
            let def = CriterionDefinition::from_yaml(get_embedded(name).unwrap(), name).unwrap();
            assert_eq!(def.name, name);
        }
    }

    #[test]
    fn test_relevance_prompt_asks_for_score_and_justification() {
        assert!(RESPONSE_RELEVANCE.contains("Score:"));
        assert!(RESPONSE_RELEVANCE.contains("Justification:"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("tool_usage_check").is_none());
    }
}
