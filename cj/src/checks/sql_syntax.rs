//! SQL syntax check
//!
//! Parses every query the agent ran. A run scores 1.0 only when it ran at
//! least one query and all of them parse.

use serde::Serialize;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use super::parse_tool_list;

/// A query that failed to parse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlSyntaxError {
    pub query: String,
    pub message: String,
}

/// Outcome of parsing the agent's SQL queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlSyntaxReport {
    /// 1.0 or 0.0
    pub score: f64,
    pub checked: usize,
    pub errors: Vec<SqlSyntaxError>,
}

/// Split a comma-separated query list, trimming entries and dropping empties
///
/// Commas inside a query split it too; pass such queries individually.
pub fn parse_query_list(list: &str) -> Vec<String> {
    parse_tool_list(list)
}

fn parse_one(query: &str) -> Result<(), String> {
    match Parser::parse_sql(&GenericDialect {}, query) {
        Ok(statements) if statements.is_empty() => Err("no SQL statement found".to_string()),
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

/// Score SQL syntax
///
/// - no queries: 0.0
/// - any query fails to parse: 0.0
/// - otherwise 1.0
pub fn check_sql_syntax<Q: AsRef<str>>(queries: &[Q]) -> SqlSyntaxReport {
    let queries: Vec<&str> = queries.iter().map(|q| q.as_ref().trim()).filter(|q| !q.is_empty()).collect();
    debug!(queries = queries.len(), "check_sql_syntax: called");

    let errors: Vec<SqlSyntaxError> = queries
        .iter()
        .filter_map(|query| {
            parse_one(query).err().map(|message| SqlSyntaxError {
                query: query.to_string(),
                message,
            })
        })
        .collect();

    let score = if queries.is_empty() || !errors.is_empty() { 0.0 } else { 1.0 };

    debug!(%score, errors = errors.len(), "check_sql_syntax: complete");
    SqlSyntaxReport {
        score,
        checked: queries.len(),
        errors,
    }
}
