//! Code-based checks
//!
//! Deterministic evaluators that run beside the judge. Their scores are
//! reported on their own and are not folded into the judge aggregate.

mod sql_syntax;
mod tool_usage;

pub use sql_syntax::{SqlSyntaxError, SqlSyntaxReport, check_sql_syntax, parse_query_list};
pub use tool_usage::{ToolUsageReport, check_tool_usage, parse_tool_list};
