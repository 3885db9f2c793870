//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::criteria::Variable;

/// cruisejudge - LLM-as-judge criteria for the cruise booking agent
#[derive(Parser)]
#[command(
    name = "cj",
    about = "Render judge prompts, parse verdicts and aggregate criterion scores",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Extra criteria directory, searched after the configured paths
    #[arg(short = 'p', long = "prompts-dir", global = true)]
    pub prompts_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List loaded criteria
    Criteria {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one criterion definition
    Show {
        /// Criterion name (e.g. response_relevance)
        name: String,
    },

    /// Render a criterion's judge prompt
    Render {
        /// Criterion name
        name: String,

        /// Template variable as key=value (repeatable)
        #[arg(short, long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        var: Vec<(Variable, String)>,

        /// Template variable read from a file as key=path (repeatable)
        #[arg(long = "var-file", value_name = "KEY=PATH", value_parser = parse_var_file)]
        var_file: Vec<(Variable, PathBuf)>,
    },

    /// Parse a judge reply into a score
    Verdict {
        /// Criterion the reply belongs to
        name: String,

        /// Read the reply from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Combine criterion scores into a weighted total
    Aggregate {
        /// Criterion score as name=N (repeatable)
        #[arg(short, long = "score", value_name = "NAME=N", value_parser = parse_score)]
        score: Vec<(String, i64)>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Compare expected and actual tool calls
    ToolUsage {
        /// Comma-separated expected tools
        #[arg(short, long, default_value = "")]
        expected: String,

        /// Comma-separated tools the agent called
        #[arg(short, long, default_value = "")]
        actual: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check that the agent's SQL queries parse
    SqlSyntax {
        /// Comma-separated queries the agent ran
        #[arg(long, default_value = "")]
        queries: String,

        /// Single query, may contain commas (repeatable)
        #[arg(short, long = "query")]
        query: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cruisejudge")
        .join("logs")
        .join("cruisejudge.log")
}

/// Help footer listing the template variables and the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let variables: Vec<&str> = Variable::ALL.iter().map(Variable::as_str).collect();
    format!(
        "Template variables: {}\n\nLogs are written to: {}\n",
        variables.join(", "),
        get_log_path().display()
    )
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim(), v))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

/// Parse `key=value` into a template variable and its value
pub fn parse_var(s: &str) -> Result<(Variable, String), String> {
    let (key, value) = split_pair(s)?;
    let variable = key.parse::<Variable>().map_err(|e| e.to_string())?;
    Ok((variable, value.to_string()))
}

/// Parse `key=path` into a template variable and the file holding its value
pub fn parse_var_file(s: &str) -> Result<(Variable, PathBuf), String> {
    let (key, path) = split_pair(s)?;
    let variable = key.parse::<Variable>().map_err(|e| e.to_string())?;
    if path.is_empty() {
        return Err(format!("missing path for '{}'", key));
    }
    Ok((variable, PathBuf::from(path)))
}

/// Parse `name=N` into a criterion name and integer score
pub fn parse_score(s: &str) -> Result<(String, i64), String> {
    let (name, score) = split_pair(s)?;
    let score = score
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("score for '{}' must be an integer, got '{}'", name, score))?;
    Ok((name.to_string(), score))
}

/// Output format for listing and report commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["cj"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_criteria_json() {
        let cli = Cli::parse_from(["cj", "criteria", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Criteria {
                format: OutputFormat::Json
            })
        ));
    }

    #[test]
    fn test_cli_parse_render() {
        let cli = Cli::parse_from([
            "cj",
            "render",
            "response_coherence",
            "--var",
            "output=Two cabins left on the 12th",
            "--var-file",
            "input=question.txt",
        ]);
        if let Some(Command::Render { name, var, var_file }) = cli.command {
            assert_eq!(name, "response_coherence");
            assert_eq!(var, vec![(Variable::Output, "Two cabins left on the 12th".to_string())]);
            assert_eq!(var_file, vec![(Variable::Input, PathBuf::from("question.txt"))]);
        } else {
            panic!("Expected Render command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_variable() {
        let result = Cli::try_parse_from(["cj", "render", "x", "--var", "budget=100"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_aggregate() {
        let cli = Cli::parse_from(["cj", "aggregate", "-s", "response_relevance=5", "-s", "response_coherence=3"]);
        if let Some(Command::Aggregate { score, format }) = cli.command {
            assert_eq!(
                score,
                vec![
                    ("response_relevance".to_string(), 5),
                    ("response_coherence".to_string(), 3)
                ]
            );
            assert_eq!(format, OutputFormat::Text);
        } else {
            panic!("Expected Aggregate command");
        }
    }

    #[test]
    fn test_cli_parse_sql_syntax() {
        let cli = Cli::parse_from([
            "cj",
            "sql-syntax",
            "--queries",
            "SELECT 1,SELECT 2",
            "-q",
            "SELECT ship, price FROM sailings",
            "--format",
            "json",
        ]);
        if let Some(Command::SqlSyntax { queries, query, format }) = cli.command {
            assert_eq!(queries, "SELECT 1,SELECT 2");
            assert_eq!(query, vec!["SELECT ship, price FROM sailings".to_string()]);
            assert_eq!(format, OutputFormat::Json);
        } else {
            panic!("Expected SqlSyntax command");
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from(["cj", "criteria", "-c", "/path/to/config.yml", "--prompts-dir", "./criteria"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
        assert_eq!(cli.prompts_dir, Some(PathBuf::from("./criteria")));
    }

    #[test]
    fn test_parse_var_keeps_equals_in_value() {
        assert_eq!(
            parse_var("input=price=low?").unwrap(),
            (Variable::Input, "price=low?".to_string())
        );
        assert!(parse_var("input").is_err());
        assert!(parse_var("=value").is_err());
    }

    #[test]
    fn test_parse_var_file_requires_path() {
        assert!(parse_var_file("output=").is_err());
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("a= 4").unwrap(), ("a".to_string(), 4));
        assert_eq!(parse_score("a=-1").unwrap(), ("a".to_string(), -1));
        assert!(parse_score("a=four").is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_after_help_lists_variables() {
        let help = generate_after_help();
        assert!(help.contains("expected_response_type"));
        assert!(help.contains("cruisejudge.log"));
    }
}
