//! cruisejudge - LLM-as-judge criteria CLI
//!
//! CLI entry point for listing criteria, rendering judge prompts, parsing
//! judge replies and aggregating scores.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use cruisejudge::checks::{check_sql_syntax, check_tool_usage, parse_query_list, parse_tool_list};
use cruisejudge::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use cruisejudge::config::Config;
use cruisejudge::criteria::{CriterionRegistry, Variable};
use cruisejudge::prompts::{EvaluationInput, Formatter};
use cruisejudge::scoring::{ScoreAggregator, ScoreResult, parse_verdict};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > env/config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level early (before full config load): env var, then config file
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.prompts_dir {
        debug!(?dir, "main: adding prompts dir from command line");
        config.prompts.paths.push(dir.display().to_string());
    }

    let registry = CriterionRegistry::load(&config.prompts).context("Failed to load criterion definitions")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Criteria { format }) => cmd_criteria(&registry, format),
        Some(Command::Show { name }) => cmd_show(&registry, &name),
        Some(Command::Render { name, var, var_file }) => cmd_render(&registry, &name, var, var_file),
        Some(Command::Verdict { name, file, format }) => cmd_verdict(&registry, &name, file.as_deref(), format),
        Some(Command::Aggregate { score, format }) => cmd_aggregate(&config, &registry, score, format),
        Some(Command::ToolUsage {
            expected,
            actual,
            format,
        }) => cmd_tool_usage(&expected, &actual, format),
        Some(Command::SqlSyntax { queries, query, format }) => cmd_sql_syntax(&queries, query, format),
        None => {
            debug!("main: no command, listing criteria");
            cmd_criteria(&registry, OutputFormat::Text)
        }
    }
}

fn cmd_criteria(registry: &CriterionRegistry, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_criteria: called");
    match format {
        OutputFormat::Json => {
            let criteria: Vec<_> = registry.iter().collect();
            println!("{}", serde_json::to_string_pretty(&criteria)?);
        }
        OutputFormat::Text => {
            println!("{}", "Criteria".bold());
            println!("--------");
            for definition in registry.iter() {
                println!(
                    "{:>3}  {:<28} {:>5.2}  {:<13} {}",
                    definition.criterion_id,
                    definition.name.cyan(),
                    definition.weight,
                    definition.kind.to_string(),
                    definition.display_name()
                );
            }
            println!();
            println!("Total judge weight: {:.2}", registry.weight_table().total());
        }
    }
    Ok(())
}

fn cmd_show(registry: &CriterionRegistry, name: &str) -> Result<()> {
    debug!(%name, "cmd_show: called");
    let definition = registry.get(name)?;

    let join = |vars: &std::collections::BTreeSet<Variable>| {
        vars.iter().map(Variable::as_str).collect::<Vec<_>>().join(", ")
    };

    println!("{} ({})", definition.display_name().bold(), definition.name.cyan());
    if !definition.description.is_empty() {
        println!("{}", definition.description);
    }
    println!();
    println!("  id:       {}", definition.criterion_id);
    println!("  type:     {}", definition.kind);
    println!("  weight:   {:.2}", definition.weight);
    println!("  range:    {}", definition.score_range);
    println!("  required: {}", join(&definition.required_variables));
    println!("  optional: {}", join(&definition.optional_variables));
    println!();
    println!("{}", "Template".bold());
    println!("{}", definition.template);
    Ok(())
}

fn cmd_render(
    registry: &CriterionRegistry,
    name: &str,
    vars: Vec<(Variable, String)>,
    var_files: Vec<(Variable, PathBuf)>,
) -> Result<()> {
    debug!(%name, vars = vars.len(), var_files = var_files.len(), "cmd_render: called");
    let definition = registry.get(name)?;

    let mut input = EvaluationInput::new();
    for (variable, path) in var_files {
        let value = fs::read_to_string(&path).context(format!("Failed to read {} from {}", variable, path.display()))?;
        input.insert(variable, value.trim_end_matches('\n'));
    }
    for (variable, value) in vars {
        if input.insert(variable, value).is_some() {
            warn!(%variable, "Variable given more than once, last value wins");
        }
    }

    let prompt = Formatter::new().format(definition, &input)?;
    println!("{}", prompt);
    Ok(())
}

fn cmd_verdict(registry: &CriterionRegistry, name: &str, file: Option<&Path>, format: OutputFormat) -> Result<()> {
    debug!(%name, ?file, ?format, "cmd_verdict: called");
    registry.get(name)?;

    let reply = match file {
        Some(path) => fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read judge reply from stdin")?;
            buf
        }
    };

    let result = parse_verdict(name, &reply)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            println!("{}: {}/5", result.criterion.cyan(), result.score.to_string().bold());
            if !result.justification.is_empty() {
                println!("{}", result.justification);
            }
        }
    }
    Ok(())
}

fn cmd_aggregate(
    config: &Config,
    registry: &CriterionRegistry,
    scores: Vec<(String, i64)>,
    format: OutputFormat,
) -> Result<()> {
    debug!(scores = scores.len(), ?format, "cmd_aggregate: called");
    let results = scores
        .into_iter()
        .map(|(name, score)| ScoreResult::new(name, score, ""))
        .collect::<cruisejudge::Result<Vec<_>>>()?;

    let aggregator = ScoreAggregator::new(config.weight_table(registry)?);
    let report = aggregator.aggregate_results(&results)?;

    let ignored: Vec<&str> = results
        .iter()
        .map(|r| r.criterion.as_str())
        .filter(|name| aggregator.weights().get(name).is_none())
        .collect();
    for name in &ignored {
        warn!(criterion = %name, "Score has no weight, ignored");
    }

    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&report)?;
            if let Some(object) = value.as_object_mut() {
                object.insert("normalized".to_string(), serde_json::json!(report.normalized()));
                object.insert("ignored".to_string(), serde_json::json!(ignored));
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            for c in &report.contributions {
                println!(
                    "{:<28} {}/5  x {:.2}  = {:.4}",
                    c.criterion.cyan(),
                    c.score,
                    c.weight,
                    c.contribution
                );
            }
            for name in &report.unscored {
                println!("{:<28} {}", name.dimmed(), "not scored".dimmed());
            }
            for name in &ignored {
                println!("{:<28} {}", name.yellow(), "no weight, ignored".yellow());
            }
            println!();
            println!("Total:      {}", format!("{:.4}", report.total).bold());
            if let Some(normalized) = report.normalized() {
                println!("Normalized: {:.4} (of weight {:.2})", normalized, report.covered_weight);
            }
        }
    }
    Ok(())
}

fn cmd_tool_usage(expected: &str, actual: &str, format: OutputFormat) -> Result<()> {
    debug!(%expected, %actual, ?format, "cmd_tool_usage: called");
    let report = check_tool_usage(&parse_tool_list(expected), &parse_tool_list(actual));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Tool usage: {}", format!("{:.2}", report.score).bold());
            for (label, tools) in [
                ("matched", &report.matched),
                ("missing", &report.missing),
                ("unexpected", &report.unexpected),
            ] {
                if !tools.is_empty() {
                    println!("  {:<11} {}", format!("{}:", label), tools.join(", "));
                }
            }
        }
    }
    Ok(())
}

fn cmd_sql_syntax(list: &str, single: Vec<String>, format: OutputFormat) -> Result<()> {
    debug!(%list, single = single.len(), ?format, "cmd_sql_syntax: called");
    let mut queries = parse_query_list(list);
    queries.extend(single);
    let report = check_sql_syntax(&queries);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "SQL syntax: {} ({} checked)",
                format!("{:.2}", report.score).bold(),
                report.checked
            );
            for error in &report.errors {
                println!("  {} {}", error.query.red(), error.message.dimmed());
            }
        }
    }
    Ok(())
}
