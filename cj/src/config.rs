//! cruisejudge configuration types and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::criteria::CriterionRegistry;
use crate::scoring::WeightTable;

/// Extra criteria directory, searched after the configured paths
pub const ENV_PROMPTS_DIR: &str = "CRUISEJUDGE_PROMPTS_DIR";
/// Log level override
pub const ENV_LOG_LEVEL: &str = "CRUISEJUDGE_LOG_LEVEL";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Where criterion definitions are loaded from
    pub prompts: PromptsConfig,

    /// Aggregation settings
    pub scoring: ScoringConfig,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .cruisejudge.yml
        let local_config = PathBuf::from(".cruisejudge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/cruisejudge/cruisejudge.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("cruisejudge").join("cruisejudge.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Log level from the environment or config file, read before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            return Some(level);
        }

        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".cruisejudge.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("cruisejudge").join("cruisejudge.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        debug!("Config::apply_env: called");
        if let Some(dir) = lookup(ENV_PROMPTS_DIR).filter(|d| !d.trim().is_empty()) {
            debug!(%dir, "Config::apply_env: adding prompts dir from environment");
            self.prompts.paths.push(dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.trim().is_empty()) {
            debug!(%level, "Config::apply_env: log level from environment");
            self.log_level = Some(level);
        }
    }

    /// Weight table to aggregate with: the configured override, or the registry's declared weights
    pub fn weight_table(&self, registry: &CriterionRegistry) -> Result<WeightTable> {
        debug!(overridden = self.scoring.weights.is_some(), "Config::weight_table: called");
        let Some(weights) = &self.scoring.weights else {
            return Ok(registry.weight_table());
        };

        let table = WeightTable::from(weights.clone());
        table.validate().context("Invalid scoring.weights in config")?;
        for (name, _) in table.iter() {
            if !registry.contains(name) {
                tracing::warn!(criterion = %name, "Weight configured for unknown criterion");
            }
        }
        Ok(table)
    }
}

/// Criterion definition search paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Paths to search for criterion definitions (searched in order, later overrides earlier)
    pub paths: Vec<String>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            paths: vec![
                "builtin".to_string(),
                "~/.config/cruisejudge/criteria".to_string(),
                ".cruisejudge/criteria".to_string(),
            ],
        }
    }
}

impl PromptsConfig {
    /// Expand paths (resolve ~/ and relative paths)
    pub fn expanded_paths(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .filter_map(|p| {
                if p == "builtin" {
                    None // builtin is handled specially
                } else if let Some(rest) = p.strip_prefix("~/") {
                    dirs::home_dir().map(|home| home.join(rest))
                } else {
                    Some(PathBuf::from(p))
                }
            })
            .collect()
    }

    /// Check if builtin definitions should be loaded
    pub fn use_builtin(&self) -> bool {
        self.paths.iter().any(|p| p == "builtin")
    }
}

/// Aggregation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Replaces the declared criterion weights when set
    pub weights: Option<BTreeMap<String, f64>>,
}
