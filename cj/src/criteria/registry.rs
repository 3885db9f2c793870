//! Criterion registry
//!
//! Definitions are loaded from:
//! 1. Builtin (embedded in binary)
//! 2. Each configured directory (`*.yml` / `*.yaml`), in order
//!
//! Later definitions replace earlier ones with the same name. The registry is
//! immutable once built and can be shared across threads behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{CriterionDefinition, CriterionKind, embedded};
use crate::config::PromptsConfig;
use crate::error::{EvalError, Result};
use crate::scoring::WeightTable;

/// Read-only lookup of criterion definitions by name
#[derive(Debug, Clone, Default)]
pub struct CriterionRegistry {
    criteria: BTreeMap<String, CriterionDefinition>,
}

impl CriterionRegistry {
    /// Registry holding only the embedded definitions
    pub fn builtin() -> Result<Self> {
        debug!("CriterionRegistry::builtin: called");
        let mut registry = Self::default();
        registry.load_builtins()?;
        Ok(registry)
    }

    /// Build a registry from the configured search paths
    pub fn load(config: &PromptsConfig) -> Result<Self> {
        debug!(?config, "CriterionRegistry::load: called");
        let mut registry = Self::default();

        if config.use_builtin() {
            registry.load_builtins()?;
        } else {
            debug!("CriterionRegistry::load: builtin criteria disabled");
        }

        for dir in config.expanded_paths() {
            if dir.is_dir() {
                registry.load_from_directory(&dir)?;
            } else {
                debug!(?dir, "CriterionRegistry::load: directory does not exist, skipping");
            }
        }

        info!(count = registry.len(), "Loaded criterion definitions");
        Ok(registry)
    }

    /// Build a registry from already-parsed definitions (test fixtures, embedding callers)
    pub fn from_definitions(definitions: impl IntoIterator<Item = CriterionDefinition>) -> Result<Self> {
        debug!("CriterionRegistry::from_definitions: called");
        let mut criteria = BTreeMap::new();
        for definition in definitions {
            definition.validate()?;
            if criteria.contains_key(&definition.name) {
                return Err(EvalError::InvalidDefinition {
                    name: definition.name,
                    reason: "defined more than once".to_string(),
                });
            }
            criteria.insert(definition.name.clone(), definition);
        }
        Ok(Self { criteria })
    }

    fn load_builtins(&mut self) -> Result<()> {
        debug!("load_builtins: called");
        for name in embedded::BUILTIN_NAMES {
            let content = embedded::get_embedded(name).ok_or_else(|| EvalError::NotFound {
                name: name.to_string(),
            })?;
            let definition = CriterionDefinition::from_yaml(content, &format!("builtin:{}", name))?;
            self.criteria.insert(definition.name.clone(), definition);
        }
        debug!(count = self.criteria.len(), "load_builtins: complete");
        Ok(())
    }

    /// Load every YAML file in a directory, in file name order
    fn load_from_directory(&mut self, dir: &Path) -> Result<()> {
        debug!(?dir, "load_from_directory: called");
        let io_err = |source: std::io::Error| EvalError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
                files.push(path);
            }
        }
        files.sort();

        let mut seen = BTreeSet::new();
        for path in files {
            let definition = Self::load_from_file(&path)?;
            if !seen.insert(definition.name.clone()) {
                return Err(EvalError::DuplicateCriterion {
                    name: definition.name,
                    dir: dir.to_path_buf(),
                });
            }
            if self.criteria.contains_key(&definition.name) {
                info!(name = %definition.name, ?path, "Overriding criterion definition");
            }
            self.criteria.insert(definition.name.clone(), definition);
        }

        debug!(?dir, count = seen.len(), "load_from_directory: complete");
        Ok(())
    }

    fn load_from_file(path: &Path) -> Result<CriterionDefinition> {
        debug!(?path, "load_from_file: called");
        let content = fs::read_to_string(path).map_err(|source| EvalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CriterionDefinition::from_yaml(&content, &path.display().to_string())
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> Result<&CriterionDefinition> {
        debug!(%name, "CriterionRegistry::get: called");
        self.criteria.get(name).ok_or_else(|| EvalError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.criteria.contains_key(name)
    }

    /// Criterion names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.criteria.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CriterionDefinition> {
        self.criteria.values()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Declared weights of the judge-scored criteria
    ///
    /// Code-based criteria are scored outside the judge pipeline and are left out.
    pub fn weight_table(&self) -> WeightTable {
        debug!(count = self.criteria.len(), "CriterionRegistry::weight_table: called");
        self.criteria
            .values()
            .filter(|def| def.kind == CriterionKind::LlmAsJudge)
            .map(|def| (def.name.clone(), def.weight))
            .collect()
    }
}
