use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use settings_core::SettingsConfig;
use tracing::info;

use crate::condition::EvaluationMode;
use crate::context::Context;
use crate::engine::SettingsEngine;
use crate::error::RuleError;
use crate::loader::{load_from_file, rule_files};
use crate::resolution::{AllMatches, ResolvedSettings};
use crate::rule::RuleDefinition;

/// Named, immutable rule sets loaded once at startup (e.g. `billing`,
/// `diagnosis`, `procedures`) and shared by every caller.
#[derive(Debug, Default, Clone)]
pub struct SettingsCatalog {
    sets: BTreeMap<String, Arc<SettingsEngine>>,
    mode: EvaluationMode,
}

impl SettingsCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode applied to rule sets inserted after this call.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Loads one rule set per rule file in `dir`, named after the file stem.
    pub fn from_dir(dir: impl AsRef<Path>, mode: EvaluationMode) -> Result<Self, RuleError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RuleError::MissingPath(dir.display().to_string()));
        }

        let mut catalog = Self::new().with_mode(mode);
        for file in rule_files(dir)? {
            let name = file
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| RuleError::parse_error(&file, "file name is not valid UTF-8"))?;
            let rules = load_from_file(&file)?;
            catalog.insert(name, rules);
        }

        info!(path = %dir.display(), sets = catalog.len(), "loaded settings catalog");
        Ok(catalog)
    }

    /// Builds the catalog described by the process configuration.
    ///
    /// A directory containing a sub-directory named after the configured
    /// environment loads from that sub-directory. A single file becomes one
    /// rule set named after its stem.
    pub fn from_config(config: &SettingsConfig) -> Result<Self, RuleError> {
        let path = config.require_rules_path()?;
        let mode = if config.strict {
            EvaluationMode::Strict
        } else {
            EvaluationMode::Lenient
        };

        if path.is_dir() {
            let per_environment = path.join(config.environment.as_str());
            if per_environment.is_dir() {
                return Self::from_dir(per_environment, mode);
            }
            return Self::from_dir(path, mode);
        }

        if !path.exists() {
            return Err(RuleError::MissingPath(path.display().to_string()));
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("default")
            .to_string();
        let mut catalog = Self::new().with_mode(mode);
        catalog.insert(name, load_from_file(path)?);
        Ok(catalog)
    }

    /// Inserts or replaces a rule set, returning the engine built for it.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        rules: Vec<RuleDefinition>,
    ) -> Arc<SettingsEngine> {
        let engine = Arc::new(SettingsEngine::new(rules).with_mode(self.mode));
        self.sets.insert(name.into(), Arc::clone(&engine));
        engine
    }

    /// Returns the engine for `name`.
    pub fn engine(&self, name: &str) -> Result<Arc<SettingsEngine>, RuleError> {
        self.sets
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownRuleSet(name.to_string()))
    }

    /// Names of the loaded rule sets, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.sets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn resolve_first<I>(
        &self,
        set: &str,
        variables: I,
        context: &Context,
    ) -> Result<ResolvedSettings, RuleError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Ok(self.engine(set)?.resolve_first(variables, context))
    }

    pub fn resolve_all<I>(
        &self,
        set: &str,
        variables: I,
        context: &Context,
    ) -> Result<AllMatches, RuleError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Ok(self.engine(set)?.resolve_all(variables, context))
    }
}
