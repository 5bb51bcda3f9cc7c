use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use colored::*;
use serde::Serialize;
use serde_json::Value;
use settings_core::{ConfigError, SettingsConfig};
use settings_rules::{Context, RuleError, SettingsEngine};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("{0}")]
    InvalidArgument(String),
    #[error("failed to render output: {0}")]
    Output(String),
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value.to_string())
    }
}

/// Picks the rules path from the flag, falling back to `SETTINGS_RULES_PATH`.
pub fn rules_path(flag: Option<PathBuf>, config: &SettingsConfig) -> Result<PathBuf, CliError> {
    match flag {
        Some(path) => Ok(path),
        None => Ok(config.require_rules_path()?.clone()),
    }
}

/// Splits `key=value`. The value is read as JSON when possible, otherwise
/// kept as a plain string, so `bmi=31` is a number and `state=CA` a string.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), CliError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        CliError::InvalidArgument(format!("expected key=value, got '{}'", raw))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "missing field name in '{}'",
            raw
        )));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Builds the evaluation context from an optional JSON file plus `--set`
/// assignments, which override the file.
pub fn build_context(file: Option<&Path>, assignments: &[String]) -> Result<Context, CliError> {
    let mut context = match file {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|err| CliError::Io {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
            let value: Value = serde_json::from_str(&raw).map_err(|err| {
                CliError::InvalidArgument(format!("{} is not valid JSON: {}", path.display(), err))
            })?;
            Context::from_value(value)?
        }
        None => Context::new(),
    };

    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        context.insert(key, value);
    }

    Ok(context)
}

/// Shape of a loaded rule set, as printed by `settings check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSetSummary {
    pub rules: usize,
    pub unconditional: usize,
    pub condition_sets: usize,
    pub variables: Vec<String>,
    pub fields: Vec<String>,
}

impl RuleSetSummary {
    pub fn from_engine(engine: &SettingsEngine) -> Self {
        let rules = engine.rules();
        let fields: BTreeSet<&str> = rules
            .iter()
            .flat_map(|rule| rule.conditions.iter())
            .flat_map(|set| set.fields())
            .collect();

        Self {
            rules: rules.len(),
            unconditional: rules.iter().filter(|rule| rule.is_unconditional()).count(),
            condition_sets: rules.iter().map(|rule| rule.conditions.len()).sum(),
            variables: engine.variables().into_iter().map(str::to_string).collect(),
            fields: fields.into_iter().map(str::to_string).collect(),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_summary(path: &Path, summary: &RuleSetSummary) {
    println!(
        "{} {}",
        "✔ Rule set loaded:".green().bold(),
        path.display().to_string().bold()
    );
    println!("  Rules: {}", summary.rules);
    println!("  Unconditional rules: {}", summary.unconditional);
    println!("  Condition sets: {}", summary.condition_sets);
    println!("  Variables: {}", summary.variables.join(", "));
    println!("  Context fields: {}", summary.fields.join(", "));
}

pub fn print_unresolved(names: &[&str]) {
    if names.is_empty() {
        return;
    }
    eprintln!(
        "{} {}",
        "⚠ Unresolved:".yellow().bold(),
        names.join(", ")
    );
}
