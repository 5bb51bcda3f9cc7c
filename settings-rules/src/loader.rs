use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::RuleError;
use crate::rule::RuleDefinition;

const RULE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Loads a rule set from a file, or from every rule file in a directory.
///
/// Directory entries are read in file name order and concatenated, so the
/// resulting rule order is deterministic.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<RuleDefinition>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let rules = if path.is_dir() {
        let mut rules = Vec::new();
        for file in rule_files(path)? {
            rules.append(&mut load_from_file(&file)?);
        }
        rules
    } else {
        load_from_file(path)?
    };

    info!(path = %path.display(), rules = rules.len(), "loaded rule set");
    Ok(rules)
}

/// Parses a rule set from raw YAML or JSON text.
pub fn parse_rules(raw: &str, origin: impl AsRef<Path>) -> Result<Vec<RuleDefinition>, RuleError> {
    let mut attempts = Vec::new();

    match serde_yaml::from_str::<RuleSetDocument>(raw) {
        Ok(doc) => return Ok(doc.rules),
        Err(err) => attempts.push(format!("rules document ({})", err)),
    }

    match serde_yaml::from_str::<Vec<RuleDefinition>>(raw) {
        Ok(list) => return Ok(list),
        Err(err) => attempts.push(format!("list ({})", err)),
    }

    match serde_yaml::from_str::<RuleDefinition>(raw) {
        Ok(rule) => return Ok(vec![rule]),
        Err(err) => attempts.push(format!("single rule ({})", err)),
    }

    let message = format!("no supported layout matched: {}", attempts.join("; "));
    Err(RuleError::parse_error(origin.as_ref(), message))
}

/// Rule files directly inside `dir`, sorted by file name.
pub(crate) fn rule_files(dir: &Path) -> Result<Vec<PathBuf>, RuleError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| RuleError::from_io(dir, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(dir, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        let is_rule_file = path
            .extension()
            .and_then(|value| value.to_str())
            .map(|ext| RULE_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if is_rule_file {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub(crate) fn load_from_file(path: &Path) -> Result<Vec<RuleDefinition>, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_rules(&raw, path)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSetDocument {
    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,
    rules: Vec<RuleDefinition>,
}
