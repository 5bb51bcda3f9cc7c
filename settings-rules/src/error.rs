use std::path::PathBuf;

use settings_core::ConfigError;
use thiserror::Error;

/// Result type used by the rules crate.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Errors raised around the engine: loading rule sets and interpreting
/// resolved values. Resolution itself never fails.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules from {path}: {message}")]
    Parse { path: String, message: String },
    #[error("no rule resolved variable `{name}`")]
    Unresolved { name: String },
    #[error("resolved value for `{name}` has an unexpected shape: {message}")]
    InvalidValue { name: String, message: String },
    #[error("unknown rule set: {0}")]
    UnknownRuleSet(String),
    #[error("invalid context: {0}")]
    InvalidContext(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        RuleError::Unresolved { name: name.into() }
    }
}
