use std::env;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::{ConfigError, SettingsError};

const DEFAULT_PREFIX: &str = "SETTINGS_";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }

    /// Lowercase name, as used in rule set directory layouts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Process level configuration for anything embedding the settings engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsConfig {
    /// File or directory holding the rule sets.
    pub rules_path: Option<PathBuf>,
    pub environment: Environment,
    /// Whether missing context fields should fail constraints instead of
    /// being skipped.
    pub strict: bool,
    pub log_level: Option<String>,
}

impl SettingsConfig {
    /// Loads configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_PREFIX)
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `BILLING_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(prefix, |key| env::var(key).ok())?;
        debug!(
            prefix,
            environment = config.environment.as_str(),
            strict = config.strict,
            "loaded settings configuration"
        );
        Ok(config)
    }

    fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let rules_path = lookup(&key("RULES_PATH"))
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        let environment = lookup(&key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let strict_key = key("STRICT");
        let strict = match lookup(&strict_key) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidEnvVar {
                key: strict_key,
                value: raw,
            })?,
            None => false,
        };

        let log_level = lookup(&key("LOG_LEVEL"));

        Ok(Self {
            rules_path,
            environment,
            strict,
            log_level,
        })
    }

    /// Returns the rules path or a configuration error naming the variable.
    pub fn require_rules_path(&self) -> Result<&PathBuf, ConfigError> {
        self.rules_path
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar(format!("{}RULES_PATH", DEFAULT_PREFIX)))
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Helper that loads config and converts to the canonical settings error type.
pub fn load_settings_config() -> Result<SettingsConfig, SettingsError> {
    Ok(SettingsConfig::from_env()?)
}
