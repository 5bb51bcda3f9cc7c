//! Settings resolution for the clinic platform.
//!
//! Billing providers, diagnosis and procedure codes, visit costs and
//! similar business variables are computed from declarative rule sets
//! evaluated against per-call context values.
//!
//! The workspace is split into:
//!
//! * `settings-core`: configuration from the environment, logging setup and shared errors
//! * `settings-rules`: rule model, resolution engine, rule file loading and the named catalog
//! * `settings-cli`: the `settings` binary for checking and resolving rule sets
//!
//! This crate re-exports both libraries and offers the startup entry point
//! [`load_catalog`].

pub use settings_core::{config, logging, ConfigError, Environment, SettingsConfig, SettingsError};
pub use settings_rules::{
    load_rules, matches_condition_set, matches_rule, parse_rules, resolve_all, resolve_first,
    AllMatches, ConditionSet, ConditionValue, Context, EvaluationMode, Predicate, ResolvedSettings,
    RuleDefinition, RuleError, RulesResult, SettingsCatalog, SettingsEngine,
};

use tracing::info;

/// Reads `SETTINGS_*` configuration and loads the rule set catalog it points to.
pub fn load_catalog() -> Result<SettingsCatalog, RuleError> {
    let config = SettingsConfig::from_env()?;
    load_catalog_with(&config)
}

/// Loads the catalog described by an already built configuration.
pub fn load_catalog_with(config: &SettingsConfig) -> Result<SettingsCatalog, RuleError> {
    let catalog = SettingsCatalog::from_config(config)?;
    info!(
        environment = config.environment.as_str(),
        strict = config.strict,
        sets = ?catalog.names(),
        "settings catalog ready"
    );
    Ok(catalog)
}
