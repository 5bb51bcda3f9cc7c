use std::io;

use thiserror::Error;

/// Result type used across the settings core crate.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Canonical error representation shared by the workspace crates.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("logging setup failed: {0}")]
    LoggingError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::DeserializationError(err.to_string())
    }
}

impl From<anyhow::Error> for SettingsError {
    fn from(err: anyhow::Error) -> Self {
        SettingsError::GeneralError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable is missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {value}")]
    InvalidEnvVar { key: String, value: String },
}

impl From<ConfigError> for SettingsError {
    fn from(value: ConfigError) -> Self {
        SettingsError::ConfigError(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_with_context() {
        let err: SettingsError = ConfigError::InvalidEnvVar {
            key: "SETTINGS_STRICT".into(),
            value: "maybe".into(),
        }
        .into();

        let message = err.to_string();
        assert!(message.contains("SETTINGS_STRICT"));
        assert!(message.contains("maybe"));
    }

    #[test]
    fn json_errors_become_deserialization_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            SettingsError::from(err),
            SettingsError::DeserializationError(_)
        ));
    }
}
