//! Core shared library for the clinic settings workspace.
//!
//! This crate exposes the primitives the engine and the CLI depend on:
//! common errors, configuration loading from the environment and logging
//! setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{Environment, SettingsConfig};
pub use errors::{ConfigError, Result as CoreResult, SettingsError};
