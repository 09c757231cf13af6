//! Output formats and CLI errors.

use cbos_bench::{ConfigError, EngineError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How command results are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// Plain text lines.
    Plain,
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// The benchmark could not start.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Every pass could not be completed.
    #[error("benchmark run {0} finished with failures")]
    RunFailed(String),

    /// Output could not be produced.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Settings could not be loaded.
    #[error("settings error: {0:#}")]
    Settings(#[from] anyhow::Error),
}

impl CliError {
    /// Creates a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
