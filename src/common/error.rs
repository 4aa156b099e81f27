//! Error types for stepcheck
//!
//! Assertion outcomes are not errors: they are [`crate::assertions::Failure`]
//! values copied into step reports. This type covers everything that stops
//! the engine itself from doing its job.

use std::io;
use thiserror::Error;

use crate::executor::ExecutorError;
use crate::value::DecodeError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stepcheck
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Step Errors ===
    #[error("Unknown executor '{name}'. Available: {available}")]
    UnknownExecutor { name: String, available: String },

    #[error("Cannot decode step for executor '{executor}': {message}")]
    Decode { executor: String, message: String },

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}

impl Error {
    /// Create an unknown executor error listing the registered names
    pub fn unknown_executor<S: AsRef<str>>(name: &str, available: &[S]) -> Self {
        Self::UnknownExecutor {
            name: name.to_string(),
            available: available
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a decode error for an executor's configuration
    pub fn decode(executor: &str, error: &DecodeError) -> Self {
        Self::Decode {
            executor: executor.to_string(),
            message: error.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
