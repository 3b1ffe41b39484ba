//! CLI error types

use std::path::PathBuf;
use thiserror::Error;

/// CLI error type
///
/// Compilation failures are not errors here: they are reported as
/// diagnostics and turn into a non-zero exit status.
#[derive(Error, Debug)]
pub enum CliError {
    /// Source or attachment could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Console output failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
