//! Error types for the CLI

use std::path::PathBuf;

use relmodel_core::BuildError;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error on {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    /// The ApiSchema file is not valid JSON
    #[error("failed to parse ApiSchema {}: {}", .0.display(), .1)]
    Json(PathBuf, #[source] serde_json::Error),

    /// The ApiSchema project block itself is unusable
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Some resources failed; each failure was already reported
    #[error("{0} resource(s) failed to build")]
    ResourcesFailed(usize),

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
