//! CLI command implementations
//!
//! Each command module implements one relmodel subcommand.

pub mod build;
pub mod check;
pub mod init;
pub mod list;
pub mod summary;

use std::path::Path;

use serde_json::Value;

use crate::error::CliError;

/// Read and parse an ApiSchema document
pub fn load_api_schema(path: &Path) -> Result<Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io(path.into(), e))?;
    serde_json::from_str(&content).map_err(|e| CliError::Json(path.into(), e))
}
