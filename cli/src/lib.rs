//! relmodel CLI - compile ApiSchema resources into relational models
//!
//! This crate provides a standalone CLI tool driven by a
//! `relmodel.config.toml` file.
//!
//! # Quick Start
//!
//! 1. Install the CLI: `cargo install relmodel-cli`
//! 2. Run `relmodel init` to create a `relmodel.config.toml`
//! 3. Run `relmodel build` to print the derived models
//!
//! # Configuration
//!
//! ```toml
//! apiSchema = "./ApiSchema.json"
//! resources = ["schools"]
//! format = "json"
//!
//! [build]
//! requireStringMaxLength = false
//! ```
//!
//! # Commands
//!
//! - `relmodel init` - Create a new relmodel.config.toml
//! - `relmodel list` - List the resources in the ApiSchema
//! - `relmodel build` - Build the configured resources and print them
//! - `relmodel check` - Build everything and report per-resource status

pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use config::{Config, Error as ConfigError, OutputFormat};
pub use error::CliError;
