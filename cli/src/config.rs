//! Configuration for the relmodel CLI
//!
//! Handles loading `relmodel.config.toml`.

use relmodel_core::BuildOptions;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "relmodel.config.toml";

// ============================================================================
// Output format
// ============================================================================

/// How derived models are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table listing
    #[default]
    Summary,
    /// The models serialized as a JSON array
    Json,
}

impl OutputFormat {
    pub const ALL: &'static [&'static str] = &["summary", "json"];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "invalid format '{s}', expected one of: {}",
                Self::ALL.join(", ")
            )),
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// Contents of `relmodel.config.toml`
///
/// ```toml
/// apiSchema = "./ApiSchema.json"
/// resources = ["schools", "students"]
/// format = "json"
///
/// [build]
/// requireStringMaxLength = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// ApiSchema document, relative paths resolve against the config file
    pub api_schema: PathBuf,
    /// Endpoint names to build; empty builds every resource
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Write output here instead of stdout
    #[serde(default)]
    pub out: Option<PathBuf>,
    #[serde(default)]
    pub build: BuildOptions,
}

impl Config {
    /// Config for a bare ApiSchema path, used when no config file exists
    pub fn for_api_schema(api_schema: impl Into<PathBuf>) -> Self {
        Self {
            api_schema: api_schema.into(),
            resources: Vec::new(),
            format: OutputFormat::default(),
            out: None,
            build: BuildOptions::default(),
        }
    }

    /// Load from default config file
    pub fn load() -> Result<Self, Error> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load from specific path
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.into())
            } else {
                Error::Io(path.into(), e)
            }
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| Error::Parse(path.into(), e))?;

        if config.api_schema.is_relative() {
            if let Some(dir) = path.parent() {
                config.api_schema = dir.join(&config.api_schema);
            }
        }
        if let Some(out) = config.out.as_mut() {
            if out.is_relative() {
                if let Some(dir) = path.parent() {
                    *out = dir.join(&*out);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.api_schema.as_os_str().is_empty() {
            return Err(Error::Invalid("apiSchema must not be empty".into()));
        }

        let mut seen = BTreeSet::new();
        for name in &self.resources {
            if name.trim().is_empty() {
                return Err(Error::Invalid("resources must not contain empty names".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::Invalid(format!("resource '{name}' is listed more than once")));
            }
        }

        Ok(())
    }

    /// True when every resource in the ApiSchema should be built
    #[inline]
    pub fn builds_all_resources(&self) -> bool {
        self.resources.is_empty()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigError = Error;

// ============================================================================
// Tests
// ============================================================================
