//! relmodel CLI - Main entry point

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use relmodel_cli::config::{Config, ConfigError, OutputFormat};
use relmodel_cli::error::CliError;

/// relmodel - derive relational models from ApiSchema resources
#[derive(Parser, Debug)]
#[command(name = "relmodel")]
#[command(author, version, about = "Derive relational models from ApiSchema resources", long_about = None)]
struct Cli {
    /// Path to config file (default: relmodel.config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ApiSchema file, overrides the config (usable without a config file)
    #[arg(long, global = true, value_name = "PATH")]
    api_schema: Option<PathBuf>,

    /// Log pipeline steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build resources and print their relational models
    Build {
        /// Endpoint name to build (repeatable, default: config or all)
        #[arg(short, long = "resource", value_name = "ENDPOINT")]
        resources: Vec<String>,

        /// Output format (summary or json)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Allow string properties without maxLength
        #[arg(long)]
        allow_unbounded_strings: bool,
    },

    /// List the resources declared by the ApiSchema
    List,

    /// Build every configured resource and report status
    Check,

    /// Initialize a new relmodel.config.toml configuration file
    Init {
        /// ApiSchema path written into the config
        #[arg(long, default_value = "ApiSchema.json")]
        schema: String,

        /// Output format written into the config
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Stderr subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Init { schema, format } => {
            relmodel_cli::commands::init::run(Path::new("."), &schema, format).map_err(Into::into)
        }
        Command::Build {
            resources,
            format,
            out,
            allow_unbounded_strings,
        } => {
            let mut config = load_config(cli.config.as_deref(), cli.api_schema)?;
            if !resources.is_empty() {
                config.resources = resources;
            }
            if let Some(format) = format {
                config.format = format;
            }
            if out.is_some() {
                config.out = out;
            }
            if allow_unbounded_strings {
                config.build.require_string_max_length = false;
            }
            relmodel_cli::commands::build::run(&config)
        }
        Command::List => {
            let config = load_config(cli.config.as_deref(), cli.api_schema)?;
            relmodel_cli::commands::list::run(&config)
        }
        Command::Check => {
            let config = load_config(cli.config.as_deref(), cli.api_schema)?;
            relmodel_cli::commands::check::run(&config)
        }
    }
}

/// Load configuration with fallback to default path
///
/// A missing default config is fine when `--api-schema` is given.
fn load_config(custom_path: Option<&Path>, api_schema: Option<PathBuf>) -> Result<Config, CliError> {
    let loaded = match custom_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match (loaded, api_schema) {
        (Ok(mut config), Some(api_schema)) => {
            config.api_schema = api_schema;
            Ok(config)
        }
        (Ok(config), None) => Ok(config),
        (Err(ConfigError::NotFound(_)), Some(api_schema)) if custom_path.is_none() => {
            Ok(Config::for_api_schema(api_schema))
        }
        (Err(e), _) => Err(e.into()),
    }
}
