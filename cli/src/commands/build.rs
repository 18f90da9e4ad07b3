//! Build command - derives relational models and prints them

use std::io::Write;

use relmodel_core::{ProjectBuild, RelationalModelBuilder};
use relmodel_types::model::RelationalResourceModel;

use super::{load_api_schema, summary};
use crate::config::{Config, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn run(config: &Config) -> Result<(), CliError> {
    let api_schema = load_api_schema(&config.api_schema)?;
    let builder = RelationalModelBuilder::new(config.build.clone());

    let project = if config.builds_all_resources() {
        builder.build_project(&api_schema)?
    } else {
        builder.build_endpoints(&api_schema, &config.resources)?
    };

    tracing::debug!(
        models = project.models.len(),
        failures = project.failures.len(),
        "relmodel.build.finished"
    );

    let rendered = render(&project.models, config.format)?;
    match &config.out {
        Some(path) => {
            std::fs::write(path, rendered).map_err(|e| CliError::Io(path.clone(), e))?;
            println!(
                "{} {} model(s) to {}",
                output::success("Wrote"),
                project.models.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .map_err(|e| CliError::Io("<stdout>".into(), e))?;
        }
    }

    report_failures(&project)
}

/// Render models in the requested format, ending with a newline
pub fn render(models: &[RelationalResourceModel], format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(models)
                .map_err(|e| CliError::Other(anyhow::Error::new(e).context("failed to serialize models")))?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Summary => Ok(summary::render(models)),
    }
}

fn report_failures(project: &ProjectBuild) -> Result<(), CliError> {
    if project.is_success() {
        return Ok(());
    }

    for failure in &project.failures {
        eprintln!("{}", output::err_line(&failure.to_string()));
    }
    Err(CliError::ResourcesFailed(project.failures.len()))
}
