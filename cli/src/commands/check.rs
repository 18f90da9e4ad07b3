//! Check command - validates the configuration and builds every resource without output

use relmodel_core::RelationalModelBuilder;

use super::load_api_schema;
use crate::config::Config;
use crate::error::CliError;
use crate::output;

pub fn run(config: &Config) -> Result<(), CliError> {
    println!("{}", output::heading("Checking configuration..."));
    println!();
    println!("  {}: {}", output::label("ApiSchema"), config.api_schema.display());
    println!("  {}: {}", output::label("Format"), config.format);
    if !config.builds_all_resources() {
        println!("  {}: {}", output::label("Resources"), config.resources.join(", "));
    }
    if !config.build.require_string_max_length {
        println!("  {}", output::warning("String maxLength is not required"));
    }

    println!();
    print!("  {} ApiSchema... ", output::label("Checking"));
    let api_schema = match load_api_schema(&config.api_schema) {
        Ok(doc) => {
            println!("{}", output::status_ok());
            doc
        }
        Err(e) => {
            println!("{}", output::status_error());
            return Err(e);
        }
    };

    let builder = RelationalModelBuilder::new(config.build.clone());
    let project = if config.builds_all_resources() {
        builder.build_project(&api_schema)?
    } else {
        builder.build_endpoints(&api_schema, &config.resources)?
    };

    println!();
    for model in &project.models {
        println!(
            "  {} {} {}",
            output::status_ok(),
            model.resource,
            output::muted(&format!("({} tables)", model.tables_in_dependency_order.len()))
        );
    }
    for failure in &project.failures {
        println!("  {} {}", output::status_error(), failure.endpoint_name);
        println!("    {}", failure.error);
    }

    println!();
    if project.is_success() {
        println!("{}", output::success("All resources built."));
        Ok(())
    } else {
        Err(CliError::ResourcesFailed(project.failures.len()))
    }
}
