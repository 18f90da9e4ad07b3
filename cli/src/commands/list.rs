//! List command - shows the resources an ApiSchema declares

use relmodel_core::input::ProjectSchema;
use serde_json::Value;

use super::load_api_schema;
use crate::config::Config;
use crate::error::CliError;
use crate::output;

pub fn run(config: &Config) -> Result<(), CliError> {
    let api_schema = load_api_schema(&config.api_schema)?;
    let project = ProjectSchema::parse(&api_schema)?;

    println!(
        "{} {}",
        output::heading(&project.project_name),
        output::muted(&format!("({})", project.project_endpoint_name))
    );

    for endpoint in project.endpoint_names() {
        let schema = project.resource_schema(endpoint)?;
        let resource_name = schema.get("resourceName").and_then(Value::as_str).unwrap_or("?");
        let is_descriptor = schema.get("isDescriptor").and_then(Value::as_bool).unwrap_or(false);

        let selected = config.builds_all_resources() || config.resources.iter().any(|r| r == endpoint);
        let marker = if selected { "*" } else { " " };
        let kind = if is_descriptor { output::muted(" descriptor") } else { String::new() };

        println!("  {marker} {} {resource_name}{kind}", output::label(endpoint));
    }

    Ok(())
}
