//! Init command - writes a starter relmodel.config.toml

use std::path::Path;

use anyhow::{Context, bail};

use crate::config::{CONFIG_FILE, OutputFormat};
use crate::output;

pub fn run(dir: &Path, api_schema: &str, format: OutputFormat) -> anyhow::Result<()> {
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() {
        bail!("{CONFIG_FILE} already exists. Delete it first to reinitialize.");
    }

    std::fs::write(&config_path, template(api_schema, format))
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("{}", output::success(&format!("Created {CONFIG_FILE}")));
    println!();
    println!("Next steps:");
    println!("  1. Point apiSchema at your ApiSchema.json");
    println!("  2. Run {} to list its resources", output::heading("relmodel list"));
    println!("  3. Run {} to derive the models", output::heading("relmodel build"));

    Ok(())
}

fn template(api_schema: &str, format: OutputFormat) -> String {
    format!(
        r#"# relmodel configuration

apiSchema = "{api_schema}"

# Endpoint names to build; leave empty to build every resource
resources = []

# "summary" or "json"
format = "{format}"

[build]
requireStringMaxLength = true
descriptorNameSuffix = "Descriptor"
"#
    )
}
