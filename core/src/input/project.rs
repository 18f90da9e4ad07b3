//! Project-level view of an ApiSchema document

use serde_json::Value;

use super::json::{JsonObject, as_object, optional_object, optional_str, require_str};
use crate::error::{BuildError, Result};

/// The `projectSchema` block of an ApiSchema document
#[derive(Debug, Clone)]
pub struct ProjectSchema<'a> {
    pub project_name: String,
    pub project_endpoint_name: String,
    pub project_version: Option<String>,
    resource_schemas: &'a JsonObject,
    abstract_resources: Option<&'a JsonObject>,
}

impl<'a> ProjectSchema<'a> {
    /// Read `projectSchema` from an ApiSchema root
    pub fn parse(api_schema_root: &'a Value) -> Result<Self> {
        let root = as_object(Some(api_schema_root), "ApiSchema root")?;
        let project = as_object(root.get("projectSchema"), "projectSchema")?;

        Ok(Self {
            project_name: require_str(project, "projectName", "projectSchema")?.to_string(),
            project_endpoint_name: require_str(project, "projectEndpointName", "projectSchema")?
                .to_string(),
            project_version: optional_str(project, "projectVersion", "projectSchema")?
                .map(str::to_string),
            resource_schemas: as_object(
                project.get("resourceSchemas"),
                "projectSchema.resourceSchemas",
            )?,
            abstract_resources: optional_object(
                project,
                "abstractResources",
                "projectSchema.abstractResources",
            )?,
        })
    }

    /// Resource endpoint names in ordinal order
    #[must_use]
    pub fn endpoint_names(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = self.resource_schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The resource schema registered under `endpoint`
    pub fn resource_schema(&self, endpoint: &str) -> Result<&'a JsonObject> {
        match self.resource_schemas.get(endpoint) {
            Some(Value::Object(schema)) => Ok(schema),
            Some(_) => Err(BuildError::shape(format!(
                "Expected projectSchema.resourceSchemas.{endpoint} to be an object, invalid ApiSchema."
            ))),
            None => Err(BuildError::shape(format!(
                "Resource '{endpoint}' was not found in projectSchema.resourceSchemas of project '{}'.",
                self.project_name
            ))),
        }
    }

    /// Concrete and abstract resources keyed by resource name, ordered by name
    pub(crate) fn all_resources(&self) -> Result<Vec<(&'a str, &'a JsonObject)>> {
        let mut resources = Vec::new();
        let sources = [
            Some((self.resource_schemas, "projectSchema.resourceSchemas")),
            self.abstract_resources
                .map(|a| (a, "projectSchema.abstractResources")),
        ];

        for (schemas, what) in sources.into_iter().flatten() {
            for (key, value) in schemas {
                let Value::Object(schema) = value else {
                    return Err(BuildError::shape(format!(
                        "Expected {what}.{key} to be an object, invalid ApiSchema."
                    )));
                };
                let name = match schema.get("resourceName") {
                    Some(Value::String(name)) if !name.is_empty() => name.as_str(),
                    _ => key.as_str(),
                };
                resources.push((name, schema));
            }
        }

        resources.sort_by(|a, b| a.0.cmp(b.0));
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_lookup() {
        let doc = json!({
            "projectSchema": {
                "projectName": "Ed-Fi",
                "projectEndpointName": "ed-fi",
                "projectVersion": "5.0.0",
                "resourceSchemas": {
                    "students": { "resourceName": "Student" },
                    "schools": { "resourceName": "School" }
                }
            }
        });
        let project = ProjectSchema::parse(&doc).unwrap();
        assert_eq!(project.endpoint_names(), vec!["schools", "students"]);
        assert_eq!(project.project_version.as_deref(), Some("5.0.0"));
        assert!(project.resource_schema("schools").is_ok());

        let err = project.resource_schema("sections").unwrap_err();
        assert!(err.message().contains("'sections'"));
    }

    #[test]
    fn test_missing_project_schema() {
        let err = ProjectSchema::parse(&json!({})).unwrap_err();
        assert!(matches!(err, BuildError::SchemaShape(_)));
    }
}
