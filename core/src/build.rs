//! Resource and project builds

use relmodel_types::model::RelationalResourceModel;
use serde_json::Value;
use thiserror::Error;

use crate::collision::CollisionDetector;
use crate::error::{BuildError, Result};
use crate::input::{DescriptorPathIndex, ProjectSchema, ResourceSchemaInput, extract_inputs, extract_resource};
use crate::options::BuildOptions;
use crate::relmodel_trace_failure;
use crate::steps::{
    canonicalize, derive_columns, derive_table_scopes, discover_extension_sites, validate_json_schema,
};

/// Compiles ApiSchema resources into relational models
///
/// # Example
///
/// ```
/// use relmodel_core::{BuildOptions, RelationalModelBuilder};
/// use serde_json::json;
///
/// let api_schema = json!({
///     "projectSchema": {
///         "projectName": "Ed-Fi",
///         "projectEndpointName": "ed-fi",
///         "resourceSchemas": {
///             "schools": {
///                 "resourceName": "School",
///                 "isDescriptor": false,
///                 "identityJsonPaths": ["$.schoolId"],
///                 "documentPathsMapping": {
///                     "SchoolId": { "isReference": false, "path": "$.schoolId" }
///                 },
///                 "jsonSchemaForInsert": {
///                     "type": "object",
///                     "properties": { "schoolId": { "type": "integer" } },
///                     "required": ["schoolId"]
///                 }
///             }
///         }
///     }
/// });
///
/// let builder = RelationalModelBuilder::new(BuildOptions::default());
/// let model = builder.build_resource(&api_schema, "schools").unwrap();
/// assert_eq!(model.root.table.to_string(), "edfi.School");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelationalModelBuilder {
    options: BuildOptions,
}

impl RelationalModelBuilder {
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the resource registered under `endpoint_name`
    pub fn build_resource(
        &self,
        api_schema_root: &Value,
        endpoint_name: &str,
    ) -> Result<RelationalResourceModel> {
        let input = extract_inputs(api_schema_root, endpoint_name, &self.options)?;
        build_from_input(&input)
    }

    /// Build every resource in endpoint-name order
    ///
    /// Only project-level problems fail the call; each resource's failure is
    /// collected into [`ProjectBuild::failures`].
    pub fn build_project(&self, api_schema_root: &Value) -> Result<ProjectBuild> {
        let project = ProjectSchema::parse(api_schema_root)?;
        let endpoints: Vec<&str> = project.endpoint_names();
        self.build_with(&project, &endpoints)
    }

    /// Build the named resources, in the order given
    pub fn build_endpoints<S: AsRef<str>>(
        &self,
        api_schema_root: &Value,
        endpoint_names: &[S],
    ) -> Result<ProjectBuild> {
        let project = ProjectSchema::parse(api_schema_root)?;
        let endpoints: Vec<&str> = endpoint_names.iter().map(AsRef::as_ref).collect();
        self.build_with(&project, &endpoints)
    }

    fn build_with(&self, project: &ProjectSchema<'_>, endpoints: &[&str]) -> Result<ProjectBuild> {
        let descriptors = DescriptorPathIndex::build(project, &self.options)?;
        let mut build = ProjectBuild::default();

        for &endpoint in endpoints {
            let result = extract_resource(project, &descriptors, endpoint, &self.options)
                .and_then(|input| build_from_input(&input));

            match result {
                Ok(model) => build.models.push(model),
                Err(error) => {
                    relmodel_trace_failure!(endpoint, error);
                    build.failures.push(ResourceBuildError {
                        endpoint_name: endpoint.to_string(),
                        error,
                    });
                }
            }
        }

        Ok(build)
    }
}

/// Run the pipeline over extracted inputs, with a fresh collision detector
pub fn build_from_input(input: &ResourceSchemaInput<'_>) -> Result<RelationalResourceModel> {
    run_pipeline(input).map_err(|e| e.for_resource(input.label()))
}

fn run_pipeline(input: &ResourceSchemaInput<'_>) -> Result<RelationalResourceModel> {
    validate_json_schema(input)?;
    let extension_sites = discover_extension_sites(input)?;

    let mut detector = CollisionDetector::new();
    let scopes = derive_table_scopes(input, &mut detector)?;
    let bound = derive_columns(input, scopes, &mut detector)?;

    let Some(root) = bound.tables.first().cloned() else {
        return Err(BuildError::shape(format!(
            "Root table scope '$' was not found on resource '{}'.",
            input.label()
        )));
    };

    Ok(canonicalize(RelationalResourceModel {
        resource: bound.resource,
        physical_schema: bound.physical_schema,
        storage_kind: bound.storage_kind,
        root,
        tables_in_dependency_order: bound.tables,
        descriptor_edge_sources: bound.descriptor_edge_sources,
        document_references: input.document_references.clone(),
        extension_sites,
    }))
}

// =============================================================================
// Project results
// =============================================================================

/// One resource that failed to build
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint_name}: {error}")]
pub struct ResourceBuildError {
    pub endpoint_name: String,
    #[source]
    pub error: BuildError,
}

/// Models and failures from a multi-resource build
#[derive(Debug, Clone, Default)]
pub struct ProjectBuild {
    pub models: Vec<RelationalResourceModel>,
    pub failures: Vec<ResourceBuildError>,
}

impl ProjectBuild {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Model for `resource_name`, if it built
    #[must_use]
    pub fn model(&self, resource_name: &str) -> Option<&RelationalResourceModel> {
        self.models
            .iter()
            .find(|m| m.resource.resource_name == resource_name)
    }
}
