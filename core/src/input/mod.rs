//! Input extraction
//!
//! Turns the loosely-typed ApiSchema JSON for one resource into a
//! [`ResourceSchemaInput`]: compiled identity paths, reference mappings,
//! uniqueness constraints, overrides and per-path column metadata. Every
//! structural problem fails here, before any derivation runs.

mod descriptors;
pub(crate) mod json;
mod metadata;
mod overrides;
mod project;
mod references;
mod uniqueness;

use std::collections::{BTreeMap, BTreeSet};

use relmodel_types::JsonPathExpression;
use relmodel_types::model::{DbSchemaName, DocumentReferenceMapping, QualifiedResourceName};
use serde_json::Value;

pub use descriptors::{DescriptorPathIndex, DescriptorPathInfo, DescriptorPathMap};
pub use json::JsonObject;
pub use metadata::DecimalValidation;
pub use overrides::{NameOverride, NameOverrideKind, RelationalOverrides};
pub use project::ProjectSchema;
pub use uniqueness::ArrayUniquenessConstraint;

use self::json::{compile, entry_str, optional_bool, optional_str, require_bool, require_str};
use crate::error::{BuildError, Result};
use crate::naming::{normalize_schema_name, to_pascal_case};
use crate::options::BuildOptions;

const RESOURCE_SCHEMA: &str = "ResourceSchema";

/// Everything the derivation steps need to know about one resource
#[derive(Debug, Clone)]
pub struct ResourceSchemaInput<'a> {
    pub project_name: String,
    pub project_endpoint_name: String,
    pub project_version: Option<String>,
    pub endpoint_name: String,
    pub resource_name: String,
    pub is_descriptor: bool,
    pub is_resource_extension: bool,
    pub superclass_resource_name: Option<String>,
    pub allow_identity_updates: bool,
    pub json_schema_for_insert: &'a JsonObject,
    pub identity_json_paths: Vec<JsonPathExpression>,
    pub document_references: Vec<DocumentReferenceMapping>,
    pub array_uniqueness_constraints: Vec<ArrayUniquenessConstraint>,
    pub overrides: RelationalOverrides,
    pub descriptor_paths: DescriptorPathMap,
    pub decimal_validations: BTreeMap<String, DecimalValidation>,
    pub string_max_length_omissions: BTreeSet<String>,
    pub options: BuildOptions,
    label: String,
    identity_set: BTreeSet<String>,
}

impl ResourceSchemaInput<'_> {
    #[must_use]
    pub fn resource(&self) -> QualifiedResourceName {
        QualifiedResourceName::new(&self.project_name, &self.resource_name)
    }

    /// `project:resource`, used in every diagnostic
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn physical_schema(&self) -> DbSchemaName {
        normalize_schema_name(&self.project_endpoint_name)
    }

    /// Root table name before any collection suffix
    #[must_use]
    pub fn root_base_name(&self) -> String {
        self.overrides
            .root_table_name
            .clone()
            .unwrap_or_else(|| to_pascal_case(&self.resource_name))
    }

    #[must_use]
    pub fn is_identity_path(&self, canonical: &str) -> bool {
        self.identity_set.contains(canonical)
    }

    #[must_use]
    pub fn descriptor_path(&self, canonical: &str) -> Option<&DescriptorPathInfo> {
        self.descriptor_paths.get(canonical)
    }

    #[must_use]
    pub fn decimal_validation(&self, canonical: &str) -> Option<&DecimalValidation> {
        self.decimal_validations.get(canonical)
    }

    /// Override of the given kind registered at `canonical`
    #[must_use]
    pub fn name_override(&self, canonical: &str, kind: NameOverrideKind) -> Option<&NameOverride> {
        self.overrides
            .name_overrides
            .get(canonical)
            .filter(|o| o.kind == kind)
    }

    /// Reference paths of every document reference
    #[must_use]
    pub fn reference_identity_paths(&self) -> BTreeSet<&str> {
        self.document_references
            .iter()
            .flat_map(DocumentReferenceMapping::reference_paths)
            .map(JsonPathExpression::canonical)
            .collect()
    }

    /// Object paths of every document reference
    #[must_use]
    pub fn reference_object_paths(&self) -> BTreeSet<&str> {
        self.document_references
            .iter()
            .map(|r| r.reference_object_path.canonical())
            .collect()
    }
}

/// Extract the inputs of the resource registered under `endpoint_name`
pub fn extract_inputs<'a>(
    api_schema_root: &'a Value,
    endpoint_name: &str,
    options: &BuildOptions,
) -> Result<ResourceSchemaInput<'a>> {
    let project = ProjectSchema::parse(api_schema_root)?;
    let descriptors = DescriptorPathIndex::build(&project, options)?;
    extract_resource(&project, &descriptors, endpoint_name, options)
}

/// Per-resource extraction against an already-built descriptor index
pub(crate) fn extract_resource<'a>(
    project: &ProjectSchema<'a>,
    descriptors: &DescriptorPathIndex,
    endpoint_name: &str,
    options: &BuildOptions,
) -> Result<ResourceSchemaInput<'a>> {
    let schema = project.resource_schema(endpoint_name)?;

    let resource_name = require_str(schema, "resourceName", RESOURCE_SCHEMA)
        .map_err(|e| e.for_resource(&format!("{}:{endpoint_name}", project.project_name)))?
        .to_string();
    let label = format!("{}:{resource_name}", project.project_name);

    resource_inputs(project, descriptors, endpoint_name, options, schema, resource_name, &label)
        .map_err(|e| e.for_resource(&label))
}

fn resource_inputs<'a>(
    project: &ProjectSchema<'a>,
    descriptors: &DescriptorPathIndex,
    endpoint_name: &str,
    options: &BuildOptions,
    schema: &'a JsonObject,
    resource_name: String,
    label: &str,
) -> Result<ResourceSchemaInput<'a>> {
    let is_descriptor = require_bool(schema, "isDescriptor", RESOURCE_SCHEMA)?;
    let is_resource_extension = optional_bool(schema, "isResourceExtension", RESOURCE_SCHEMA)?;
    let allow_identity_updates = optional_bool(schema, "allowIdentityUpdates", RESOURCE_SCHEMA)?;
    let superclass_resource_name = optional_str(schema, "superclassResourceName", RESOURCE_SCHEMA)?
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let json_schema_for_insert = match schema.get("jsonSchemaForInsert") {
        Some(Value::Object(insert)) => insert,
        None | Some(Value::Null) => {
            return Err(BuildError::shape(
                "Expected jsonSchemaForInsert to be on ResourceSchema, invalid ApiSchema.",
            ));
        }
        Some(_) => {
            return Err(BuildError::shape(
                "Expected jsonSchemaForInsert to be an object, invalid ApiSchema.",
            ));
        }
    };

    let identity_json_paths = identity_json_paths(schema, label)?;
    let identity_set: BTreeSet<String> = identity_json_paths
        .iter()
        .map(|p| p.canonical().to_string())
        .collect();

    let document_references = references::document_reference_mappings(schema, label, &identity_set)?;

    let array_uniqueness_constraints = uniqueness::array_uniqueness_constraints(schema, label)?;
    uniqueness::validate_reference_coverage(&array_uniqueness_constraints, &document_references, label)?;

    let overrides = overrides::relational_overrides(
        schema,
        &overrides::OverrideContext {
            label,
            resource_name: &resource_name,
            project_name: &project.project_name,
            project_endpoint_name: &project.project_endpoint_name,
            is_descriptor,
            is_resource_extension,
            json_schema_for_insert,
            references: &document_references,
        },
    )?;

    let descriptor_paths = descriptors
        .paths_for(&QualifiedResourceName::new(&project.project_name, &resource_name))
        .cloned()
        .unwrap_or_default();

    Ok(ResourceSchemaInput {
        project_name: project.project_name.clone(),
        project_endpoint_name: project.project_endpoint_name.clone(),
        project_version: project.project_version.clone(),
        endpoint_name: endpoint_name.to_string(),
        is_descriptor,
        is_resource_extension,
        superclass_resource_name,
        allow_identity_updates,
        json_schema_for_insert,
        identity_json_paths,
        document_references,
        array_uniqueness_constraints,
        overrides,
        descriptor_paths,
        decimal_validations: metadata::decimal_validations(schema, label)?,
        string_max_length_omissions: metadata::string_max_length_omissions(schema, label)?,
        options: options.clone(),
        resource_name,
        label: label.to_string(),
        identity_set,
    })
}

fn identity_json_paths(schema: &JsonObject, label: &str) -> Result<Vec<JsonPathExpression>> {
    let entries = match schema.get("identityJsonPaths") {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => {
            return Err(BuildError::shape(
                "Expected identityJsonPaths to be present, invalid ApiSchema.",
            ));
        }
        Some(_) => {
            return Err(BuildError::shape(
                "Expected identityJsonPaths to be an array, invalid ApiSchema.",
            ));
        }
    };

    let mut seen = BTreeSet::new();
    let mut paths = Vec::with_capacity(entries.len());

    for entry in entries {
        let path = compile(entry_str(entry, "identityJsonPaths")?, label)?;
        if !seen.insert(path.canonical().to_string()) {
            return Err(BuildError::shape(format!(
                "identityJsonPaths on resource '{label}' contains duplicate path '{path}'."
            )));
        }
        paths.push(path);
    }

    Ok(paths)
}
