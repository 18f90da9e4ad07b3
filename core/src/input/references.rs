//! `documentPathsMapping` extraction
//!
//! Produces the document reference mappings of a resource and checks that
//! every identity path is covered by some mapping entry.

use std::collections::{BTreeMap, BTreeSet};

use relmodel_types::JsonPathExpression;
use relmodel_types::model::{DocumentReferenceMapping, QualifiedResourceName, ReferenceJsonPathBinding};
use serde_json::Value;

use super::json::{JsonObject, compile, entry_object, optional_bool, require_bool, require_str};
use crate::error::{BuildError, Result};

const ENTRY: &str = "documentPathsMapping entry";

/// Reference mappings in mapping-key order
pub(crate) fn document_reference_mappings(
    resource_schema: &JsonObject,
    label: &str,
    identity_paths: &BTreeSet<String>,
) -> Result<Vec<DocumentReferenceMapping>> {
    let mapping = match resource_schema.get("documentPathsMapping") {
        None | Some(Value::Null) => None,
        Some(Value::Object(mapping)) => Some(mapping),
        Some(_) => {
            return Err(BuildError::shape(
                "Expected documentPathsMapping to be an object, invalid ApiSchema.",
            ));
        }
    };

    let mut entries: Vec<(&String, &Value)> = mapping.map(|m| m.iter().collect()).unwrap_or_default();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut mapped: BTreeSet<String> = BTreeSet::new();
    let mut references = Vec::new();

    for (key, entry) in entries {
        let entry = entry_object(entry, "documentPathsMapping")?;

        let is_reference = require_bool(entry, "isReference", ENTRY)?;
        if !is_reference || require_bool(entry, "isDescriptor", ENTRY)? {
            // Scalar and descriptor entries cover their own path
            let path = compile(require_str(entry, "path", ENTRY)?, label)?;
            mapped.insert(path.canonical().to_string());
            continue;
        }

        let reference = reference_mapping(key, entry, label, identity_paths)?;
        mapped.extend(reference.reference_paths().map(|p| p.canonical().to_string()));
        references.push(reference);
    }

    let missing: Vec<&str> = identity_paths
        .iter()
        .filter(|p| !mapped.contains(*p))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return Err(BuildError::IdentityCompleteness(format!(
            "identityJsonPaths on resource '{label}' were not found in documentPathsMapping: {}.",
            missing.join(", ")
        )));
    }

    Ok(references)
}

fn reference_mapping(
    key: &str,
    entry: &JsonObject,
    label: &str,
    identity_paths: &BTreeSet<String>,
) -> Result<DocumentReferenceMapping> {
    let bindings = match entry.get("referenceJsonPaths") {
        None => {
            return Err(BuildError::shape(format!(
                "documentPathsMapping entry '{key}' on resource '{label}' is missing referenceJsonPaths."
            )));
        }
        Some(Value::Null) => {
            return Err(BuildError::shape(format!(
                "documentPathsMapping entry '{key}' on resource '{label}' has null referenceJsonPaths."
            )));
        }
        Some(Value::Array(bindings)) if bindings.is_empty() => {
            return Err(BuildError::shape(format!(
                "documentPathsMapping entry '{key}' on resource '{label}' has no referenceJsonPaths entries."
            )));
        }
        Some(Value::Array(bindings)) => bindings,
        Some(_) => {
            return Err(BuildError::shape(
                "Expected referenceJsonPaths to be an array on documentPathsMapping entry, invalid ApiSchema.",
            ));
        }
    };

    let mut object_path: Option<JsonPathExpression> = None;
    let mut by_identity: BTreeMap<String, String> = BTreeMap::new();
    let mut compiled = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let binding = entry_object(binding, "referenceJsonPaths")?;
        let identity_json_path = compile(
            require_str(binding, "identityJsonPath", "referenceJsonPaths entry")?,
            label,
        )?;
        let reference_json_path = compile(
            require_str(binding, "referenceJsonPath", "referenceJsonPaths entry")?,
            label,
        )?;

        if reference_json_path.last_property().is_none() {
            return Err(BuildError::shape(format!(
                "referenceJsonPath '{reference_json_path}' on documentPathsMapping entry '{key}' \
                 for resource '{label}' must end with a property segment."
            )));
        }
        let Some(prefix) = reference_json_path.parent() else {
            return Err(BuildError::shape(format!(
                "referenceJsonPath '{reference_json_path}' on documentPathsMapping entry '{key}' \
                 for resource '{label}' must end with a property segment."
            )));
        };

        match &object_path {
            None => object_path = Some(prefix),
            Some(existing) if *existing != prefix => {
                return Err(BuildError::shape(format!(
                    "documentPathsMapping entry '{key}' on resource '{label}' has inconsistent \
                     referenceJsonPaths prefix '{existing}' and '{prefix}'."
                )));
            }
            Some(_) => {}
        }

        if let Some(existing) = by_identity.get(identity_json_path.canonical()) {
            return Err(BuildError::shape(format!(
                "documentPathsMapping entry '{key}' on resource '{label}' has duplicate identityJsonPath \
                 '{identity_json_path}' mapped to '{existing}' and '{reference_json_path}'."
            )));
        }
        by_identity.insert(
            identity_json_path.canonical().to_string(),
            reference_json_path.canonical().to_string(),
        );

        compiled.push(ReferenceJsonPathBinding {
            identity_json_path,
            reference_json_path,
        });
    }

    let Some(reference_object_path) = object_path else {
        return Err(BuildError::shape(format!(
            "documentPathsMapping entry '{key}' on resource '{label}' has no referenceJsonPaths entries."
        )));
    };

    let is_part_of_identity = compiled
        .iter()
        .any(|b| identity_paths.contains(b.reference_json_path.canonical()));

    if is_part_of_identity {
        let mut missing: Vec<&str> = compiled
            .iter()
            .map(|b| b.reference_json_path.canonical())
            .filter(|p| !identity_paths.contains(*p))
            .collect();
        missing.sort_unstable();

        if !missing.is_empty() {
            return Err(BuildError::IdentityCompleteness(format!(
                "documentPathsMapping entry '{key}' on resource '{label}' has reference identity paths \
                 for '{reference_object_path}' but identityJsonPaths is missing reference path(s): {}",
                missing.join(", ")
            )));
        }
    }

    let target_resource = QualifiedResourceName::new(
        require_str(entry, "projectName", ENTRY)?,
        require_str(entry, "resourceName", ENTRY)?,
    );
    let is_required = optional_bool(entry, "isRequired", ENTRY)?;

    if is_part_of_identity && !is_required {
        return Err(BuildError::IdentityCompleteness(format!(
            "documentPathsMapping entry '{key}' on resource '{label}' is mapped to identityJsonPaths \
             but isRequired is false. Identity references must be required."
        )));
    }

    Ok(DocumentReferenceMapping {
        mapping_key: key.to_string(),
        target_resource,
        is_required,
        is_part_of_identity,
        reference_object_path,
        bindings: compiled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LABEL: &str = "Ed-Fi:StudentSchoolAssociation";

    fn obj(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn identity(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    fn school_reference(is_required: bool) -> Value {
        json!({
            "isReference": true,
            "isDescriptor": false,
            "isRequired": is_required,
            "projectName": "Ed-Fi",
            "resourceName": "School",
            "referenceJsonPaths": [
                { "identityJsonPath": "$.schoolId", "referenceJsonPath": "$.schoolReference.schoolId" }
            ]
        })
    }

    #[test]
    fn test_identity_reference_is_extracted() {
        let schema = obj(json!({
            "documentPathsMapping": {
                "School": school_reference(true),
                "EntryDate": { "isReference": false, "path": "$.entryDate" }
            }
        }));
        let ids = identity(&["$.entryDate", "$.schoolReference.schoolId"]);

        let mappings = document_reference_mappings(&schema, LABEL, &ids).unwrap();
        assert_eq!(mappings.len(), 1);
        assert!(mappings[0].is_part_of_identity);
        assert_eq!(mappings[0].reference_object_path.canonical(), "$.schoolReference");
    }

    #[test]
    fn test_optional_identity_reference_fails() {
        let schema = obj(json!({ "documentPathsMapping": { "School": school_reference(false) } }));
        let ids = identity(&["$.schoolReference.schoolId"]);

        let err = document_reference_mappings(&schema, LABEL, &ids).unwrap_err();
        assert!(err.message().contains("Identity references must be required."));
    }

    #[test]
    fn test_unmapped_identity_path_fails() {
        let schema = obj(json!({ "documentPathsMapping": {} }));
        let ids = identity(&["$.studentUniqueId"]);

        let err = document_reference_mappings(&schema, LABEL, &ids).unwrap_err();
        assert!(matches!(err, BuildError::IdentityCompleteness(_)));
        assert!(err.message().ends_with("documentPathsMapping: $.studentUniqueId."));
    }

    #[test]
    fn test_inconsistent_prefix_fails() {
        let schema = obj(json!({
            "documentPathsMapping": {
                "School": {
                    "isReference": true,
                    "isDescriptor": false,
                    "projectName": "Ed-Fi",
                    "resourceName": "School",
                    "referenceJsonPaths": [
                        { "identityJsonPath": "$.schoolId", "referenceJsonPath": "$.schoolReference.schoolId" },
                        { "identityJsonPath": "$.localId", "referenceJsonPath": "$.other.localId" }
                    ]
                }
            }
        }));

        let err = document_reference_mappings(&schema, LABEL, &BTreeSet::new()).unwrap_err();
        assert!(err.message().contains("inconsistent referenceJsonPaths prefix"));
    }

    #[test]
    fn test_empty_reference_paths_fail() {
        let schema = obj(json!({
            "documentPathsMapping": {
                "School": {
                    "isReference": true,
                    "isDescriptor": false,
                    "projectName": "Ed-Fi",
                    "resourceName": "School",
                    "referenceJsonPaths": []
                }
            }
        }));

        let err = document_reference_mappings(&schema, LABEL, &BTreeSet::new()).unwrap_err();
        assert!(err.message().contains("has no referenceJsonPaths entries"));
    }
}
