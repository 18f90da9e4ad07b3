//! Shared ApiSchema fixtures
#![allow(dead_code)]

use relmodel_core::{BuildOptions, RelationalModelBuilder, Result};
use relmodel_types::model::RelationalResourceModel;
use serde_json::{Value, json};

/// Wrap resource schemas (keyed by endpoint name) in an Ed-Fi project document
pub fn api_schema(resources: Value) -> Value {
    json!({
        "projectSchema": {
            "projectName": "Ed-Fi",
            "projectEndpointName": "ed-fi",
            "projectVersion": "5.2.0",
            "resourceSchemas": resources
        }
    })
}

/// Resource with only scalar mapping entries for its identity paths
pub fn resource(name: &str, identity: &[&str], insert: Value) -> Value {
    let mapping: serde_json::Map<String, Value> = identity
        .iter()
        .map(|path| {
            let key = path.trim_start_matches("$.").replace('.', "_");
            (key, json!({ "isReference": false, "path": path }))
        })
        .collect();

    json!({
        "resourceName": name,
        "isDescriptor": false,
        "allowIdentityUpdates": false,
        "identityJsonPaths": identity,
        "documentPathsMapping": mapping,
        "jsonSchemaForInsert": insert
    })
}

pub fn string(max_length: u32) -> Value {
    json!({ "type": "string", "maxLength": max_length })
}

pub fn object(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

pub fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

/// School: identity `schoolId`, a name, and a collection of addresses
pub fn school() -> Value {
    resource(
        "School",
        &["$.schoolId"],
        object(
            json!({
                "schoolId": { "type": "integer" },
                "nameOfInstitution": string(75),
                "addresses": array_of(object(
                    json!({ "city": string(30), "postalCode": string(17) }),
                    &["city"],
                )),
            }),
            &["schoolId", "nameOfInstitution"],
        ),
    )
}

/// Add a descriptor mapping entry to a resource fixture
pub fn with_descriptor(mut resource: Value, key: &str, path: &str, descriptor: &str) -> Value {
    resource["documentPathsMapping"][key] = json!({
        "isReference": true,
        "isDescriptor": true,
        "projectName": "Ed-Fi",
        "resourceName": descriptor,
        "path": path
    });
    resource
}

pub fn build(doc: &Value, endpoint: &str) -> Result<RelationalResourceModel> {
    RelationalModelBuilder::new(BuildOptions::default()).build_resource(doc, endpoint)
}
