//! `relational` override block
//!
//! Root table renames and per-path physical name overrides. Paths on
//! resource extensions are re-rooted under `_ext.<projectKey>` so they line
//! up with the paths the extension schema actually declares.

use std::collections::{BTreeMap, BTreeSet};

use relmodel_types::model::DocumentReferenceMapping;
use relmodel_types::{JsonPathExpression, JsonPathSegment};
use serde_json::Value;

use super::json::JsonObject;
use crate::error::{BuildError, Result};
use crate::naming::{EXTENSION_PROPERTY, to_pascal_case};

/// What an override renames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameOverrideKind {
    /// A scalar or descriptor column
    Column,
    /// A collection table (path ends in `[*]`)
    Collection,
}

/// One `relational.nameOverrides` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOverride {
    /// Key as written in the ApiSchema
    pub raw_key: String,
    /// Key after compilation and extension re-rooting
    pub path: JsonPathExpression,
    pub kind: NameOverrideKind,
    /// PascalCase-normalised physical name
    pub name: String,
}

/// Parsed `relational` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationalOverrides {
    pub root_table_name: Option<String>,
    /// Keyed by canonical path
    pub name_overrides: BTreeMap<String, NameOverride>,
}

/// Facts about the resource the override rules depend on
pub(crate) struct OverrideContext<'a> {
    pub label: &'a str,
    pub resource_name: &'a str,
    pub project_name: &'a str,
    pub project_endpoint_name: &'a str,
    pub is_descriptor: bool,
    pub is_resource_extension: bool,
    pub json_schema_for_insert: &'a JsonObject,
    pub references: &'a [DocumentReferenceMapping],
}

pub(crate) fn relational_overrides(
    resource_schema: &JsonObject,
    ctx: &OverrideContext<'_>,
) -> Result<RelationalOverrides> {
    let label = ctx.label;
    let relational = match resource_schema.get("relational") {
        None => return Ok(RelationalOverrides::default()),
        Some(_) if ctx.is_descriptor => {
            return Err(BuildError::InvalidOverride(format!(
                "Descriptor resource '{label}' must not define relational overrides."
            )));
        }
        Some(Value::Null) => return Ok(RelationalOverrides::default()),
        Some(Value::Object(relational)) => relational,
        Some(_) => {
            return Err(BuildError::shape(format!(
                "Expected relational to be an object for resource '{label}'."
            )));
        }
    };

    Ok(RelationalOverrides {
        root_table_name: root_table_name(relational, ctx)?,
        name_overrides: name_overrides(relational, ctx)?,
    })
}

fn root_table_name(relational: &JsonObject, ctx: &OverrideContext<'_>) -> Result<Option<String>> {
    let label = ctx.label;
    let text = match relational.get("rootTableNameOverride") {
        None => return Ok(None),
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::String(_) | Value::Null) => {
            return Err(BuildError::InvalidOverride(format!(
                "relational.rootTableNameOverride must be non-empty on resource '{label}'."
            )));
        }
        Some(_) => {
            return Err(BuildError::InvalidOverride(format!(
                "relational.rootTableNameOverride must be a string on resource '{label}'."
            )));
        }
    };

    let normalized = to_pascal_case(text);
    if normalized.is_empty() {
        return Err(BuildError::InvalidOverride(format!(
            "relational.rootTableNameOverride must normalize to a non-empty name on resource '{label}'."
        )));
    }

    if ctx.is_resource_extension {
        let expected = format!("{}Extension", to_pascal_case(ctx.resource_name));
        if normalized != expected {
            return Err(BuildError::InvalidOverride(format!(
                "relational.rootTableNameOverride is not supported for resource extension '{label}'."
            )));
        }
        return Ok(None);
    }

    Ok(Some(normalized))
}

fn name_overrides(
    relational: &JsonObject,
    ctx: &OverrideContext<'_>,
) -> Result<BTreeMap<String, NameOverride>> {
    let label = ctx.label;
    let entries = match relational.get("nameOverrides") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(BuildError::shape(format!(
                "Expected relational.nameOverrides to be an object for resource '{label}'."
            )));
        }
    };

    let mut sorted: Vec<(&String, &Value)> = entries.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let identity_paths: BTreeSet<&str> = ctx
        .references
        .iter()
        .flat_map(DocumentReferenceMapping::reference_paths)
        .map(JsonPathExpression::canonical)
        .collect();

    let mut extension_key: Option<String> = None;
    let mut overrides: BTreeMap<String, NameOverride> = BTreeMap::new();

    for (raw_key, value) in sorted {
        let compiled = JsonPathExpression::compile(raw_key).map_err(|e| {
            BuildError::InvalidPath(format!(
                "relational.nameOverrides entry '{raw_key}' on resource '{label}' is not a valid JSONPath: {e}"
            ))
        })?;

        let path = if ctx.is_resource_extension && !is_extension_rooted(&compiled) {
            let key = match &extension_key {
                Some(key) => key.clone(),
                None => {
                    let key = resolve_extension_project_key(ctx)?;
                    extension_key = Some(key.clone());
                    key
                }
            };
            re_root(&compiled, &key)?
        } else {
            compiled
        };

        let text = match value {
            Value::String(text) if !text.trim().is_empty() => text,
            Value::Null => {
                return Err(BuildError::InvalidOverride(format!(
                    "relational.nameOverrides entry '{raw_key}' is null on resource '{label}'."
                )));
            }
            Value::String(_) => {
                return Err(BuildError::InvalidOverride(format!(
                    "relational.nameOverrides entry '{raw_key}' must be non-empty on resource '{label}'."
                )));
            }
            _ => {
                return Err(BuildError::InvalidOverride(format!(
                    "relational.nameOverrides entry '{raw_key}' must be a string on resource '{label}'."
                )));
            }
        };

        let name = to_pascal_case(text);
        if name.is_empty() {
            return Err(BuildError::InvalidOverride(format!(
                "relational.nameOverrides entry '{raw_key}' must normalize to a non-empty name on resource '{label}'."
            )));
        }

        if let Some(object_path) = enclosing_reference_object(&path, ctx.references) {
            if !identity_paths.contains(path.canonical()) {
                return Err(BuildError::InvalidOverride(format!(
                    "relational.nameOverrides entry '{raw_key}' (canonical '{path}') on resource '{label}' \
                     targets a non-identity path inside reference object '{object_path}'. \
                     Only reference identity paths may be overridden."
                )));
            }
        }

        let kind = if matches!(path.last_segment(), Some(JsonPathSegment::AnyArrayElement)) {
            NameOverrideKind::Collection
        } else {
            NameOverrideKind::Column
        };

        if let Some(existing) = overrides.get(path.canonical()) {
            return Err(BuildError::InvalidOverride(format!(
                "relational.nameOverrides entry '{raw_key}' (canonical '{path}') duplicates '{}' on resource '{label}'.",
                existing.raw_key
            )));
        }

        overrides.insert(
            path.canonical().to_string(),
            NameOverride {
                raw_key: raw_key.clone(),
                path,
                kind,
                name,
            },
        );
    }

    Ok(overrides)
}

/// True for paths whose first segment is `_ext`
fn is_extension_rooted(path: &JsonPathExpression) -> bool {
    path.segments().first().and_then(JsonPathSegment::as_property) == Some(EXTENSION_PROPERTY)
}

fn re_root(path: &JsonPathExpression, project_key: &str) -> Result<JsonPathExpression> {
    let segments = [
        JsonPathSegment::property(EXTENSION_PROPERTY),
        JsonPathSegment::property(project_key),
    ]
    .into_iter()
    .chain(path.segments().iter().cloned());
    Ok(JsonPathExpression::from_segments(segments)?)
}

fn enclosing_reference_object<'a>(
    path: &JsonPathExpression,
    references: &'a [DocumentReferenceMapping],
) -> Option<&'a JsonPathExpression> {
    references
        .iter()
        .map(|r| &r.reference_object_path)
        .find(|object| path.segments().len() > object.segments().len() && path.starts_with(object))
}

fn resolve_extension_project_key(ctx: &OverrideContext<'_>) -> Result<String> {
    let label = ctx.label;
    let missing = |what: &str| {
        BuildError::InvalidOverride(format!(
            "Extension resource '{label}' is missing jsonSchemaForInsert.{what}."
        ))
    };

    let Some(properties) = ctx.json_schema_for_insert.get("properties") else {
        return Err(missing("properties"));
    };
    let Value::Object(properties) = properties else {
        return Err(BuildError::shape(format!(
            "Expected jsonSchemaForInsert.properties to be an object on resource '{label}'."
        )));
    };
    let ext = match properties.get(EXTENSION_PROPERTY) {
        None | Some(Value::Null) => return Err(missing("properties._ext")),
        Some(Value::Object(ext)) => ext,
        Some(_) => {
            return Err(BuildError::shape(format!(
                "Expected jsonSchemaForInsert.properties._ext to be an object on resource '{label}'."
            )));
        }
    };
    let keys = match ext.get("properties") {
        None => return Err(missing("properties._ext.properties")),
        Some(Value::Object(keys)) => keys,
        Some(_) => {
            return Err(BuildError::shape(format!(
                "Expected jsonSchemaForInsert.properties._ext.properties to be an object on resource '{label}'."
            )));
        }
    };

    [ctx.project_endpoint_name, ctx.project_name]
        .iter()
        .find_map(|wanted| keys.keys().find(|k| k.eq_ignore_ascii_case(wanted)))
        .cloned()
        .ok_or_else(|| {
            BuildError::InvalidOverride(format!(
                "Extension project key '{}' not found under jsonSchemaForInsert._ext on resource '{label}'.",
                ctx.project_endpoint_name
            ))
        })
}
