//! Schema validation pass
//!
//! Runs over the whole insert schema, `_ext` included, before anything is
//! derived. Collects the scalar and array paths the schema declares and
//! checks identity and uniqueness paths against them.

use std::collections::BTreeSet;

use relmodel_types::JsonPathExpression;

use crate::error::{BuildError, Result};
use crate::input::{ArrayUniquenessConstraint, ResourceSchemaInput};
use crate::relmodel_trace_step;
use crate::schema::{SchemaKind, SchemaNode};

#[derive(Debug, Default)]
struct SchemaPaths {
    scalars: BTreeSet<String>,
    /// Array scopes, ending in `[*]`
    arrays: BTreeSet<String>,
}

/// Check the insert schema can be mapped and that every metadata path exists in it
pub fn validate_json_schema(input: &ResourceSchemaInput<'_>) -> Result<()> {
    relmodel_trace_step!("validate_json_schema", input.label());

    let root = SchemaNode::new(input.json_schema_for_insert, "$");
    root.reject_unsupported()?;
    if root.kind()? != SchemaKind::Object {
        return Err(BuildError::shape(format!(
            "Json schema root must be an object on resource '{}'.",
            input.label()
        )));
    }

    let mut paths = SchemaPaths::default();
    collect(input, root, &JsonPathExpression::root(), &mut paths)?;

    let missing: Vec<&str> = input
        .identity_json_paths
        .iter()
        .map(JsonPathExpression::canonical)
        .filter(|p| !paths.scalars.contains(*p))
        .collect();
    if !missing.is_empty() {
        return Err(BuildError::IdentityCompleteness(format!(
            "identityJsonPaths were not found in JSON schema for resource '{}': {}.",
            input.label(),
            missing.join(", ")
        )));
    }

    validate_uniqueness_paths(input, &paths)
}

fn collect(
    input: &ResourceSchemaInput<'_>,
    node: SchemaNode<'_>,
    path: &JsonPathExpression,
    paths: &mut SchemaPaths,
) -> Result<()> {
    node.reject_unsupported()?;

    match node.kind()? {
        SchemaKind::Object => {
            for (name, schema) in node.properties()? {
                let schema_path = format!("{}.properties.{name}", node.schema_path);
                collect(input, SchemaNode::new(schema, &schema_path), &path.child(name), paths)?;
            }
        }
        SchemaKind::Array => {
            let element = path.wildcard();
            paths.arrays.insert(element.canonical().to_string());

            let items_path = format!("{}.items", node.schema_path);
            let items = SchemaNode::new(node.items()?, &items_path);
            items.reject_unsupported()?;

            let not_object = || {
                BuildError::shape(format!(
                    "Array schema items must be type object at {path} on resource '{}'.",
                    input.label()
                ))
            };

            match items.kind()? {
                SchemaKind::Object => collect(input, items, &element, paths)?,
                SchemaKind::Array => return Err(not_object()),
                // Only descriptor arrays may hold scalars
                SchemaKind::Scalar => {
                    if input.descriptor_path(element.canonical()).is_none() {
                        return Err(not_object());
                    }
                    paths.scalars.insert(element.canonical().to_string());
                }
            }
        }
        SchemaKind::Scalar => {
            paths.scalars.insert(path.canonical().to_string());
        }
    }

    Ok(())
}

fn validate_uniqueness_paths(input: &ResourceSchemaInput<'_>, paths: &SchemaPaths) -> Result<()> {
    let mut missing_bases = BTreeSet::new();
    let mut missing_paths = BTreeSet::new();

    fn visit(
        constraint: &ArrayUniquenessConstraint,
        paths: &SchemaPaths,
        missing_bases: &mut BTreeSet<String>,
        missing_paths: &mut BTreeSet<String>,
    ) {
        if let Some(base) = &constraint.base_path {
            if !paths.arrays.contains(base.canonical()) {
                missing_bases.insert(base.canonical().to_string());
            }
        }
        for resolved in constraint.resolved_paths() {
            if !paths.scalars.contains(resolved.canonical()) {
                missing_paths.insert(resolved.canonical().to_string());
            }
        }
        for nested in &constraint.nested {
            visit(nested, paths, missing_bases, missing_paths);
        }
    }

    for constraint in &input.array_uniqueness_constraints {
        visit(constraint, paths, &mut missing_bases, &mut missing_paths);
    }

    let label = input.label();
    if !missing_bases.is_empty() {
        return Err(BuildError::shape(format!(
            "arrayUniquenessConstraints basePath values were not found in JSON schema for resource '{label}': {}.",
            missing_bases.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    if !missing_paths.is_empty() {
        return Err(BuildError::shape(format!(
            "arrayUniquenessConstraints paths were not found in JSON schema for resource '{label}': {}.",
            missing_paths.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }

    Ok(())
}
