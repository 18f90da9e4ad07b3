//! `arrayUniquenessConstraints` extraction and reference coverage checks

use std::collections::{BTreeMap, BTreeSet};

use relmodel_types::model::DocumentReferenceMapping;
use relmodel_types::{JsonPathExpression, JsonPathSegment};
use serde_json::Value;

use super::json::{JsonObject, compile};
use crate::error::{BuildError, Result};
use crate::naming::EXTENSION_PROPERTY;

/// One node of a uniqueness constraint tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayUniquenessConstraint {
    /// Array scope the paths are relative to; required on nested constraints
    pub base_path: Option<JsonPathExpression>,
    pub paths: Vec<JsonPathExpression>,
    pub nested: Vec<ArrayUniquenessConstraint>,
}

impl ArrayUniquenessConstraint {
    /// `paths` resolved against `base_path`
    #[must_use]
    pub fn resolved_paths(&self) -> Vec<JsonPathExpression> {
        match &self.base_path {
            Some(base) => self.paths.iter().map(|p| base.join(p)).collect(),
            None => self.paths.clone(),
        }
    }
}

fn invalid(what: &str) -> BuildError {
    BuildError::shape(format!(
        "Expected arrayUniquenessConstraints{what}, invalid ApiSchema."
    ))
}

pub(crate) fn array_uniqueness_constraints(
    resource_schema: &JsonObject,
    label: &str,
) -> Result<Vec<ArrayUniquenessConstraint>> {
    match resource_schema.get("arrayUniquenessConstraints") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => parse_constraints(entries, label, false),
        Some(_) => Err(invalid(" to be an array")),
    }
}

fn parse_constraints(
    entries: &[Value],
    label: &str,
    is_nested: bool,
) -> Result<Vec<ArrayUniquenessConstraint>> {
    let mut constraints = Vec::with_capacity(entries.len());

    for entry in entries {
        let entry = match entry {
            Value::Object(entry) => entry,
            Value::Null => return Err(invalid(" to not contain null entries")),
            _ => return Err(invalid(" entries to be objects")),
        };

        let base_path = match entry.get("basePath") {
            Some(Value::String(base)) => Some(compile(base, label)?),
            Some(Value::Null) => return Err(invalid(".basePath to be non-null")),
            Some(_) => return Err(invalid(".basePath to be a string")),
            None if is_nested => {
                return Err(BuildError::shape(format!(
                    "arrayUniquenessConstraints nestedConstraints entry is missing basePath on resource '{label}'."
                )));
            }
            None => None,
        };

        let paths = match entry.get("paths") {
            Some(Value::Array(paths)) if paths.is_empty() => {
                return Err(invalid(".paths to contain entries"));
            }
            Some(Value::Array(paths)) => paths
                .iter()
                .map(|p| match p {
                    Value::String(p) => compile(p, label),
                    Value::Null => Err(invalid(".paths to not contain null entries")),
                    _ => Err(invalid(".paths entries to be strings")),
                })
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(invalid(".paths to be an array")),
        };

        let nested = match entry.get("nestedConstraints") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(nested)) => parse_constraints(nested, label, true)?,
            Some(_) => return Err(invalid(".nestedConstraints to be an array")),
        };

        constraints.push(ArrayUniquenessConstraint {
            base_path,
            paths,
            nested,
        });
    }

    Ok(constraints)
}

// =============================================================================
// Reference coverage
// =============================================================================

struct ReferenceGroup<'a> {
    object_path: &'a JsonPathExpression,
    paths: BTreeSet<&'a str>,
}

/// Reject uniqueness scopes that hold part of a reference's identity
pub(crate) fn validate_reference_coverage(
    constraints: &[ArrayUniquenessConstraint],
    references: &[DocumentReferenceMapping],
    label: &str,
) -> Result<()> {
    if constraints.is_empty() || references.is_empty() {
        return Ok(());
    }

    let groups: Vec<ReferenceGroup<'_>> = references
        .iter()
        .map(|r| ReferenceGroup {
            object_path: &r.reference_object_path,
            paths: r.reference_paths().map(JsonPathExpression::canonical).collect(),
        })
        .collect();

    constraints
        .iter()
        .try_for_each(|c| validate_constraint(c, &groups, label))
}

fn validate_constraint(
    constraint: &ArrayUniquenessConstraint,
    groups: &[ReferenceGroup<'_>],
    label: &str,
) -> Result<()> {
    let base = constraint.base_path.as_ref().map(JsonPathExpression::canonical);
    let mut by_scope: BTreeMap<String, Vec<JsonPathExpression>> = BTreeMap::new();

    for path in constraint.resolved_paths() {
        let Some(scope) = path.array_scope() else {
            return Err(BuildError::shape(format!(
                "arrayUniquenessConstraints path '{path}' on resource '{label}' must include an array wildcard segment."
            )));
        };
        by_scope.entry(scope.canonical().to_string()).or_default().push(path);
    }

    for (scope, paths) in &by_scope {
        let ctx = CoverageContext {
            label,
            scope,
            base,
            aligned: None,
        };
        if check_coverage(&paths.iter().collect::<Vec<_>>(), groups, &ctx)? {
            continue;
        }

        // Extension constraints may address core reference objects from under `_ext.<key>`
        let Some(aligned_scope) = paths.first().and_then(|p| p.array_scope()).and_then(|s| strip_extension_root(&s))
        else {
            continue;
        };
        let Some(aligned_paths) = paths.iter().map(strip_extension_root).collect::<Option<Vec<_>>>() else {
            continue;
        };
        let aligned_base = constraint.base_path.as_ref().and_then(strip_extension_root);

        let ctx = CoverageContext {
            aligned: Some((aligned_scope.canonical(), aligned_base.as_ref().map(JsonPathExpression::canonical))),
            ..ctx
        };
        check_coverage(&aligned_paths.iter().collect::<Vec<_>>(), groups, &ctx)?;
    }

    constraint
        .nested
        .iter()
        .try_for_each(|n| validate_constraint(n, groups, label))
}

struct CoverageContext<'a> {
    label: &'a str,
    scope: &'a str,
    base: Option<&'a str>,
    aligned: Option<(&'a str, Option<&'a str>)>,
}

/// True when any reference group was touched; errors on a partial match
fn check_coverage(
    paths: &[&JsonPathExpression],
    groups: &[ReferenceGroup<'_>],
    ctx: &CoverageContext<'_>,
) -> Result<bool> {
    let present: BTreeSet<&str> = paths.iter().map(|p| p.canonical()).collect();
    let mut matched = false;

    for group in groups {
        if group.paths.is_disjoint(&present) {
            continue;
        }
        matched = true;

        let missing: Vec<&str> = group.paths.difference(&present).copied().collect();
        if missing.is_empty() {
            continue;
        }

        let base = ctx.base.map(|b| format!(" basePath '{b}'")).unwrap_or_default();
        let aligned = match ctx.aligned {
            None => String::new(),
            Some((scope, None)) => format!(" alignedScope '{scope}'"),
            Some((scope, Some(base))) => format!(" alignedScope '{scope}' basePath '{base}'"),
        };

        return Err(BuildError::IdentityCompleteness(format!(
            "arrayUniquenessConstraints scope '{}' on resource '{}'{base}{aligned} includes reference identity \
             path(s) under '{}' but is missing reference identity path(s): {}",
            ctx.scope,
            ctx.label,
            group.object_path,
            missing.join(", ")
        )));
    }

    Ok(matched)
}

/// `$._ext.<key>.rest` becomes `$.rest`
fn strip_extension_root(path: &JsonPathExpression) -> Option<JsonPathExpression> {
    match path.segments() {
        [JsonPathSegment::Property(ext), JsonPathSegment::Property(_), rest @ ..]
            if ext == EXTENSION_PROPERTY =>
        {
            JsonPathExpression::from_segments(rest.iter().cloned()).ok()
        }
        _ => None,
    }
}
