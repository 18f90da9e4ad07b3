//! JSON Schema traversal conventions
//!
//! The builder reads `jsonSchemaForInsert` through [`SchemaNode`], a thin
//! view over a JSON object that classifies the node once and exposes the
//! handful of keywords the mapper understands.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::{BuildError, Result};

/// Keywords the relational mapper cannot express
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$ref",
    "oneOf",
    "anyOf",
    "allOf",
    "not",
    "enum",
    "patternProperties",
    "if",
    "then",
    "else",
];

/// Shape of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array,
    Scalar,
}

/// Classify a schema node
///
/// A string `type` decides; without one, `items` means array and
/// `properties` means object. `schema_path` is used in errors.
pub fn determine_schema_kind(schema: &Map<String, Value>, schema_path: &str) -> Result<SchemaKind> {
    match schema.get("type") {
        Some(Value::String(t)) => Ok(match t.as_str() {
            "object" => SchemaKind::Object,
            "array" => SchemaKind::Array,
            _ => SchemaKind::Scalar,
        }),
        Some(Value::Null) | None => Ok(if schema.contains_key("items") {
            SchemaKind::Array
        } else if schema.contains_key("properties") {
            SchemaKind::Object
        } else {
            SchemaKind::Scalar
        }),
        Some(Value::Array(_)) => Err(BuildError::UnsupportedMetadata(format!(
            "Type arrays are not supported at {schema_path}.type."
        ))),
        Some(_) => Err(BuildError::shape(format!(
            "Expected type to be a string at {schema_path}.type."
        ))),
    }
}

/// Reject keywords the mapper does not support, reporting `<schema_path>.<keyword>`
pub fn reject_unsupported_keywords(schema: &Map<String, Value>, schema_path: &str) -> Result<()> {
    match UNSUPPORTED_KEYWORDS.iter().find(|k| schema.contains_key(**k)) {
        Some(keyword) => Err(BuildError::UnsupportedMetadata(format!(
            "Unsupported JSON schema keyword '{keyword}' at {schema_path}.{keyword}."
        ))),
        None => Ok(()),
    }
}

// =============================================================================
// Node view
// =============================================================================

/// A schema object plus its location in the schema document
#[derive(Debug, Clone, Copy)]
pub struct SchemaNode<'a> {
    pub schema: &'a Map<String, Value>,
    /// Schema-document path, e.g. `$.properties.addresses.items`
    pub schema_path: &'a str,
}

impl<'a> SchemaNode<'a> {
    pub fn new(schema: &'a Map<String, Value>, schema_path: &'a str) -> Self {
        Self {
            schema,
            schema_path,
        }
    }

    pub fn kind(&self) -> Result<SchemaKind> {
        determine_schema_kind(self.schema, self.schema_path)
    }

    pub fn reject_unsupported(&self) -> Result<()> {
        reject_unsupported_keywords(self.schema, self.schema_path)
    }

    /// Properties sorted by name; empty when the node has none
    pub fn properties(&self) -> Result<Vec<(&'a str, &'a Map<String, Value>)>> {
        let properties = match self.schema.get("properties") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(props)) => props,
            Some(_) => {
                return Err(BuildError::shape(format!(
                    "Expected properties to be an object at {}.properties.",
                    self.schema_path
                )));
            }
        };

        let mut entries = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            let Value::Object(schema) = value else {
                return Err(BuildError::shape(format!(
                    "Expected property schema to be an object at {}.properties.{name}.",
                    self.schema_path
                )));
            };
            entries.push((name.as_str(), schema));
        }
        entries.sort_by(|a, b| a.0.cmp(b.0));
        Ok(entries)
    }

    /// The `items` schema of an array node
    pub fn items(&self) -> Result<&'a Map<String, Value>> {
        match self.schema.get("items") {
            Some(Value::Object(items)) => Ok(items),
            _ => Err(BuildError::SchemaShape(format!(
                "Array schema items must be an object at {}.items.",
                self.schema_path
            ))),
        }
    }

    /// Names listed in `required`
    pub fn required(&self, json_path: &str) -> Result<BTreeSet<&'a str>> {
        let entries = match self.schema.get("required") {
            None | Some(Value::Null) => return Ok(BTreeSet::new()),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(BuildError::shape(format!(
                    "Expected required to be an array at {json_path}.required."
                )));
            }
        };

        entries
            .iter()
            .map(|entry| match entry {
                Value::String(name) if !name.trim().is_empty() => Ok(name.as_str()),
                _ => Err(BuildError::shape(format!(
                    "Expected required entries to be non-empty strings at {json_path}.required."
                ))),
            })
            .collect()
    }
}

/// Value of `x-nullable`, false when absent
pub fn is_x_nullable(schema: &Map<String, Value>, json_path: &str) -> Result<bool> {
    match schema.get("x-nullable") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(BuildError::shape(format!(
            "Expected x-nullable to be a boolean at {json_path}."
        ))),
    }
}

/// Optional string keyword such as `format` or `type`
pub fn optional_str<'a>(
    schema: &'a Map<String, Value>,
    keyword: &str,
    json_path: &str,
) -> Result<Option<&'a str>> {
    match schema.get(keyword) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(BuildError::shape(format!(
            "Expected {keyword} to be a string at {json_path}.{keyword}."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_kind_from_type_or_shape() {
        let cases = [
            (json!({ "type": "object" }), SchemaKind::Object),
            (json!({ "type": "array" }), SchemaKind::Array),
            (json!({ "type": "string" }), SchemaKind::Scalar),
            (json!({ "items": {} }), SchemaKind::Array),
            (json!({ "properties": {} }), SchemaKind::Object),
            (json!({}), SchemaKind::Scalar),
        ];
        for (schema, expected) in cases {
            assert_eq!(determine_schema_kind(&obj(schema), "$").unwrap(), expected);
        }
    }

    #[test]
    fn test_type_array_is_unsupported() {
        let err = determine_schema_kind(&obj(json!({ "type": ["string", "null"] })), "$.properties.x")
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedMetadata(_)));
        assert!(err.message().contains("$.properties.x.type"));
    }

    #[test]
    fn test_unsupported_keyword_reports_path() {
        let schema = obj(json!({ "$ref": "#/definitions/x" }));
        let err = reject_unsupported_keywords(&schema, "$.properties.reference").unwrap_err();
        assert!(err.message().contains("$.properties.reference.$ref"));
    }

    #[test]
    fn test_properties_are_sorted() {
        let schema = obj(json!({ "properties": { "b": {}, "a": {}, "c": {} } }));
        let node = SchemaNode::new(&schema, "$");
        let names: Vec<_> = node.properties().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_x_nullable_must_be_bool() {
        assert!(is_x_nullable(&obj(json!({ "x-nullable": true })), "$.a").unwrap());
        assert!(!is_x_nullable(&obj(json!({})), "$.a").unwrap());
        assert!(is_x_nullable(&obj(json!({ "x-nullable": "yes" })), "$.a").is_err());
    }
}
