//! Typed accessors over the loosely-typed ApiSchema JSON
//!
//! Failures are [`BuildError::SchemaShape`] with the
//! "Expected X to be ..., invalid ApiSchema." wording used throughout
//! extraction.

use relmodel_types::JsonPathExpression;
use serde_json::{Map, Value};

use crate::error::{BuildError, Result};

/// A JSON object as parsed by `serde_json`
pub type JsonObject = Map<String, Value>;

fn invalid(what: &str, expectation: &str) -> BuildError {
    BuildError::shape(format!("Expected {what} to be {expectation}, invalid ApiSchema."))
}

/// `value` as an object; `what` names it in errors
pub(crate) fn as_object<'a>(value: Option<&'a Value>, what: &str) -> Result<&'a JsonObject> {
    match value {
        Some(Value::Object(map)) => Ok(map),
        None | Some(Value::Null) => Err(invalid(what, "present")),
        Some(_) => Err(invalid(what, "an object")),
    }
}

/// Optional object; `null` counts as absent
pub(crate) fn optional_object<'a>(
    object: &'a JsonObject,
    key: &str,
    what: &str,
) -> Result<Option<&'a JsonObject>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid(what, "an object")),
    }
}

/// Optional array; `null` counts as absent
pub(crate) fn optional_array<'a>(
    object: &'a JsonObject,
    key: &str,
    what: &str,
) -> Result<Option<&'a Vec<Value>>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(invalid(what, "an array")),
    }
}

pub(crate) fn require_str<'a>(object: &'a JsonObject, key: &str, what: &str) -> Result<&'a str> {
    match object.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(invalid(what, "non-empty")),
        None | Some(Value::Null) => Err(BuildError::shape(format!(
            "Expected {key} to be on {what}, invalid ApiSchema."
        ))),
        Some(_) => Err(invalid(&format!("{what}.{key}"), "a string")),
    }
}

pub(crate) fn optional_str<'a>(object: &'a JsonObject, key: &str, what: &str) -> Result<Option<&'a str>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(invalid(&format!("{what}.{key}"), "a string")),
    }
}

pub(crate) fn require_bool(object: &JsonObject, key: &str, what: &str) -> Result<bool> {
    match object.get(key) {
        Some(Value::Bool(b)) => Ok(*b),
        None | Some(Value::Null) => Err(BuildError::shape(format!(
            "Expected {key} to be on {what}, invalid ApiSchema."
        ))),
        Some(_) => Err(invalid(&format!("{what}.{key}"), "a boolean")),
    }
}

pub(crate) fn optional_bool(object: &JsonObject, key: &str, what: &str) -> Result<bool> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(&format!("{what}.{key}"), "a boolean")),
    }
}

pub(crate) fn optional_i64(object: &JsonObject, key: &str, what: &str) -> Result<Option<i64>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(&format!("{what}.{key}"), "an integer")),
        Some(_) => Err(invalid(&format!("{what}.{key}"), "a number")),
    }
}

/// Entry of an array as an object, rejecting null entries
pub(crate) fn entry_object<'a>(entry: &'a Value, what: &str) -> Result<&'a JsonObject> {
    match entry {
        Value::Object(map) => Ok(map),
        Value::Null => Err(invalid(&format!("{what} entries"), "non-null")),
        _ => Err(invalid(&format!("{what} entries"), "objects")),
    }
}

/// Entry of an array as a string, rejecting null entries
pub(crate) fn entry_str<'a>(entry: &'a Value, what: &str) -> Result<&'a str> {
    match entry {
        Value::String(s) => Ok(s),
        Value::Null => Err(invalid(&format!("{what} entries"), "non-null")),
        _ => Err(invalid(&format!("{what} entries"), "strings")),
    }
}

/// Compile a JSONPath, naming the resource on failure
pub(crate) fn compile(text: &str, resource_label: &str) -> Result<JsonPathExpression> {
    JsonPathExpression::compile(text).map_err(|e| BuildError::path(text, resource_label, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_messages() {
        let Value::Object(obj) = json!({ "isDescriptor": "no", "name": "" }) else {
            unreachable!()
        };

        let err = require_bool(&obj, "isDescriptor", "resourceSchema").unwrap_err();
        assert_eq!(
            err.message(),
            "Expected resourceSchema.isDescriptor to be a boolean, invalid ApiSchema."
        );

        let err = require_str(&obj, "resourceName", "resourceSchema").unwrap_err();
        assert_eq!(
            err.message(),
            "Expected resourceName to be on resourceSchema, invalid ApiSchema."
        );

        assert!(require_str(&obj, "name", "resourceSchema").is_err());
        assert!(!optional_bool(&obj, "missing", "resourceSchema").unwrap());
    }
}
