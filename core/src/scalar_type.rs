//! JSON Schema scalar to relational type mapping

use relmodel_types::JsonPathExpression;
use relmodel_types::model::{RelationalScalarType, ScalarKind};
use serde_json::Value;

use crate::error::{BuildError, Result};
use crate::input::{JsonObject, ResourceSchemaInput};
use crate::schema::optional_str;

/// Resolve the relational type of the scalar schema at `source_path`
pub fn resolve_scalar_type(
    schema: &JsonObject,
    source_path: &JsonPathExpression,
    input: &ResourceSchemaInput<'_>,
) -> Result<RelationalScalarType> {
    let path = source_path.canonical();
    let label = input.label();

    let schema_type = match schema.get("type") {
        None | Some(Value::Null) => {
            return Err(BuildError::shape(format!(
                "Schema type must be specified at {path} on resource '{label}'."
            )));
        }
        Some(Value::String(t)) => t.as_str(),
        Some(_) => {
            return Err(BuildError::shape(format!(
                "Expected type to be a string at {path}.type on resource '{label}'."
            )));
        }
    };

    match schema_type {
        "string" => string_type(schema, path, input),
        "integer" => Ok(match optional_str(schema, "format", path)? {
            Some("int64") => RelationalScalarType::new(ScalarKind::Int64),
            _ => RelationalScalarType::new(ScalarKind::Int32),
        }),
        "number" => decimal_type(path, input),
        "boolean" => Ok(RelationalScalarType::new(ScalarKind::Boolean)),
        other => Err(BuildError::UnsupportedMetadata(format!(
            "Unsupported scalar type '{other}' at {path} on resource '{label}'."
        ))),
    }
}

fn string_type(schema: &JsonObject, path: &str, input: &ResourceSchemaInput<'_>) -> Result<RelationalScalarType> {
    match optional_str(schema, "format", path)? {
        Some("date") => return Ok(RelationalScalarType::new(ScalarKind::Date)),
        Some("date-time") => return Ok(RelationalScalarType::new(ScalarKind::DateTime)),
        Some("time") => return Ok(RelationalScalarType::new(ScalarKind::Time)),
        _ => {}
    }

    let label = input.label();
    match schema.get("maxLength") {
        None | Some(Value::Null) => {
            if !input.options.require_string_max_length || input.string_max_length_omissions.contains(path) {
                Ok(RelationalScalarType::string(None))
            } else {
                Err(BuildError::UnsupportedMetadata(format!(
                    "String schema maxLength is required at {path} on resource '{label}'. \
                     Set maxLength in MetaEd for string/sharedString."
                )))
            }
        }
        Some(Value::Number(n)) => match n.as_i64() {
            Some(len) if len > 0 => u32::try_from(len)
                .map(|len| RelationalScalarType::string(Some(len)))
                .map_err(|_| {
                    BuildError::shape(format!(
                        "String schema maxLength is out of range at {path} on resource '{label}'."
                    ))
                }),
            _ => Err(BuildError::shape(format!(
                "String schema maxLength must be positive at {path} on resource '{label}'."
            ))),
        },
        Some(_) => Err(BuildError::shape(format!(
            "Expected maxLength to be a number at {path} on resource '{label}'."
        ))),
    }
}

fn decimal_type(path: &str, input: &ResourceSchemaInput<'_>) -> Result<RelationalScalarType> {
    let label = input.label();
    let Some(info) = input.decimal_validation(path) else {
        return Err(BuildError::UnsupportedMetadata(format!(
            "Decimal property validation info is required for number properties at {path} on resource '{label}'."
        )));
    };

    let (Some(digits), Some(places)) = (info.total_digits, info.decimal_places) else {
        return Err(BuildError::UnsupportedMetadata(format!(
            "Decimal property validation info must include totalDigits and decimalPlaces at {path} \
             on resource '{label}'."
        )));
    };

    if digits <= 0 || places < 0 {
        return Err(BuildError::UnsupportedMetadata(format!(
            "Decimal property validation info must be positive for {path} on resource '{label}'."
        )));
    }
    if places > digits {
        return Err(BuildError::UnsupportedMetadata(format!(
            "Decimal places cannot exceed total digits for {path} on resource '{label}'."
        )));
    }

    let precision = u32::try_from(digits).map_err(|_| {
        BuildError::UnsupportedMetadata(format!(
            "Decimal property validation info is out of range for {path} on resource '{label}'."
        ))
    })?;
    // places <= digits, so it fits whenever digits does
    let scale = u32::try_from(places).unwrap_or(precision);

    Ok(RelationalScalarType::decimal(precision, scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::extract_inputs;
    use crate::options::BuildOptions;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "projectSchema": {
                "projectName": "Ed-Fi",
                "projectEndpointName": "ed-fi",
                "resourceSchemas": {
                    "grades": {
                        "resourceName": "Grade",
                        "isDescriptor": false,
                        "identityJsonPaths": [],
                        "decimalPropertyValidationInfos": [
                            { "path": "$.numericGrade", "totalDigits": 9, "decimalPlaces": 2 },
                            { "path": "$.broken", "totalDigits": 2, "decimalPlaces": 4 }
                        ],
                        "jsonSchemaForInsert": { "type": "object", "properties": {} }
                    }
                }
            }
        })
    }

    fn resolve(schema: Value, path: &str, options: &BuildOptions) -> Result<RelationalScalarType> {
        let doc = doc();
        let input = extract_inputs(&doc, "grades", options).unwrap();
        let Value::Object(schema) = schema else {
            panic!("expected object")
        };
        resolve_scalar_type(&schema, &JsonPathExpression::compile(path).unwrap(), &input)
    }

    #[test]
    fn test_string_formats_and_lengths() {
        let opts = BuildOptions::default();
        assert_eq!(
            resolve(json!({ "type": "string", "format": "date" }), "$.d", &opts).unwrap().kind,
            ScalarKind::Date
        );
        assert_eq!(
            resolve(json!({ "type": "string", "maxLength": 60 }), "$.s", &opts).unwrap(),
            RelationalScalarType::string(Some(60))
        );

        let err = resolve(json!({ "type": "string" }), "$.s", &opts).unwrap_err();
        assert!(err.message().starts_with("String schema maxLength is required at $.s"));

        let relaxed = BuildOptions {
            require_string_max_length: false,
            ..BuildOptions::default()
        };
        assert_eq!(
            resolve(json!({ "type": "string" }), "$.s", &relaxed).unwrap(),
            RelationalScalarType::string(None)
        );
    }

    #[test]
    fn test_integers() {
        let opts = BuildOptions::default();
        assert_eq!(resolve(json!({ "type": "integer" }), "$.i", &opts).unwrap().kind, ScalarKind::Int32);
        assert_eq!(
            resolve(json!({ "type": "integer", "format": "int64" }), "$.i", &opts).unwrap().kind,
            ScalarKind::Int64
        );
    }

    #[test]
    fn test_decimals() {
        let opts = BuildOptions::default();
        assert_eq!(
            resolve(json!({ "type": "number" }), "$.numericGrade", &opts).unwrap(),
            RelationalScalarType::decimal(9, 2)
        );
        assert!(resolve(json!({ "type": "number" }), "$.missing", &opts).is_err());

        let err = resolve(json!({ "type": "number" }), "$.broken", &opts).unwrap_err();
        assert!(err.message().starts_with("Decimal places cannot exceed total digits"));
    }

    #[test]
    fn test_unsupported_type() {
        let err = resolve(json!({ "type": "null" }), "$.x", &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedMetadata(_)));
    }
}
