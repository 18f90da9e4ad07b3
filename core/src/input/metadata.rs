//! Column metadata declared beside the JSON schema
//!
//! Decimal precision comes from `decimalPropertyValidationInfos` and, for
//! paths it does not cover, from `flatteningMetadata` column types. The same
//! flattening metadata lists string columns that may omit `maxLength`.

use std::collections::{BTreeMap, BTreeSet};

use relmodel_types::JsonPathExpression;
use serde_json::Value;

use super::json::{JsonObject, compile, entry_object, optional_array, optional_i64, optional_str, require_str};
use crate::error::{BuildError, Result};

/// Precision metadata for one `number` property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalValidation {
    pub path: JsonPathExpression,
    pub total_digits: Option<i64>,
    pub decimal_places: Option<i64>,
}

const COLUMNS: &str = "flatteningMetadata.table.columns";
const CHILD_TABLES: &str = "flatteningMetadata.table.childTables";

/// Decimal validation keyed by canonical path
pub(crate) fn decimal_validations(
    resource_schema: &JsonObject,
    label: &str,
) -> Result<BTreeMap<String, DecimalValidation>> {
    let mut by_path = BTreeMap::new();

    if let Some(infos) = optional_array(
        resource_schema,
        "decimalPropertyValidationInfos",
        "decimalPropertyValidationInfos",
    )? {
        for info in infos {
            let info = entry_object(info, "decimalPropertyValidationInfos")?;
            let path = compile(require_str(info, "path", "decimalPropertyValidationInfos entry")?, label)?;
            let entry = DecimalValidation {
                total_digits: optional_i64(info, "totalDigits", "decimalPropertyValidationInfos")?,
                decimal_places: optional_i64(info, "decimalPlaces", "decimalPropertyValidationInfos")?,
                path,
            };

            let key = entry.path.canonical().to_string();
            if by_path.contains_key(&key) {
                return Err(BuildError::shape(format!(
                    "Decimal validation info for '{key}' is already defined on resource '{label}'."
                )));
            }
            by_path.insert(key, entry);
        }
    }

    if let Some(table) = flattening_table(resource_schema)? {
        walk_flattening_columns(table, &mut |column| {
            let Some((column_type, path)) = column_type_and_path(column)? else {
                return Ok(());
            };

            let digits = match column_type {
                "currency" => Some((19, 4)),
                "percent" => Some((5, 4)),
                "decimal" => optional_i64(column, "precision", COLUMNS)?
                    .zip(optional_i64(column, "scale", COLUMNS)?),
                _ => None,
            };

            if let Some((precision, scale)) = digits {
                let path = compile(path, label)?;
                by_path
                    .entry(path.canonical().to_string())
                    .or_insert_with(|| DecimalValidation {
                        path,
                        total_digits: Some(precision),
                        decimal_places: Some(scale),
                    });
            }
            Ok(())
        })?;
    }

    Ok(by_path)
}

/// Canonical paths of string columns that may omit `maxLength`
pub(crate) fn string_max_length_omissions(
    resource_schema: &JsonObject,
    label: &str,
) -> Result<BTreeSet<String>> {
    let mut paths = BTreeSet::new();

    if let Some(table) = flattening_table(resource_schema)? {
        walk_flattening_columns(table, &mut |column| {
            let Some((column_type, path)) = column_type_and_path(column)? else {
                return Ok(());
            };
            let has_max_length = !matches!(column.get("maxLength"), None | Some(Value::Null));

            let omitted = match column_type {
                "duration" | "enumeration" => true,
                "string" => !has_max_length,
                _ => false,
            };
            if omitted {
                paths.insert(compile(path, label)?.canonical().to_string());
            }
            Ok(())
        })?;
    }

    Ok(paths)
}

fn flattening_table(resource_schema: &JsonObject) -> Result<Option<&JsonObject>> {
    let Some(Value::Object(metadata)) = resource_schema.get("flatteningMetadata") else {
        return Ok(None);
    };
    match metadata.get("table") {
        Some(Value::Object(table)) => Ok(Some(table)),
        _ => Ok(None),
    }
}

/// `columnType` and `jsonPath` of a flattening column, when both are present
fn column_type_and_path(column: &JsonObject) -> Result<Option<(&str, &str)>> {
    let Some(column_type) = optional_str(column, "columnType", COLUMNS)? else {
        return Ok(None);
    };
    let Some(path) = optional_str(column, "jsonPath", COLUMNS)? else {
        return Ok(None);
    };
    Ok(Some((column_type, path)))
}

fn walk_flattening_columns<F>(table: &JsonObject, visit: &mut F) -> Result<()>
where
    F: FnMut(&JsonObject) -> Result<()>,
{
    if let Some(Value::Array(columns)) = table.get("columns") {
        for column in columns {
            visit(entry_object(column, COLUMNS)?)?;
        }
    }

    if let Some(Value::Array(children)) = table.get("childTables") {
        for child in children {
            walk_flattening_columns(entry_object(child, CHILD_TABLES)?, visit)?;
        }
    }

    Ok(())
}
