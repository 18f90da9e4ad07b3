//! Physical naming conventions
//!
//! Every table, column and constraint identifier the builder produces is
//! derived here. The rules are deliberately simple string transforms so the
//! output is stable across runs and platforms.

use relmodel_types::model::{DbColumnName, DbSchemaName, DbTableName};

// =============================================================================
// Shared names
// =============================================================================

/// Reserved property holding extension project data
pub const EXTENSION_PROPERTY: &str = "_ext";

/// Property skipped inside reference objects
pub const LINK_PROPERTY: &str = "link";

pub const DMS_SCHEMA: DbSchemaName = DbSchemaName::from_static("dms");
pub const DOCUMENT_TABLE: DbTableName = DbTableName::from_static("dms", "Document");
pub const DESCRIPTOR_TABLE: DbTableName = DbTableName::from_static("dms", "Descriptor");

pub const DOCUMENT_ID: DbColumnName = DbColumnName::from_static("DocumentId");
pub const ORDINAL: DbColumnName = DbColumnName::from_static("Ordinal");

/// FK token used for the root table's link to `dms.Document`
pub const DOCUMENT_TOKEN: &str = "Document";

const DESCRIPTOR_ID_SUFFIX: &str = "_DescriptorId";
const DOCUMENT_ID_SUFFIX: &str = "_DocumentId";

// =============================================================================
// String transforms
// =============================================================================

/// Physical schema for a project endpoint (`ed-fi` becomes `edfi`)
#[must_use]
pub fn normalize_schema_name(project_endpoint_name: &str) -> DbSchemaName {
    let mut normalized: String = project_endpoint_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if !normalized.starts_with(|c: char| c.is_ascii_alphabetic()) {
        normalized.insert(0, 'p');
    }

    DbSchemaName::from(normalized)
}

/// PascalCase that keeps the casing inside each alphanumeric run
///
/// `schoolId` becomes `SchoolId`, `a-b` becomes `AB`.
#[must_use]
pub fn to_pascal_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;

    for c in value.chars() {
        if !c.is_alphanumeric() {
            at_word_start = true;
            continue;
        }
        if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }

    out
}

/// Singular form of an array property name
///
/// Suffixes match case-insensitively; the stem keeps its original casing.
#[must_use]
pub fn singularize_collection_segment(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    let stem = |trim: usize| &value[..value.len() - trim];

    if lower.ends_with("ies") {
        return format!("{}y", stem(3));
    }
    if ["ches", "shes", "xes", "zes", "ses"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        return stem(2).to_string();
    }
    if lower.ends_with('s') && !lower.ends_with("ss") {
        return stem(1).to_string();
    }

    value.to_string()
}

/// Base name contributed by an array property to its table name
#[must_use]
pub fn to_collection_base_name(property_name: &str) -> String {
    to_pascal_case(&singularize_collection_segment(property_name))
}

/// Concatenated PascalCase of property segments (`address.city` gives `AddressCity`)
#[must_use]
pub fn column_base_name<S: AsRef<str>>(segments: &[S]) -> String {
    segments.iter().map(|s| to_pascal_case(s.as_ref())).collect()
}

// =============================================================================
// Column names
// =============================================================================

/// `<Root>_DocumentId`, the first key part of every child table
#[must_use]
pub fn root_document_id_column(root_base_name: &str) -> DbColumnName {
    DbColumnName::from(format!("{root_base_name}{DOCUMENT_ID_SUFFIX}"))
}

/// `<Collection>Ordinal`, an ancestor collection's ordinal carried by a descendant
#[must_use]
pub fn parent_collection_ordinal_column(collection_base_name: &str) -> DbColumnName {
    DbColumnName::from(format!("{collection_base_name}{}", ORDINAL.as_str()))
}

/// `<Base>_DescriptorId`
#[must_use]
pub fn descriptor_id_column(base_name: &str) -> DbColumnName {
    DbColumnName::from(format!("{base_name}{DESCRIPTOR_ID_SUFFIX}"))
}

#[must_use]
pub fn is_document_id_column(name: &DbColumnName) -> bool {
    name.as_str() == DOCUMENT_ID.as_str() || name.as_str().ends_with(DOCUMENT_ID_SUFFIX)
}

// =============================================================================
// Constraint names
// =============================================================================

fn build_name(prefix: &str, table: &DbTableName, tokens: &[&str]) -> String {
    let mut name = format!("{prefix}_{}", table.name());
    for token in tokens.iter().filter(|t| !t.is_empty()) {
        name.push('_');
        name.push_str(token);
    }
    name
}

/// `PK_<Table>`
#[must_use]
pub fn primary_key_name(table: &DbTableName) -> String {
    build_name("PK", table, &[])
}

/// `FK_<Table>_<token>`
#[must_use]
pub fn foreign_key_name(table: &DbTableName, token: &str) -> String {
    build_name("FK", table, &[token])
}

/// `FK_<Table>_<Base>` for a `<Base>_DescriptorId` column
#[must_use]
pub fn descriptor_foreign_key_name(table: &DbTableName, column: &DbColumnName) -> String {
    let token = column
        .as_str()
        .strip_suffix(DESCRIPTOR_ID_SUFFIX)
        .unwrap_or(column.as_str());
    foreign_key_name(table, token)
}

// =============================================================================
// Collection override prefixes
// =============================================================================

/// Names an override author might have prefixed onto a collection override
///
/// Includes the superclass equivalents when `superclass` is given.
#[must_use]
pub fn collection_override_prefixes(
    root_base_name: &str,
    parent_suffix: &str,
    superclass: Option<&str>,
) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    let mut add = |value: String| {
        if !value.is_empty() && !prefixes.contains(&value) {
            prefixes.push(value);
        }
    };

    add(format!("{root_base_name}{parent_suffix}"));
    add(root_base_name.to_string());
    add(parent_suffix.to_string());

    if let Some(superclass) = superclass.filter(|s| !s.is_empty()) {
        add(format!("{superclass}{parent_suffix}"));
        add(superclass.to_string());
    }

    prefixes
}

/// Every suffix of `value` that starts at a PascalCase word boundary
///
/// `SchoolAddress` yields `SchoolAddress` and `Address`.
#[must_use]
pub fn pascal_case_suffixes(value: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = value.char_indices().collect();
    let mut suffixes = Vec::new();

    for (i, &(offset, c)) in chars.iter().enumerate() {
        let boundary = i == 0
            || (c.is_uppercase()
                && (chars[i - 1].1.is_lowercase()
                    || chars.get(i + 1).is_some_and(|(_, next)| next.is_lowercase())));
        if boundary {
            suffixes.push(&value[offset..]);
        }
    }

    suffixes
}

/// Strip the longest implied prefix from a collection override
///
/// Fails with the matched prefix when nothing but whitespace follows it,
/// which would leave the collection with no name of its own.
pub fn strip_collection_override_prefix<'p>(
    override_name: &str,
    prefixes: &'p [String],
) -> std::result::Result<String, &'p str> {
    let mut suffixes: Vec<&str> = prefixes
        .iter()
        .flat_map(|p| pascal_case_suffixes(p))
        .collect();
    suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    suffixes.dedup();

    for suffix in suffixes {
        if let Some(remainder) = override_name.strip_prefix(suffix) {
            if remainder.trim().is_empty() {
                return Err(suffix);
            }
            return Ok(remainder.to_string());
        }
    }

    Ok(override_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_schema_name() {
        assert_eq!(normalize_schema_name("ed-fi").as_str(), "edfi");
        assert_eq!(normalize_schema_name("TPDM").as_str(), "tpdm");
        assert_eq!(normalize_schema_name("2024-ext").as_str(), "p2024ext");
        assert_eq!(normalize_schema_name("--").as_str(), "p");
    }

    #[test]
    fn test_pascal_case_keeps_inner_casing() {
        assert_eq!(to_pascal_case("schoolId"), "SchoolId");
        assert_eq!(to_pascal_case("a-b"), "AB");
        assert_eq!(to_pascal_case("a_b"), "AB");
        assert_eq!(to_pascal_case("GPA value"), "GPAValue");
        assert_eq!(to_pascal_case(""), "");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize_collection_segment("categories"), "category");
        assert_eq!(singularize_collection_segment("addresses"), "address");
        assert_eq!(singularize_collection_segment("matches"), "match");
        assert_eq!(singularize_collection_segment("boxes"), "box");
        assert_eq!(singularize_collection_segment("items"), "item");
        assert_eq!(singularize_collection_segment("class"), "class");
        assert_eq!(singularize_collection_segment("data"), "data");
        assert_eq!(singularize_collection_segment("CATEGORIES"), "CATEGORy");
        assert_eq!(singularize_collection_segment("ADDRESSES"), "ADDRESS");
        assert_eq!(singularize_collection_segment("Items"), "Item");
        assert_eq!(singularize_collection_segment("CLASS"), "CLASS");
        assert_eq!(to_collection_base_name("gradeLevels"), "GradeLevel");
    }

    #[test]
    fn test_key_and_constraint_names() {
        let table = DbTableName::new(DbSchemaName::from("edfi"), "SchoolAddress");
        assert_eq!(root_document_id_column("School").as_str(), "School_DocumentId");
        assert_eq!(parent_collection_ordinal_column("Address").as_str(), "AddressOrdinal");
        assert_eq!(primary_key_name(&table), "PK_SchoolAddress");
        assert_eq!(foreign_key_name(&table, "School"), "FK_SchoolAddress_School");
        assert_eq!(
            descriptor_foreign_key_name(&table, &descriptor_id_column("AddressType")),
            "FK_SchoolAddress_AddressType"
        );
        assert!(is_document_id_column(&DOCUMENT_ID));
        assert!(is_document_id_column(&root_document_id_column("School")));
        assert!(!is_document_id_column(&ORDINAL));
    }

    #[test]
    fn test_pascal_case_suffixes() {
        assert_eq!(pascal_case_suffixes("SchoolAddress"), vec!["SchoolAddress", "Address"]);
        assert_eq!(pascal_case_suffixes("GPAValue"), vec!["GPAValue", "Value"]);
    }

    #[test]
    fn test_strip_collection_override_prefix() {
        let prefixes = collection_override_prefixes("School", "Address", None);
        assert_eq!(
            strip_collection_override_prefix("SchoolAddressPeriod", &prefixes).as_deref(),
            Ok("Period")
        );
        assert_eq!(
            strip_collection_override_prefix("Line", &prefixes).as_deref(),
            Ok("Line")
        );
        assert_eq!(strip_collection_override_prefix("School", &prefixes), Err("School"));
        assert_eq!(strip_collection_override_prefix("SchoolAddress  ", &prefixes), Err("SchoolAddress"));
    }
}
