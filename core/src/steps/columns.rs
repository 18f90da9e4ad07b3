//! Column and descriptor edge derivation
//!
//! A second walk of the insert schema that fills the tables from
//! [`derive_table_scopes`](super::derive_table_scopes) with scalar and
//! descriptor columns. Inlined object properties concatenate into the
//! column name, arrays switch to their child table, and reference identity
//! paths are left to the reference binding surface.

use std::collections::{BTreeMap, BTreeSet};

use relmodel_types::model::{
    ColumnKind, DbColumnModel, DbColumnName, DbSchemaName, DbTableModel, DescriptorEdgeSource,
    QualifiedResourceName, RelationalScalarType, ResourceStorageKind, ScalarKind, TableConstraint,
};
use relmodel_types::JsonPathExpression;

use super::tables::TableScopes;
use crate::collision::{CollisionDetector, IdentifierOrigin, column_collision};
use crate::error::{BuildError, Result};
use crate::input::{JsonObject, NameOverrideKind, ResourceSchemaInput};
use crate::naming::{
    DESCRIPTOR_TABLE, DOCUMENT_ID, EXTENSION_PROPERTY, LINK_PROPERTY, column_base_name,
    descriptor_foreign_key_name, descriptor_id_column, singularize_collection_segment,
};
use crate::relmodel_trace_step;
use crate::scalar_type::resolve_scalar_type;
use crate::schema::{SchemaKind, SchemaNode, is_x_nullable};

/// Output of [`derive_columns`]: fully columned tables plus descriptor edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnsBound {
    pub resource: QualifiedResourceName,
    pub physical_schema: DbSchemaName,
    pub storage_kind: ResourceStorageKind,
    /// Same order as the table scopes they were built from
    pub tables: Vec<DbTableModel>,
    pub descriptor_edge_sources: Vec<DescriptorEdgeSource>,
}

/// Populate every table with its scalar and descriptor columns
pub fn derive_columns(
    input: &ResourceSchemaInput<'_>,
    scopes: TableScopes,
    detector: &mut CollisionDetector,
) -> Result<ColumnsBound> {
    relmodel_trace_step!("derive_columns", input.label());

    let TableScopes {
        resource,
        physical_schema,
        storage_kind,
        tables,
        used_overrides,
    } = scopes;

    // Descriptor documents live in the shared table; their properties are not mapped
    if storage_kind == ResourceStorageKind::SharedDescriptorTable {
        return Ok(ColumnsBound {
            resource,
            physical_schema,
            storage_kind,
            tables: tables.into_iter().map(|scope| scope.table).collect(),
            descriptor_edge_sources: Vec::new(),
        });
    }

    let label = input.label();
    let builders: Vec<TableBuilder> = tables
        .into_iter()
        .map(|scope| TableBuilder::new(scope.table, label))
        .collect();
    let scope_index = builders
        .iter()
        .enumerate()
        .map(|(i, b)| (b.table.json_scope.canonical().to_string(), i))
        .collect();

    let mut walker = ColumnWalker {
        input,
        detector,
        builders,
        scope_index,
        reference_identity_paths: input.reference_identity_paths(),
        reference_object_paths: input.reference_object_paths(),
        used_descriptor_paths: BTreeSet::new(),
        used_overrides,
        edges: Vec::new(),
    };

    let root = SchemaNode::new(input.json_schema_for_insert, "$");
    walker.walk_object(root, 0, &JsonPathExpression::root(), &[], false)?;

    ensure_descriptor_paths_used(input, &walker.used_descriptor_paths)?;
    ensure_overrides_used(input, &walker.used_overrides)?;

    Ok(ColumnsBound {
        resource,
        physical_schema,
        storage_kind,
        tables: walker.builders.into_iter().map(|b| b.table).collect(),
        descriptor_edge_sources: walker.edges,
    })
}

/// True when any segment of `path` is `_ext`
fn is_under_extension(path: &JsonPathExpression) -> bool {
    path.segments()
        .iter()
        .any(|s| s.as_property() == Some(EXTENSION_PROPERTY))
}

fn ensure_descriptor_paths_used(input: &ResourceSchemaInput<'_>, used: &BTreeSet<String>) -> Result<()> {
    let missing: Vec<&str> = input
        .descriptor_paths
        .iter()
        .filter(|(path, info)| !used.contains(*path) && !is_under_extension(&info.descriptor_value_path))
        .map(|(path, _)| path.as_str())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(BuildError::UnsupportedMetadata(format!(
        "Descriptor paths were not found in JSON schema on resource '{}': {}.",
        input.label(),
        missing.join(", ")
    )))
}

fn ensure_overrides_used(input: &ResourceSchemaInput<'_>, used: &BTreeSet<String>) -> Result<()> {
    let unused: Vec<String> = input
        .overrides
        .name_overrides
        .iter()
        .filter(|(path, o)| !used.contains(*path) && !is_under_extension(&o.path))
        .map(|(path, o)| format!("'{}' (canonical '{path}')", o.raw_key))
        .collect();

    if unused.is_empty() {
        return Ok(());
    }

    Err(BuildError::InvalidOverride(format!(
        "relational.nameOverrides entries did not match any derived columns or collection scopes \
         on resource '{}': {}",
        input.label(),
        unused.join(", ")
    )))
}

// =============================================================================
// Table builder
// =============================================================================

/// A table under construction plus the origin of every column name it holds
struct TableBuilder {
    table: DbTableModel,
    origins: BTreeMap<String, (String, IdentifierOrigin)>,
}

impl TableBuilder {
    fn new(table: DbTableModel, label: &str) -> Self {
        let origins = table
            .columns
            .iter()
            .map(|column| {
                let path = column
                    .source_json_path
                    .as_ref()
                    .unwrap_or(&table.json_scope)
                    .canonical();
                (
                    column.name().to_string(),
                    (
                        column.name().to_string(),
                        IdentifierOrigin::column(&table.table, &column.name, label, path),
                    ),
                )
            })
            .collect();

        Self { table, origins }
    }

    fn add_column(
        &mut self,
        column: DbColumnModel,
        original_name: &str,
        label: &str,
        detector: &mut CollisionDetector,
    ) -> Result<()> {
        let path = column
            .source_json_path
            .as_ref()
            .unwrap_or(&self.table.json_scope)
            .canonical();
        let origin = IdentifierOrigin::column(&self.table.table, &column.name, label, path);

        if let Some((existing_original, existing_origin)) = self.origins.get(column.name()) {
            return Err(column_collision(
                &self.table.table,
                &column.name,
                (existing_original, existing_origin.clone()),
                (original_name, origin),
            ));
        }

        detector.register_column(&self.table.table, &column.name, original_name, origin.clone())?;
        self.origins
            .insert(column.name().to_string(), (original_name.to_string(), origin));
        self.table.columns.push(column);
        Ok(())
    }
}

// =============================================================================
// Traversal
// =============================================================================

struct ColumnWalker<'i, 'a, 'd> {
    input: &'i ResourceSchemaInput<'a>,
    detector: &'d mut CollisionDetector,
    builders: Vec<TableBuilder>,
    scope_index: BTreeMap<String, usize>,
    reference_identity_paths: BTreeSet<&'i str>,
    reference_object_paths: BTreeSet<&'i str>,
    used_descriptor_paths: BTreeSet<String>,
    used_overrides: BTreeSet<String>,
    edges: Vec<DescriptorEdgeSource>,
}

impl ColumnWalker<'_, '_, '_> {
    fn walk_object(
        &mut self,
        node: SchemaNode<'_>,
        table: usize,
        path: &JsonPathExpression,
        column_segments: &[String],
        has_optional_ancestor: bool,
    ) -> Result<()> {
        let properties = node.properties()?;
        if properties.is_empty() {
            return Ok(());
        }

        let required = node.required(path.canonical())?;
        let is_reference_scope = self.reference_object_paths.contains(path.canonical());

        for (name, schema) in properties {
            if name == EXTENSION_PROPERTY || (is_reference_scope && name == LINK_PROPERTY) {
                continue;
            }

            let property_path = path.child(name);
            let schema_path = format!("{}.properties.{name}", node.schema_path);
            let property = SchemaNode::new(schema, &schema_path);
            property.reject_unsupported()?;

            let mut segments = column_segments.to_vec();
            segments.push(name.to_string());

            let is_optional = !required.contains(name) || is_x_nullable(schema, property_path.canonical())?;
            let is_nullable = has_optional_ancestor || is_optional;

            match property.kind()? {
                SchemaKind::Object => {
                    self.walk_object(property, table, &property_path, &segments, is_nullable)?;
                }
                SchemaKind::Array => self.walk_array(property, &property_path)?,
                SchemaKind::Scalar => {
                    self.add_column(table, schema, &segments, property_path, is_nullable)?;
                }
            }
        }

        Ok(())
    }

    fn walk_array(&mut self, node: SchemaNode<'_>, path: &JsonPathExpression) -> Result<()> {
        let label = self.input.label();
        let items_path = format!("{}.items", node.schema_path);
        let items = SchemaNode::new(node.items()?, &items_path);
        items.reject_unsupported()?;

        let element = path.wildcard();
        let Some(&table) = self.scope_index.get(element.canonical()) else {
            return Err(BuildError::shape(format!(
                "Child table scope '{element}' was not found on resource '{label}'."
            )));
        };

        match items.kind()? {
            SchemaKind::Object => self.walk_object(items, table, &element, &[], false),
            SchemaKind::Scalar => {
                let (Some(property), Some(_)) = (path.last_property(), self.input.descriptor_path(element.canonical()))
                else {
                    return Err(BuildError::shape(format!(
                        "Array schema items must be type object at {path} on resource '{label}'."
                    )));
                };

                let segments = [singularize_collection_segment(property)];
                let is_nullable = is_x_nullable(items.schema, element.canonical())?;
                self.add_column(table, items.schema, &segments, element, is_nullable)
            }
            SchemaKind::Array => Err(BuildError::shape(format!(
                "Array schema items must be type object at {path} on resource '{label}'."
            ))),
        }
    }

    fn add_column(
        &mut self,
        table: usize,
        schema: &JsonObject,
        column_segments: &[String],
        source_path: JsonPathExpression,
        is_nullable: bool,
    ) -> Result<()> {
        let input = self.input;
        let label = input.label();
        let canonical = source_path.canonical();
        let column_override = input.name_override(canonical, NameOverrideKind::Column);

        if self.reference_identity_paths.contains(canonical) {
            if input.descriptor_path(canonical).is_some() {
                self.used_descriptor_paths.insert(canonical.to_string());
            }
            if column_override.is_some() {
                self.used_overrides.insert(canonical.to_string());
            }
            return Ok(());
        }

        let is_identity = input.is_identity_path(canonical);
        if is_identity && is_nullable {
            return Err(BuildError::NullableIdentity(format!(
                "Identity path '{canonical}' on resource '{label}' maps to a nullable column. \
                 Identity components must be non-null."
            )));
        }

        let default_base_name = column_base_name(column_segments);
        let base_name = match column_override {
            Some(name_override) => {
                self.used_overrides.insert(canonical.to_string());
                name_override.name.clone()
            }
            None => default_base_name.clone(),
        };

        if let Some(info) = input.descriptor_path(canonical) {
            let column_name = descriptor_id_column(&base_name);
            let original_name = descriptor_id_column(&default_base_name);
            let column = DbColumnModel::new(
                column_name.clone(),
                ColumnKind::DescriptorFk,
                RelationalScalarType::new(ScalarKind::Int64),
            )
            .nullable(is_nullable)
            .source(info.descriptor_value_path.clone())
            .target(info.descriptor_resource.clone());

            let builder = &mut self.builders[table];
            builder.add_column(column, original_name.as_str(), label, self.detector)?;

            let table_name = builder.table.table.clone();
            builder.table.constraints.push(TableConstraint::foreign_key(
                descriptor_foreign_key_name(&table_name, &column_name),
                vec![column_name.clone()],
                DESCRIPTOR_TABLE,
                vec![DOCUMENT_ID],
            ));

            self.edges.push(DescriptorEdgeSource {
                is_identity_component: is_identity,
                descriptor_value_path: info.descriptor_value_path.clone(),
                table: table_name,
                fk_column: column_name,
                descriptor_resource: info.descriptor_resource.clone(),
            });
            self.used_descriptor_paths.insert(canonical.to_string());
            return Ok(());
        }

        let scalar_type = resolve_scalar_type(schema, &source_path, input)?;
        let column = DbColumnModel::new(DbColumnName::from(base_name), ColumnKind::Scalar, scalar_type)
            .nullable(is_nullable)
            .source(source_path);

        self.builders[table].add_column(column, &default_base_name, label, self.detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::extract_inputs;
    use crate::options::BuildOptions;
    use crate::steps::derive_table_scopes;
    use serde_json::{Value, json};

    fn api_schema(resources: Value) -> Value {
        json!({
            "projectSchema": {
                "projectName": "Ed-Fi",
                "projectEndpointName": "ed-fi",
                "resourceSchemas": resources
            }
        })
    }

    fn derive(doc: &Value, endpoint: &str) -> Result<ColumnsBound> {
        let input = extract_inputs(doc, endpoint, &BuildOptions::default())?;
        let mut detector = CollisionDetector::new();
        let scopes = derive_table_scopes(&input, &mut detector)?;
        derive_columns(&input, scopes, &mut detector)
    }

    fn student(insert: Value) -> Value {
        json!({
            "resourceName": "Student",
            "isDescriptor": false,
            "identityJsonPaths": ["$.studentUniqueId"],
            "documentPathsMapping": {
                "StudentUniqueId": { "isReference": false, "path": "$.studentUniqueId" },
                "Sex": {
                    "isReference": true,
                    "isDescriptor": true,
                    "projectName": "Ed-Fi",
                    "resourceName": "SexDescriptor",
                    "path": "$.birthSexDescriptor"
                }
            },
            "jsonSchemaForInsert": insert
        })
    }

    fn student_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "studentUniqueId": { "type": "string", "maxLength": 32 },
                "birthSexDescriptor": { "type": "string", "maxLength": 306 },
                "name": {
                    "type": "object",
                    "properties": {
                        "first": { "type": "string", "maxLength": 75 },
                        "last": { "type": "string", "maxLength": 75 }
                    },
                    "required": ["first", "last"]
                }
            },
            "required": ["studentUniqueId", "name"]
        })
    }

    #[test]
    fn test_inlined_object_columns() {
        let doc = api_schema(json!({ "students": student(student_schema()) }));
        let bound = derive(&doc, "students").unwrap();
        let root = &bound.tables[0];

        let first = root.column("NameFirst").unwrap();
        assert!(!first.is_nullable);
        assert_eq!(first.source_json_path.as_ref().unwrap().canonical(), "$.name.first");
        assert!(!root.column("StudentUniqueId").unwrap().is_nullable);
    }

    #[test]
    fn test_optional_parent_makes_children_nullable() {
        let mut schema = student_schema();
        schema["required"] = json!(["studentUniqueId"]);
        let doc = api_schema(json!({ "students": student(schema) }));
        let bound = derive(&doc, "students").unwrap();

        assert!(bound.tables[0].column("NameFirst").unwrap().is_nullable);
    }

    #[test]
    fn test_descriptor_column_and_edge() {
        let doc = api_schema(json!({ "students": student(student_schema()) }));
        let bound = derive(&doc, "students").unwrap();
        let root = &bound.tables[0];

        let column = root.column("BirthSex_DescriptorId").unwrap();
        assert_eq!(column.kind, ColumnKind::DescriptorFk);
        assert_eq!(column.scalar_type.unwrap().kind, ScalarKind::Int64);
        assert!(column.is_nullable);

        let TableConstraint::ForeignKey {
            target_table, on_delete, ..
        } = root.constraint("FK_Student_BirthSex").unwrap()
        else {
            panic!("expected foreign key")
        };
        assert_eq!(*target_table, DESCRIPTOR_TABLE);
        assert_eq!(*on_delete, relmodel_types::model::ReferentialAction::NoAction);

        assert_eq!(bound.descriptor_edge_sources.len(), 1);
        assert!(!bound.descriptor_edge_sources[0].is_identity_component);
    }

    #[test]
    fn test_nullable_identity_fails() {
        let mut schema = student_schema();
        schema["required"] = json!(["name"]);
        let doc = api_schema(json!({ "students": student(schema) }));

        let err = derive(&doc, "students").unwrap_err();
        assert!(matches!(err, BuildError::NullableIdentity(_)));
        assert!(err.message().starts_with("Identity path '$.studentUniqueId' on resource 'Ed-Fi:Student'"));
    }

    #[test]
    fn test_x_nullable_scalar_is_nullable_even_when_required() {
        let mut schema = student_schema();
        schema["properties"]["middleName"] = json!({ "type": "string", "maxLength": 75, "x-nullable": true });
        schema["required"] = json!(["studentUniqueId", "name", "middleName"]);
        let doc = api_schema(json!({ "students": student(schema) }));
        let bound = derive(&doc, "students").unwrap();

        assert!(bound.tables[0].column("MiddleName").unwrap().is_nullable);
        assert!(!bound.tables[0].column("NameLast").unwrap().is_nullable);
    }

    #[test]
    fn test_x_nullable_object_propagates_to_descendants() {
        let mut schema = student_schema();
        schema["properties"]["name"]["x-nullable"] = json!(true);
        schema["properties"]["name"]["properties"]["aliases"] = json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": { "alias": { "type": "string", "maxLength": 75 } },
                "required": ["alias"]
            }
        });
        let doc = api_schema(json!({ "students": student(schema) }));
        let bound = derive(&doc, "students").unwrap();

        let root = &bound.tables[0];
        assert!(root.column("NameFirst").unwrap().is_nullable);
        assert!(root.column("NameLast").unwrap().is_nullable);

        // Collection items start a fresh nullability context
        let aliases = bound
            .tables
            .iter()
            .find(|t| t.column("Alias").is_some())
            .expect("alias collection table");
        assert!(!aliases.column("Alias").unwrap().is_nullable);
    }

    #[test]
    fn test_x_nullable_identity_fails() {
        let mut schema = student_schema();
        schema["properties"]["studentUniqueId"]["x-nullable"] = json!(true);
        let doc = api_schema(json!({ "students": student(schema) }));

        let err = derive(&doc, "students").unwrap_err();
        assert!(matches!(err, BuildError::NullableIdentity(_)));
        assert!(err.message().contains("'$.studentUniqueId'"));
    }

    #[test]
    fn test_x_nullable_must_be_boolean() {
        let mut schema = student_schema();
        schema["properties"]["name"]["properties"]["first"]["x-nullable"] = json!("yes");
        let doc = api_schema(json!({ "students": student(schema) }));

        let err = derive(&doc, "students").unwrap_err();
        assert!(matches!(err, BuildError::SchemaShape(_)));
        assert!(err.message().contains("x-nullable"));
    }

    #[test]
    fn test_descriptor_array_column() {
        let doc = api_schema(json!({
            "students": {
                "resourceName": "Student",
                "isDescriptor": false,
                "identityJsonPaths": [],
                "documentPathsMapping": {
                    "Language": {
                        "isReference": true,
                        "isDescriptor": true,
                        "projectName": "Ed-Fi",
                        "resourceName": "LanguageDescriptor",
                        "path": "$.languages[*]"
                    }
                },
                "jsonSchemaForInsert": {
                    "type": "object",
                    "properties": {
                        "languages": { "type": "array", "items": { "type": "string", "maxLength": 306 } }
                    }
                }
            }
        }));
        let bound = derive(&doc, "students").unwrap();

        let child = &bound.tables[1];
        assert_eq!(child.table.name(), "StudentLanguage");
        let column = child.column("Language_DescriptorId").unwrap();
        assert!(!column.is_nullable);
        assert_eq!(bound.descriptor_edge_sources[0].table.name(), "StudentLanguage");
    }

    #[test]
    fn test_reference_identity_paths_and_link_are_skipped() {
        let doc = api_schema(json!({
            "enrollments": {
                "resourceName": "Enrollment",
                "isDescriptor": false,
                "identityJsonPaths": ["$.schoolReference.schoolId"],
                "documentPathsMapping": {
                    "School": {
                        "isReference": true,
                        "isDescriptor": false,
                        "isRequired": true,
                        "projectName": "Ed-Fi",
                        "resourceName": "School",
                        "referenceJsonPaths": [
                            { "identityJsonPath": "$.schoolId", "referenceJsonPath": "$.schoolReference.schoolId" }
                        ]
                    }
                },
                "jsonSchemaForInsert": {
                    "type": "object",
                    "properties": {
                        "schoolReference": {
                            "type": "object",
                            "properties": {
                                "schoolId": { "type": "integer" },
                                "link": { "type": "object", "properties": { "rel": { "type": "string" } } }
                            },
                            "required": ["schoolId"]
                        }
                    },
                    "required": ["schoolReference"]
                }
            }
        }));
        let bound = derive(&doc, "enrollments").unwrap();
        assert_eq!(bound.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_column_override_and_unused_override() {
        let mut resource = student(student_schema());
        resource["relational"] = json!({ "nameOverrides": { "$.name.first": "GivenName" } });
        let doc = api_schema(json!({ "students": resource }));
        let bound = derive(&doc, "students").unwrap();
        assert!(bound.tables[0].column("GivenName").is_some());

        let mut resource = student(student_schema());
        resource["relational"] = json!({ "nameOverrides": { "$.name.middle": "MiddleName" } });
        let doc = api_schema(json!({ "students": resource }));
        let err = derive(&doc, "students").unwrap_err();
        assert!(err.message().contains("did not match any derived columns or collection scopes"));
        assert!(err.message().ends_with("'$.name.middle' (canonical '$.name.middle')"));
    }

    #[test]
    fn test_override_collision_names_both_paths() {
        let mut resource = student(student_schema());
        resource["relational"] = json!({ "nameOverrides": { "$.name.first": "NameLast" } });
        let doc = api_schema(json!({ "students": resource }));

        let err = derive(&doc, "students").unwrap_err();
        assert!(matches!(err, BuildError::IdentifierCollision(_)));
        assert!(err.message().contains("$.name.first"));
        assert!(err.message().contains("$.name.last"));
    }

    #[test]
    fn test_unused_descriptor_path_fails() {
        let mut schema = student_schema();
        schema["properties"].as_object_mut().unwrap().remove("birthSexDescriptor");
        let doc = api_schema(json!({ "students": student(schema) }));

        let err = derive(&doc, "students").unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedMetadata(_)));
        assert!(err.message().ends_with(": $.birthSexDescriptor."));
    }

    #[test]
    fn test_descriptor_resource_has_key_only() {
        let doc = api_schema(json!({
            "sexDescriptors": {
                "resourceName": "SexDescriptor",
                "isDescriptor": true,
                "identityJsonPaths": [],
                "jsonSchemaForInsert": {
                    "type": "object",
                    "properties": { "codeValue": { "type": "string", "maxLength": 50 } }
                }
            }
        }));
        let bound = derive(&doc, "sexDescriptors").unwrap();
        assert_eq!(bound.tables[0].columns.len(), 1);
        assert!(bound.descriptor_edge_sources.is_empty());
    }

    #[test]
    fn test_extension_override_is_exempt() {
        let mut resource = student(student_schema());
        resource["relational"] = json!({ "nameOverrides": { "$._ext.sample.favoriteColor": "Color" } });
        let doc = api_schema(json!({ "students": resource }));
        derive(&doc, "students").unwrap();
    }
}
