//! Table scope and key derivation
//!
//! Walks `jsonSchemaForInsert` in property-name order and creates one table
//! per array scope. Objects are inlined into the enclosing table and `_ext`
//! subtrees are left to extension derivation. Every table and key column is
//! registered with the [`CollisionDetector`].

use std::collections::BTreeSet;

use relmodel_types::JsonPathExpression;
use relmodel_types::model::{
    ColumnKind, DbColumnModel, DbKeyColumn, DbSchemaName, DbTableModel, DbTableName,
    QualifiedResourceName, ReferentialAction, RelationalScalarType, ResourceStorageKind, ScalarKind,
    TableConstraint, TableKey,
};

use crate::collision::{CollisionDetector, IdentifierOrigin};
use crate::error::{BuildError, Result};
use crate::input::{NameOverrideKind, ResourceSchemaInput};
use crate::naming::{
    DESCRIPTOR_TABLE, DOCUMENT_ID, DOCUMENT_TABLE, DOCUMENT_TOKEN, EXTENSION_PROPERTY, ORDINAL,
    collection_override_prefixes, foreign_key_name, is_document_id_column,
    parent_collection_ordinal_column, primary_key_name, root_document_id_column,
    strip_collection_override_prefix, to_collection_base_name, to_pascal_case,
};
use crate::schema::{SchemaKind, SchemaNode};
use crate::{relmodel_trace_step, relmodel_trace_table};

/// A derived table and the collection chain that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScope {
    pub table: DbTableModel,
    /// Collection names from the root down, overrides applied
    pub collection_base_names: Vec<String>,
    /// Collection names the defaults alone would have produced
    pub default_collection_base_names: Vec<String>,
}

/// Output of [`derive_table_scopes`]: keyed tables without data columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScopes {
    pub resource: QualifiedResourceName,
    pub physical_schema: DbSchemaName,
    pub storage_kind: ResourceStorageKind,
    /// Discovery order; the root is first and parents precede children
    pub tables: Vec<TableScope>,
    /// Canonical scopes whose collection override was applied
    pub used_overrides: BTreeSet<String>,
}

impl TableScopes {
    #[must_use]
    pub fn root(&self) -> &TableScope {
        &self.tables[0]
    }

    /// Table scope at `scope` (canonical form)
    #[must_use]
    pub fn scope(&self, scope: &str) -> Option<&TableScope> {
        self.tables
            .iter()
            .find(|t| t.table.json_scope.canonical() == scope)
    }
}

/// Create the root table, then one keyed child table per array scope
pub fn derive_table_scopes(
    input: &ResourceSchemaInput<'_>,
    detector: &mut CollisionDetector,
) -> Result<TableScopes> {
    relmodel_trace_step!("derive_table_scopes", input.label());

    if input.is_descriptor {
        let table = root_table(DESCRIPTOR_TABLE);
        relmodel_trace_table!(table.table, table.json_scope);

        return Ok(TableScopes {
            resource: input.resource(),
            physical_schema: input.physical_schema(),
            storage_kind: ResourceStorageKind::SharedDescriptorTable,
            tables: vec![TableScope {
                table,
                collection_base_names: Vec::new(),
                default_collection_base_names: Vec::new(),
            }],
            used_overrides: BTreeSet::new(),
        });
    }

    let root_base_name = input.root_base_name();
    let root = root_table(DbTableName::new(input.physical_schema(), root_base_name.clone()));

    detector.register_table(
        &root.table,
        &root_base_name,
        IdentifierOrigin::table(&root.table, input.label(), root.json_scope.canonical()),
    )?;
    detector.register_column(
        &root.table,
        &DOCUMENT_ID,
        DOCUMENT_ID.as_str(),
        IdentifierOrigin::column(&root.table, &DOCUMENT_ID, input.label(), root.json_scope.canonical()),
    )?;
    relmodel_trace_table!(root.table, root.json_scope);

    let mut walker = TableWalker {
        input,
        detector,
        superclass_base_name: input
            .superclass_resource_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(to_pascal_case),
        root_base_name,
        tables: vec![TableScope {
            table: root,
            collection_base_names: Vec::new(),
            default_collection_base_names: Vec::new(),
        }],
        used_overrides: BTreeSet::new(),
    };

    let node = SchemaNode::new(input.json_schema_for_insert, "$");
    walker.walk(node, &JsonPathExpression::root(), 0)?;

    Ok(TableScopes {
        resource: input.resource(),
        physical_schema: input.physical_schema(),
        storage_kind: ResourceStorageKind::RelationalTables,
        tables: walker.tables,
        used_overrides: walker.used_overrides,
    })
}

// =============================================================================
// Keys
// =============================================================================

/// Root table keyed by `DocumentId` with a cascading FK to `dms.Document`
fn root_table(table: DbTableName) -> DbTableModel {
    let key = TableKey::new(
        primary_key_name(&table),
        vec![DbKeyColumn::new(DOCUMENT_ID, ColumnKind::ParentKeyPart)],
    );
    let columns = key_columns(&key);
    let fk = TableConstraint::foreign_key(
        foreign_key_name(&table, DOCUMENT_TOKEN),
        vec![DOCUMENT_ID],
        DOCUMENT_TABLE,
        vec![DOCUMENT_ID],
    )
    .on_delete(ReferentialAction::Cascade);

    DbTableModel::new(table, JsonPathExpression::root(), key, columns, vec![fk])
}

fn key_columns(key: &TableKey) -> Vec<DbColumnModel> {
    key.columns
        .iter()
        .map(|c| DbColumnModel::new(c.name.clone(), c.kind, key_column_type(c)))
        .collect()
}

fn key_column_type(column: &DbKeyColumn) -> RelationalScalarType {
    match column.kind {
        ColumnKind::ParentKeyPart if is_document_id_column(&column.name) => {
            RelationalScalarType::new(ScalarKind::Int64)
        }
        _ => RelationalScalarType::new(ScalarKind::Int32),
    }
}

/// `<Root>_DocumentId`, one ordinal per ancestor collection, then `Ordinal`
fn child_key(table: &DbTableName, root_base_name: &str, collection_base_names: &[String]) -> TableKey {
    let ancestors = &collection_base_names[..collection_base_names.len().saturating_sub(1)];

    let mut columns = Vec::with_capacity(ancestors.len() + 2);
    columns.push(DbKeyColumn::new(
        root_document_id_column(root_base_name),
        ColumnKind::ParentKeyPart,
    ));
    columns.extend(
        ancestors
            .iter()
            .map(|name| DbKeyColumn::new(parent_collection_ordinal_column(name), ColumnKind::ParentKeyPart)),
    );
    columns.push(DbKeyColumn::new(ORDINAL, ColumnKind::Ordinal));

    TableKey::new(primary_key_name(table), columns)
}

// =============================================================================
// Traversal
// =============================================================================

struct TableWalker<'i, 'a, 'd> {
    input: &'i ResourceSchemaInput<'a>,
    detector: &'d mut CollisionDetector,
    root_base_name: String,
    superclass_base_name: Option<String>,
    tables: Vec<TableScope>,
    used_overrides: BTreeSet<String>,
}

impl TableWalker<'_, '_, '_> {
    fn walk(&mut self, node: SchemaNode<'_>, path: &JsonPathExpression, parent: usize) -> Result<()> {
        node.reject_unsupported()?;

        match node.kind()? {
            SchemaKind::Object => {
                for (name, schema) in node.properties()? {
                    if name == EXTENSION_PROPERTY {
                        continue;
                    }
                    let schema_path = format!("{}.properties.{name}", node.schema_path);
                    self.walk(SchemaNode::new(schema, &schema_path), &path.child(name), parent)?;
                }
                Ok(())
            }
            SchemaKind::Array => {
                let items = node.items()?;
                let child = self.add_collection(path, parent)?;

                let items_path = format!("{}.items", node.schema_path);
                let items = SchemaNode::new(items, &items_path);
                items.reject_unsupported()?;

                match items.kind()? {
                    SchemaKind::Object => self.walk(items, &path.wildcard(), child),
                    // Descriptor arrays: the child table holds a single FK column
                    SchemaKind::Scalar => Ok(()),
                    SchemaKind::Array => Err(BuildError::shape(format!(
                        "Array schema items must be type object at {path} on resource '{}'.",
                        self.input.label()
                    ))),
                }
            }
            SchemaKind::Scalar => Ok(()),
        }
    }

    fn add_collection(&mut self, path: &JsonPathExpression, parent: usize) -> Result<usize> {
        let label = self.input.label();
        let Some(property) = path.last_property() else {
            return Err(BuildError::shape(format!(
                "Array schema must be rooted at a property segment at {path} on resource '{label}'."
            )));
        };

        let scope = path.wildcard();
        let default_base_name = to_collection_base_name(property);
        let parent_scope = &self.tables[parent];

        let base_name = match self
            .input
            .name_override(scope.canonical(), NameOverrideKind::Collection)
        {
            Some(name_override) => {
                let base = self.override_base_name(
                    &name_override.name,
                    &default_base_name,
                    &parent_scope.collection_base_names,
                    &scope,
                )?;
                self.used_overrides.insert(scope.canonical().to_string());
                base
            }
            None => default_base_name.clone(),
        };

        let parent_scope = &self.tables[parent];
        let mut collection_base_names = parent_scope.collection_base_names.clone();
        collection_base_names.push(base_name);
        let mut default_collection_base_names = parent_scope.default_collection_base_names.clone();
        default_collection_base_names.push(default_base_name);

        let physical_schema = self.input.physical_schema();
        let table_name = DbTableName::new(
            physical_schema.clone(),
            format!("{}{}", self.root_base_name, collection_base_names.concat()),
        );
        let default_table_name = DbTableName::new(
            physical_schema,
            format!("{}{}", self.root_base_name, default_collection_base_names.concat()),
        );

        let key = child_key(&table_name, &self.root_base_name, &collection_base_names);
        let default_key = child_key(&default_table_name, &self.root_base_name, &default_collection_base_names);

        let parent_table = &parent_scope.table;
        let fk_columns: Vec<_> = key.columns[..key.columns.len() - 1]
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let fk = TableConstraint::foreign_key(
            foreign_key_name(&table_name, parent_table.table.name()),
            fk_columns,
            parent_table.table.clone(),
            parent_table.key.column_names().cloned().collect(),
        )
        .on_delete(ReferentialAction::Cascade);

        self.detector.register_table(
            &table_name,
            default_table_name.name(),
            IdentifierOrigin::table(&table_name, label, scope.canonical()),
        )?;
        for (column, default) in key.columns.iter().zip(&default_key.columns) {
            self.detector.register_column(
                &table_name,
                &column.name,
                default.name.as_str(),
                IdentifierOrigin::column(&table_name, &column.name, label, scope.canonical()),
            )?;
        }

        let columns = key_columns(&key);
        let table = DbTableModel::new(table_name, scope, key, columns, vec![fk]);
        relmodel_trace_table!(table.table, table.json_scope);

        self.tables.push(TableScope {
            table,
            collection_base_names,
            default_collection_base_names,
        });
        Ok(self.tables.len() - 1)
    }

    /// Strip whatever implied prefix the override author repeated
    fn override_base_name(
        &self,
        override_name: &str,
        default_base_name: &str,
        parent_names: &[String],
        scope: &JsonPathExpression,
    ) -> Result<String> {
        let superclass = self
            .superclass_base_name
            .as_deref()
            .filter(|_| override_name != default_base_name);
        let prefixes = collection_override_prefixes(&self.root_base_name, &parent_names.concat(), superclass);

        strip_collection_override_prefix(override_name, &prefixes).map_err(|prefix| {
            BuildError::InvalidOverride(format!(
                "relational.nameOverrides entry for '{scope}' on resource '{}' must extend the implied \
                 prefix '{prefix}'.",
                self.input.label()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::extract_inputs;
    use crate::options::BuildOptions;
    use serde_json::{Value, json};

    fn api_schema(resource: Value) -> Value {
        json!({
            "projectSchema": {
                "projectName": "Ed-Fi",
                "projectEndpointName": "ed-fi",
                "resourceSchemas": { "schools": resource }
            }
        })
    }

    fn school(relational: Value) -> Value {
        json!({
            "resourceName": "School",
            "isDescriptor": false,
            "identityJsonPaths": [],
            "relational": relational,
            "jsonSchemaForInsert": {
                "type": "object",
                "properties": {
                    "addresses": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "periods": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": { "beginDate": { "type": "string", "format": "date" } }
                                    }
                                }
                            }
                        }
                    },
                    "_ext": {
                        "type": "object",
                        "properties": {
                            "sample": {
                                "type": "object",
                                "properties": { "things": { "type": "array", "items": { "type": "object" } } }
                            }
                        }
                    }
                }
            }
        })
    }

    fn derive(doc: &Value) -> Result<TableScopes> {
        let input = extract_inputs(doc, "schools", &BuildOptions::default())?;
        derive_table_scopes(&input, &mut CollisionDetector::new())
    }

    #[test]
    fn test_nested_collections() {
        let doc = api_schema(school(Value::Null));
        let scopes = derive(&doc).unwrap();

        let names: Vec<_> = scopes.tables.iter().map(|t| t.table.table.name()).collect();
        assert_eq!(names, vec!["School", "SchoolAddress", "SchoolAddressPeriod"]);

        let period = scopes.scope("$.addresses[*].periods[*]").unwrap();
        let key: Vec<_> = period.table.key.column_names().map(|c| c.as_str()).collect();
        assert_eq!(key, vec!["School_DocumentId", "AddressOrdinal", "Ordinal"]);

        let TableConstraint::ForeignKey {
            name,
            columns,
            target_table,
            target_columns,
            on_delete,
            ..
        } = &period.table.constraints[0]
        else {
            panic!("expected foreign key")
        };
        assert_eq!(name, "FK_SchoolAddressPeriod_SchoolAddress");
        assert_eq!(columns.len(), 2);
        assert_eq!(target_table.name(), "SchoolAddress");
        assert_eq!(target_columns[1].as_str(), "Ordinal");
        assert_eq!(*on_delete, ReferentialAction::Cascade);
    }

    #[test]
    fn test_key_column_types() {
        let doc = api_schema(school(Value::Null));
        let scopes = derive(&doc).unwrap();
        let address = scopes.scope("$.addresses[*]").unwrap();

        let doc_id = address.table.column("School_DocumentId").unwrap();
        assert_eq!(doc_id.scalar_type.unwrap().kind, ScalarKind::Int64);
        assert_eq!(address.table.column("Ordinal").unwrap().scalar_type.unwrap().kind, ScalarKind::Int32);
        assert!(!doc_id.is_nullable);
    }

    #[test]
    fn test_extension_subtree_is_skipped() {
        let doc = api_schema(school(Value::Null));
        let scopes = derive(&doc).unwrap();
        assert!(scopes.tables.iter().all(|t| !t.table.json_scope.canonical().contains("_ext")));
    }

    #[test]
    fn test_collection_override_strips_implied_prefix() {
        let doc = api_schema(school(json!({
            "nameOverrides": { "$.addresses[*]": "SchoolLocation" }
        })));
        let scopes = derive(&doc).unwrap();

        let names: Vec<_> = scopes.tables.iter().map(|t| t.table.table.name()).collect();
        assert_eq!(names, vec!["School", "SchoolLocation", "SchoolLocationPeriod"]);
        assert!(scopes.used_overrides.contains("$.addresses[*]"));

        let period = scopes.scope("$.addresses[*].periods[*]").unwrap();
        assert!(period.table.column("LocationOrdinal").is_some());
        assert_eq!(period.default_collection_base_names, vec!["Address", "Period"]);
    }

    #[test]
    fn test_override_equal_to_prefix_fails() {
        let doc = api_schema(school(json!({
            "nameOverrides": { "$.addresses[*]": "School" }
        })));
        let err = derive(&doc).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOverride(_)));
        assert!(err.message().contains("must extend the implied prefix 'School'"));
    }

    #[test]
    fn test_nested_override_reports_the_implied_prefix() {
        let doc = api_schema(school(json!({
            "nameOverrides": { "$.addresses[*].periods[*]": "SchoolAddress" }
        })));
        let err = derive(&doc).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOverride(_)));
        assert_eq!(
            err.message(),
            "relational.nameOverrides entry for '$.addresses[*].periods[*]' on resource 'Ed-Fi:School' must \
             extend the implied prefix 'SchoolAddress'."
        );
    }

    #[test]
    fn test_descriptor_uses_shared_table() {
        let doc = api_schema(json!({
            "resourceName": "GradeLevelDescriptor",
            "isDescriptor": true,
            "identityJsonPaths": [],
            "jsonSchemaForInsert": { "type": "object", "properties": {} }
        }));
        let scopes = derive(&doc).unwrap();

        assert_eq!(scopes.storage_kind, ResourceStorageKind::SharedDescriptorTable);
        assert_eq!(scopes.tables.len(), 1);
        assert_eq!(scopes.root().table.table.to_string(), "dms.Descriptor");
    }
}
