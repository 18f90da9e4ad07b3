//! Resource-level model: the compiler's output

use super::names::{DbColumnName, DbSchemaName, DbTableName, QualifiedResourceName};
use super::table::DbTableModel;
use crate::path::JsonPathExpression;

/// How a resource's documents are stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceStorageKind {
    /// Root table plus one table per collection
    RelationalTables,
    /// Rows of the shared `dms.Descriptor` table
    SharedDescriptorTable,
}

/// A descriptor-valued path and the column holding its foreign key
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DescriptorEdgeSource {
    pub is_identity_component: bool,
    pub descriptor_value_path: JsonPathExpression,
    pub table: DbTableName,
    pub fk_column: DbColumnName,
    pub descriptor_resource: QualifiedResourceName,
}

/// Pairing of a referenced resource's identity path with where this document stores it
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReferenceJsonPathBinding {
    pub identity_json_path: JsonPathExpression,
    pub reference_json_path: JsonPathExpression,
}

/// A reference object embedded in the document
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DocumentReferenceMapping {
    /// Key of the `documentPathsMapping` entry
    pub mapping_key: String,
    pub target_resource: QualifiedResourceName,
    pub is_required: bool,
    pub is_part_of_identity: bool,
    pub reference_object_path: JsonPathExpression,
    pub bindings: Vec<ReferenceJsonPathBinding>,
}

impl DocumentReferenceMapping {
    /// Reference paths in binding order
    pub fn reference_paths(&self) -> impl Iterator<Item = &JsonPathExpression> {
        self.bindings.iter().map(|b| &b.reference_json_path)
    }
}

/// Where extension projects attach `_ext` data
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ExtensionSite {
    /// Table scope that owns the `_ext` object
    pub owning_scope: JsonPathExpression,
    /// Path of the `_ext` object itself
    pub extension_path: JsonPathExpression,
    pub project_keys: Vec<String>,
}

/// Immutable result of building one resource
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RelationalResourceModel {
    pub resource: QualifiedResourceName,
    pub physical_schema: DbSchemaName,
    pub storage_kind: ResourceStorageKind,
    pub root: DbTableModel,
    /// Parents before children
    pub tables_in_dependency_order: Vec<DbTableModel>,
    pub descriptor_edge_sources: Vec<DescriptorEdgeSource>,
    pub document_references: Vec<DocumentReferenceMapping>,
    pub extension_sites: Vec<ExtensionSite>,
}

impl RelationalResourceModel {
    /// Table stored at `scope` (canonical form, e.g. `$.addresses[*]`)
    #[must_use]
    pub fn table_for_scope(&self, scope: &str) -> Option<&DbTableModel> {
        self.tables_in_dependency_order
            .iter()
            .find(|t| t.json_scope.canonical() == scope)
    }

    /// Table by physical (unqualified) name
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&DbTableModel> {
        self.tables_in_dependency_order
            .iter()
            .find(|t| t.table.name() == name)
    }
}
