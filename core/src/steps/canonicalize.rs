//! Canonical ordering
//!
//! Re-sorts everything a build accumulates so that two structurally
//! equivalent inputs produce identical models. No validation happens here.

use relmodel_types::model::{
    ColumnKind, DbColumnModel, DbTableModel, DescriptorEdgeSource, ExtensionSite, RelationalResourceModel,
};

use crate::relmodel_trace_step;

/// Sort tables, columns, constraints, edges, references and extension sites
#[must_use]
pub fn canonicalize(model: RelationalResourceModel) -> RelationalResourceModel {
    relmodel_trace_step!("canonicalize", model.resource);

    let RelationalResourceModel {
        resource,
        physical_schema,
        storage_kind,
        root,
        tables_in_dependency_order,
        mut descriptor_edge_sources,
        mut document_references,
        extension_sites,
    } = model;

    let mut tables: Vec<DbTableModel> = tables_in_dependency_order.into_iter().map(canonicalize_table).collect();
    tables.sort_by(|a, b| {
        a.json_scope
            .array_depth()
            .cmp(&b.json_scope.array_depth())
            .then_with(|| a.json_scope.canonical().cmp(b.json_scope.canonical()))
            .then_with(|| a.table.schema().cmp(b.table.schema()))
            .then_with(|| a.table.name().cmp(b.table.name()))
    });

    let root = tables
        .iter()
        .find(|t| t.json_scope.is_root())
        .cloned()
        .unwrap_or_else(|| canonicalize_table(root));

    descriptor_edge_sources.sort_by(|a, b| edge_key(a).cmp(&edge_key(b)));
    document_references.sort_by(|a, b| {
        a.reference_object_path
            .canonical()
            .cmp(b.reference_object_path.canonical())
            .then_with(|| a.mapping_key.cmp(&b.mapping_key))
    });

    let mut extension_sites: Vec<ExtensionSite> = extension_sites
        .into_iter()
        .map(|mut site| {
            site.project_keys.sort();
            site
        })
        .collect();
    extension_sites.sort_by(|a, b| {
        a.owning_scope
            .canonical()
            .cmp(b.owning_scope.canonical())
            .then_with(|| a.extension_path.canonical().cmp(b.extension_path.canonical()))
            .then_with(|| a.project_keys.cmp(&b.project_keys))
    });

    RelationalResourceModel {
        resource,
        physical_schema,
        storage_kind,
        root,
        tables_in_dependency_order: tables,
        descriptor_edge_sources,
        document_references,
        extension_sites,
    }
}

fn canonicalize_table(mut table: DbTableModel) -> DbTableModel {
    let key = table.key.clone();
    let group = |column: &DbColumnModel| -> (u8, usize) {
        if let Some(position) = key.position(&column.name) {
            return (0, position);
        }
        let group = match column.kind {
            ColumnKind::DescriptorFk => 1,
            ColumnKind::Scalar => 2,
            _ => 3,
        };
        (group, usize::MAX)
    };

    table
        .columns
        .sort_by(|a, b| group(a).cmp(&group(b)).then_with(|| a.name().cmp(b.name())));
    table
        .constraints
        .sort_by(|a, b| a.group().cmp(&b.group()).then_with(|| a.name().cmp(b.name())));
    table
}

fn edge_key(edge: &DescriptorEdgeSource) -> (&str, &str, &str, &str, &str, &str, bool) {
    (
        edge.table.schema(),
        edge.table.name(),
        edge.descriptor_value_path.canonical(),
        edge.fk_column.as_str(),
        &edge.descriptor_resource.project_name,
        &edge.descriptor_resource.resource_name,
        edge.is_identity_component,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmodel_types::JsonPathExpression;
    use relmodel_types::model::{
        DbColumnName, DbKeyColumn, DbSchemaName, DbTableName, QualifiedResourceName, RelationalScalarType,
        ResourceStorageKind, ScalarKind, TableKey,
    };

    fn path(text: &str) -> JsonPathExpression {
        JsonPathExpression::compile(text).unwrap()
    }

    fn table(name: &'static str, scope: &str, columns: &[(&'static str, ColumnKind)]) -> DbTableModel {
        let key = TableKey::new(
            format!("PK_{name}"),
            vec![DbKeyColumn::new(DbColumnName::from_static("DocumentId"), ColumnKind::ParentKeyPart)],
        );
        let columns = columns
            .iter()
            .map(|(n, kind)| {
                DbColumnModel::new(DbColumnName::from_static(n), *kind, RelationalScalarType::new(ScalarKind::Int32))
            })
            .collect();
        DbTableModel::new(DbTableName::from_static("edfi", name), path(scope), key, columns, Vec::new())
    }

    #[test]
    fn test_columns_and_tables_are_ordered() {
        let root = table(
            "School",
            "$",
            &[
                ("Zeta", ColumnKind::Scalar),
                ("Grade_DescriptorId", ColumnKind::DescriptorFk),
                ("Alpha", ColumnKind::Scalar),
                ("DocumentId", ColumnKind::ParentKeyPart),
            ],
        );
        let nested = table("SchoolAddressPeriod", "$.addresses[*].periods[*]", &[]);
        let child = table("SchoolAddress", "$.addresses[*]", &[]);

        let model = canonicalize(RelationalResourceModel {
            resource: QualifiedResourceName::new("Ed-Fi", "School"),
            physical_schema: DbSchemaName::from_static("edfi"),
            storage_kind: ResourceStorageKind::RelationalTables,
            root: root.clone(),
            tables_in_dependency_order: vec![nested, root, child],
            descriptor_edge_sources: Vec::new(),
            document_references: Vec::new(),
            extension_sites: vec![ExtensionSite {
                owning_scope: path("$"),
                extension_path: path("$._ext"),
                project_keys: vec!["tpdm".into(), "sample".into()],
            }],
        });

        let names: Vec<_> = model.root.column_names().collect();
        assert_eq!(names, vec!["DocumentId", "Grade_DescriptorId", "Alpha", "Zeta"]);

        let tables: Vec<_> = model.tables_in_dependency_order.iter().map(|t| t.table.name()).collect();
        assert_eq!(tables, vec!["School", "SchoolAddress", "SchoolAddressPeriod"]);
        assert_eq!(model.extension_sites[0].project_keys, vec!["sample", "tpdm"]);
    }
}
