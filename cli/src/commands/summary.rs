//! Plain-text rendering of derived models

use std::fmt::Write;

use relmodel_types::model::{DbTableModel, RelationalResourceModel, ResourceStorageKind, TableConstraint};

/// One block per resource: its tables, columns, constraints and descriptor edges
pub fn render(models: &[RelationalResourceModel]) -> String {
    let mut out = String::new();
    for (i, model) in models.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_model(&mut out, model);
    }
    out
}

fn render_model(out: &mut String, model: &RelationalResourceModel) {
    let storage = match model.storage_kind {
        ResourceStorageKind::RelationalTables => "relational tables",
        ResourceStorageKind::SharedDescriptorTable => "shared descriptor table",
    };
    let _ = writeln!(out, "{} ({storage})", model.resource);

    for table in &model.tables_in_dependency_order {
        render_table(out, table);
    }

    if !model.descriptor_edge_sources.is_empty() {
        let _ = writeln!(out, "  descriptor edges:");
        for edge in &model.descriptor_edge_sources {
            let _ = writeln!(
                out,
                "    {} -> {}.{} ({})",
                edge.descriptor_value_path, edge.table, edge.fk_column, edge.descriptor_resource
            );
        }
    }

    if !model.document_references.is_empty() {
        let _ = writeln!(out, "  references:");
        for reference in &model.document_references {
            let identity = if reference.is_part_of_identity { ", identity" } else { "" };
            let _ = writeln!(
                out,
                "    {} -> {}{identity}",
                reference.reference_object_path, reference.target_resource
            );
        }
    }

    for site in &model.extension_sites {
        let _ = writeln!(
            out,
            "  extension {} [{}]",
            site.extension_path,
            site.project_keys.join(", ")
        );
    }
}

fn render_table(out: &mut String, table: &DbTableModel) {
    let _ = writeln!(out, "  table {} {}", table.table, table.json_scope);

    for column in &table.columns {
        let ty = column.scalar_type.map(|t| t.to_string()).unwrap_or_default();
        let null = if column.is_nullable { "null" } else { "not null" };
        let key = if table.is_key_column(&column.name) { " key" } else { "" };
        let _ = writeln!(out, "    {} {ty} {null}{key}", column.name);
    }

    for constraint in &table.constraints {
        match constraint {
            TableConstraint::Unique { name, columns } => {
                let _ = writeln!(out, "    unique {name} ({})", join(columns));
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                target_table,
                target_columns,
                on_delete,
                ..
            } => {
                let _ = writeln!(
                    out,
                    "    fk {name} ({}) -> {target_table} ({}) on delete {}",
                    join(columns),
                    join(target_columns),
                    on_delete.as_sql().to_lowercase()
                );
            }
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
