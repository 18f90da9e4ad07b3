//! Extension site discovery

use relmodel_types::JsonPathExpression;
use relmodel_types::model::ExtensionSite;

use crate::error::Result;
use crate::input::ResourceSchemaInput;
use crate::naming::EXTENSION_PROPERTY;
use crate::relmodel_trace_step;
use crate::schema::{SchemaKind, SchemaNode};

/// Every object scope that declares `_ext`, with the project keys found there
pub fn discover_extension_sites(input: &ResourceSchemaInput<'_>) -> Result<Vec<ExtensionSite>> {
    relmodel_trace_step!("discover_extension_sites", input.label());

    let mut sites = Vec::new();
    let root = SchemaNode::new(input.json_schema_for_insert, "$");
    visit(root, &JsonPathExpression::root(), &mut sites)?;
    Ok(sites)
}

fn visit(node: SchemaNode<'_>, path: &JsonPathExpression, sites: &mut Vec<ExtensionSite>) -> Result<()> {
    match node.kind()? {
        SchemaKind::Object => {
            for (name, schema) in node.properties()? {
                let schema_path = format!("{}.properties.{name}", node.schema_path);
                let child = SchemaNode::new(schema, &schema_path);

                if name == EXTENSION_PROPERTY {
                    let mut project_keys: Vec<String> = child
                        .properties()?
                        .into_iter()
                        .map(|(key, _)| key.to_string())
                        .collect();
                    project_keys.sort();

                    sites.push(ExtensionSite {
                        owning_scope: path.array_scope().unwrap_or_else(JsonPathExpression::root),
                        extension_path: path.child(name),
                        project_keys,
                    });
                    continue;
                }

                visit(child, &path.child(name), sites)?;
            }
        }
        SchemaKind::Array => {
            let items_path = format!("{}.items", node.schema_path);
            visit(SchemaNode::new(node.items()?, &items_path), &path.wildcard(), sites)?;
        }
        SchemaKind::Scalar => {}
    }

    Ok(())
}
