//! Project-wide descriptor path inference
//!
//! Descriptor-valued paths are declared per resource in `documentPathsMapping`
//! and then propagated across references: when resource A references B and
//! the bound identity path is a descriptor path of B, the matching reference
//! path becomes a descriptor path of A. Propagation repeats until nothing
//! changes.

use std::collections::BTreeMap;

use relmodel_types::JsonPathExpression;
use relmodel_types::model::QualifiedResourceName;

use super::json::{JsonObject, entry_object, entry_str, optional_array, optional_object, require_bool, require_str};
use super::project::ProjectSchema;
use crate::error::{BuildError, Result};
use crate::naming::to_pascal_case;
use crate::options::BuildOptions;

/// Where a descriptor value lives and which descriptor resource it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorPathInfo {
    pub descriptor_value_path: JsonPathExpression,
    pub descriptor_resource: QualifiedResourceName,
}

/// Descriptor paths of one resource, keyed by canonical path
pub type DescriptorPathMap = BTreeMap<String, DescriptorPathInfo>;

/// Descriptor paths of every resource in a project
#[derive(Debug, Clone, Default)]
pub struct DescriptorPathIndex {
    by_resource: BTreeMap<QualifiedResourceName, DescriptorPathMap>,
}

#[derive(Debug, Clone)]
struct ReferenceBinding {
    referenced: QualifiedResourceName,
    identity_path: JsonPathExpression,
    reference_path: JsonPathExpression,
}

impl DescriptorPathIndex {
    /// Build the index for every resource in `project`
    pub fn build(project: &ProjectSchema<'_>, options: &BuildOptions) -> Result<Self> {
        let mut by_resource = BTreeMap::new();
        let mut references: BTreeMap<QualifiedResourceName, Vec<ReferenceBinding>> = BTreeMap::new();

        for (resource_name, schema) in project.all_resources()? {
            let resource = QualifiedResourceName::new(&project.project_name, resource_name);
            if by_resource.contains_key(&resource) {
                return Err(BuildError::shape(format!(
                    "Descriptor paths for resource '{resource_name}' are already defined."
                )));
            }

            let label = resource.to_string();
            let paths = resource_descriptor_paths(schema, &project.project_name, &label, options)
                .map_err(|e| e.for_resource(&label))?;
            let bindings = reference_bindings(schema, &label).map_err(|e| e.for_resource(&label))?;
            by_resource.insert(resource.clone(), paths);
            references.insert(resource, bindings);
        }

        let mut index = Self { by_resource };
        index.propagate(&references)?;
        Ok(index)
    }

    #[must_use]
    pub fn paths_for(&self, resource: &QualifiedResourceName) -> Option<&DescriptorPathMap> {
        self.by_resource.get(resource)
    }

    fn propagate(
        &mut self,
        references: &BTreeMap<QualifiedResourceName, Vec<ReferenceBinding>>,
    ) -> Result<()> {
        let mut updated = true;

        while updated {
            updated = false;

            for (resource, bindings) in references {
                let mut ordered: Vec<&ReferenceBinding> = bindings.iter().collect();
                ordered.sort_by(|a, b| {
                    (&a.referenced, &a.identity_path, &a.reference_path).cmp(&(
                        &b.referenced,
                        &b.identity_path,
                        &b.reference_path,
                    ))
                });

                for binding in ordered {
                    let Some(source) = self
                        .by_resource
                        .get(&binding.referenced)
                        .and_then(|paths| paths.get(binding.identity_path.canonical()))
                    else {
                        continue;
                    };
                    let descriptor_resource = source.descriptor_resource.clone();

                    let Some(paths) = self.by_resource.get_mut(resource) else {
                        continue;
                    };
                    let key = binding.reference_path.canonical();

                    match paths.get(key) {
                        Some(existing) if existing.descriptor_resource != descriptor_resource => {
                            return Err(BuildError::shape(format!(
                                "Descriptor path '{key}' is already defined on resource '{resource}'."
                            )));
                        }
                        Some(_) => {}
                        None => {
                            paths.insert(
                                key.to_string(),
                                DescriptorPathInfo {
                                    descriptor_value_path: binding.reference_path.clone(),
                                    descriptor_resource,
                                },
                            );
                            updated = true;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn insert_unique(map: &mut DescriptorPathMap, info: DescriptorPathInfo, label: &str) -> Result<()> {
    let key = info.descriptor_value_path.canonical().to_string();
    if map.contains_key(&key) {
        return Err(BuildError::shape(format!(
            "Descriptor path '{key}' is already defined on resource '{label}'."
        )));
    }
    map.insert(key, info);
    Ok(())
}

fn resource_descriptor_paths(
    schema: &JsonObject,
    project_name: &str,
    label: &str,
    options: &BuildOptions,
) -> Result<DescriptorPathMap> {
    let Some(mapping) = optional_object(schema, "documentPathsMapping", "documentPathsMapping")?
    else {
        return descriptor_paths_from_identity(schema, project_name, label, options);
    };

    let mut paths = DescriptorPathMap::new();

    for (_, entry) in mapping {
        let entry = entry_object(entry, "documentPathsMapping")?;
        if !require_bool(entry, "isReference", "documentPathsMapping entry")? {
            continue;
        }
        if !require_bool(entry, "isDescriptor", "documentPathsMapping entry")? {
            continue;
        }

        let path = super::json::compile(require_str(entry, "path", "documentPathsMapping entry")?, label)?;
        let target = QualifiedResourceName::new(
            require_str(entry, "projectName", "documentPathsMapping entry")?,
            require_str(entry, "resourceName", "documentPathsMapping entry")?,
        );
        insert_unique(
            &mut paths,
            DescriptorPathInfo {
                descriptor_value_path: path,
                descriptor_resource: target,
            },
            label,
        )?;
    }

    Ok(paths)
}

/// Identity paths whose last property ends with the descriptor suffix
fn descriptor_paths_from_identity(
    schema: &JsonObject,
    project_name: &str,
    label: &str,
    options: &BuildOptions,
) -> Result<DescriptorPathMap> {
    let mut paths = DescriptorPathMap::new();
    let Some(identity) = optional_array(schema, "identityJsonPaths", "identityJsonPaths")? else {
        return Ok(paths);
    };

    for entry in identity {
        let path = super::json::compile(entry_str(entry, "identityJsonPaths")?, label)?;
        let Some(property) = path.last_property() else {
            continue;
        };
        if !property.ends_with(options.descriptor_name_suffix.as_str()) {
            continue;
        }

        let target = QualifiedResourceName::new(project_name, to_pascal_case(property));
        insert_unique(
            &mut paths,
            DescriptorPathInfo {
                descriptor_value_path: path,
                descriptor_resource: target,
            },
            label,
        )?;
    }

    Ok(paths)
}

fn reference_bindings(schema: &JsonObject, label: &str) -> Result<Vec<ReferenceBinding>> {
    let Some(mapping) = optional_object(schema, "documentPathsMapping", "documentPathsMapping")?
    else {
        return Ok(Vec::new());
    };

    let mut bindings = Vec::new();

    for (_, entry) in mapping {
        let entry = entry_object(entry, "documentPathsMapping")?;
        if !require_bool(entry, "isReference", "documentPathsMapping entry")? {
            continue;
        }
        let Some(reference_paths) = optional_array(
            entry,
            "referenceJsonPaths",
            "referenceJsonPaths on documentPathsMapping entry",
        )?
        else {
            continue;
        };

        let referenced = QualifiedResourceName::new(
            require_str(entry, "projectName", "documentPathsMapping entry")?,
            require_str(entry, "resourceName", "documentPathsMapping entry")?,
        );

        for binding in reference_paths {
            let binding = entry_object(binding, "referenceJsonPaths")?;
            bindings.push(ReferenceBinding {
                referenced: referenced.clone(),
                identity_path: super::json::compile(
                    require_str(binding, "identityJsonPath", "referenceJsonPaths entry")?,
                    label,
                )?,
                reference_path: super::json::compile(
                    require_str(binding, "referenceJsonPath", "referenceJsonPaths entry")?,
                    label,
                )?,
            });
        }
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_doc() -> serde_json::Value {
        json!({
            "projectSchema": {
                "projectName": "Ed-Fi",
                "projectEndpointName": "ed-fi",
                "resourceSchemas": {
                    "programs": {
                        "resourceName": "Program",
                        "identityJsonPaths": ["$.programName", "$.programTypeDescriptor"],
                        "documentPathsMapping": {
                            "ProgramName": { "isReference": false, "path": "$.programName" },
                            "ProgramType": {
                                "isReference": true,
                                "isDescriptor": true,
                                "path": "$.programTypeDescriptor",
                                "projectName": "Ed-Fi",
                                "resourceName": "ProgramTypeDescriptor"
                            }
                        }
                    },
                    "studentProgramAssociations": {
                        "resourceName": "StudentProgramAssociation",
                        "documentPathsMapping": {
                            "Program": {
                                "isReference": true,
                                "isDescriptor": false,
                                "projectName": "Ed-Fi",
                                "resourceName": "Program",
                                "referenceJsonPaths": [
                                    {
                                        "identityJsonPath": "$.programName",
                                        "referenceJsonPath": "$.programReference.programName"
                                    },
                                    {
                                        "identityJsonPath": "$.programTypeDescriptor",
                                        "referenceJsonPath": "$.programReference.programTypeDescriptor"
                                    }
                                ]
                            }
                        }
                    },
                    "generalPrograms": {
                        "resourceName": "GeneralProgram",
                        "identityJsonPaths": ["$.gradeLevelDescriptor", "$.name"]
                    }
                }
            }
        })
    }

    #[test]
    fn test_declared_and_propagated_paths() {
        let doc = project_doc();
        let project = ProjectSchema::parse(&doc).unwrap();
        let index = DescriptorPathIndex::build(&project, &BuildOptions::default()).unwrap();

        let program = index
            .paths_for(&QualifiedResourceName::new("Ed-Fi", "Program"))
            .unwrap();
        assert!(program.contains_key("$.programTypeDescriptor"));

        let association = index
            .paths_for(&QualifiedResourceName::new("Ed-Fi", "StudentProgramAssociation"))
            .unwrap();
        let propagated = association.get("$.programReference.programTypeDescriptor").unwrap();
        assert_eq!(
            propagated.descriptor_resource,
            QualifiedResourceName::new("Ed-Fi", "ProgramTypeDescriptor")
        );
        assert!(!association.contains_key("$.programReference.programName"));
    }

    #[test]
    fn test_identity_inference_without_mapping() {
        let doc = project_doc();
        let project = ProjectSchema::parse(&doc).unwrap();
        let index = DescriptorPathIndex::build(&project, &BuildOptions::default()).unwrap();

        let general = index
            .paths_for(&QualifiedResourceName::new("Ed-Fi", "GeneralProgram"))
            .unwrap();
        assert_eq!(general.len(), 1);
        assert_eq!(
            general["$.gradeLevelDescriptor"].descriptor_resource.resource_name,
            "GradeLevelDescriptor"
        );
    }
}
