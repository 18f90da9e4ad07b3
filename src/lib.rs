//! # relmodel
//!
//! Compile ApiSchema resource definitions into normalized relational models.
//!
//! ## Quick Start
//!
//! ```rust
//! use relmodel::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> relmodel::Result<()> {
//! let api_schema = json!({
//!     "projectSchema": {
//!         "projectName": "Ed-Fi",
//!         "projectEndpointName": "ed-fi",
//!         "resourceSchemas": {
//!             "schools": {
//!                 "resourceName": "School",
//!                 "isDescriptor": false,
//!                 "identityJsonPaths": ["$.schoolId"],
//!                 "documentPathsMapping": {
//!                     "SchoolId": { "isReference": false, "path": "$.schoolId" }
//!                 },
//!                 "jsonSchemaForInsert": {
//!                     "type": "object",
//!                     "properties": {
//!                         "schoolId": { "type": "integer" },
//!                         "addresses": {
//!                             "type": "array",
//!                             "items": {
//!                                 "type": "object",
//!                                 "properties": { "city": { "type": "string", "maxLength": 30 } }
//!                             }
//!                         }
//!                     },
//!                     "required": ["schoolId"]
//!                 }
//!             }
//!         }
//!     }
//! });
//!
//! let model = RelationalModelBuilder::default().build_resource(&api_schema, "schools")?;
//!
//! assert_eq!(model.root.table.to_string(), "edfi.School");
//! assert!(model.table("SchoolAddress").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate            | Contents                                        |
//! |------------------|-------------------------------------------------|
//! | `relmodel-types` | JSONPath expressions and the relational model   |
//! | `relmodel-core`  | Input extraction, the build pipeline, naming    |
//! | `relmodel-cli`   | The `relmodel` command line tool                |

#![cfg_attr(docsrs, feature(doc_cfg))]

// =============================================================================
// Root-level exports
// =============================================================================

/// Result type for build operations
pub use relmodel_core::Result;

pub use relmodel_core::{
    BuildOptions, ProjectBuild, RelationalModelBuilder, ResourceBuildError, build_from_input,
};

/// Error types
pub mod error {
    pub use relmodel_core::build::ResourceBuildError;
    pub use relmodel_core::error::BuildError;
    pub use relmodel_types::JsonPathError;
}

/// Relational model and JSONPath types
pub use relmodel_types as types;

/// Derived model types: tables, keys, columns and constraints
pub use relmodel_types::model;

/// Compiled JSONPath expressions
pub use relmodel_types::{JsonPathExpression, JsonPathSegment};

/// Pipeline internals for callers that drive the steps themselves.
///
/// ```rust,ignore
/// use relmodel::pipeline::{extract_inputs, steps};
///
/// let input = extract_inputs(&api_schema, "schools", &BuildOptions::default())?;
/// steps::validate_json_schema(&input)?;
/// let sites = steps::discover_extension_sites(&input)?;
/// ```
pub mod pipeline {
    pub use relmodel_core::collision::{CollisionDetector, IdentifierOrigin};
    pub use relmodel_core::input::{ResourceSchemaInput, extract_inputs};
    pub use relmodel_core::{naming, steps};
}

/// Import everything needed to build and inspect models
pub mod prelude {
    pub use crate::error::BuildError;
    pub use relmodel_core::{BuildOptions, ProjectBuild, RelationalModelBuilder};
    pub use relmodel_types::prelude::*;
}
