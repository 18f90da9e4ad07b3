//! Relational model builder
//!
//! Compiles the `jsonSchemaForInsert` of an ApiSchema resource into a
//! relational model: a root table keyed by `DocumentId`, one child table per
//! array scope, scalar and descriptor columns, and the descriptor edges a
//! DDL generator needs.
//!
//! The pipeline is a chain of steps over immutable intermediates, see
//! [`steps`]. [`RelationalModelBuilder`] is the entry point.
//!
//! # Features
//!
//! - `serde` - Serialize the derived model
//! - `tracing` - Emit `tracing` events for every step, table and failure

pub mod build;
pub mod collision;
pub mod error;
pub mod input;
pub mod naming;
pub mod options;
pub mod scalar_type;
pub mod schema;
pub mod steps;
pub mod tracing;

pub use build::{ProjectBuild, RelationalModelBuilder, ResourceBuildError, build_from_input};
pub use collision::{CollisionDetector, IdentifierOrigin};
pub use error::{BuildError, Result};
pub use input::{ResourceSchemaInput, extract_inputs};
pub use options::BuildOptions;
