//! Build pipeline steps
//!
//! Each step is a function from one intermediate to the next:
//! [`ResourceSchemaInput`](crate::input::ResourceSchemaInput) to
//! [`TableScopes`] to [`ColumnsBound`], then [`canonicalize`] on the
//! assembled model. The collision detector is threaded through by `&mut`.

mod canonicalize;
mod columns;
mod extensions;
mod tables;
mod validate;

pub use canonicalize::canonicalize;
pub use columns::{ColumnsBound, derive_columns};
pub use extensions::discover_extension_sites;
pub use tables::{TableScope, TableScopes, derive_table_scopes};
pub use validate::validate_json_schema;
