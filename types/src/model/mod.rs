//! Relational model types
//!
//! Runtime types describing the tables, keys, columns and constraints
//! derived for one resource.

mod column;
mod constraint;
mod key;
mod names;
mod resource;
mod table;

pub use column::{ColumnKind, DbColumnModel, RelationalScalarType, ScalarKind};
pub use constraint::{ReferentialAction, TableConstraint};
pub use key::{DbKeyColumn, TableKey};
pub use names::{DbColumnName, DbSchemaName, DbTableName, QualifiedResourceName};
pub use resource::{
    DescriptorEdgeSource, DocumentReferenceMapping, ExtensionSite, ReferenceJsonPathBinding,
    RelationalResourceModel, ResourceStorageKind,
};
pub use table::DbTableModel;
