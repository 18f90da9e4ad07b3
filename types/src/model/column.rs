//! Column types
//!
//! See [`DbColumnModel`] for how a column records where its value comes from.

use std::fmt;

use super::names::{DbColumnName, QualifiedResourceName};
use crate::path::JsonPathExpression;

// =============================================================================
// Kinds
// =============================================================================

/// Role a column plays in its table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnKind {
    /// Value copied from a scalar JSON property
    Scalar,
    /// Foreign key to another resource's document
    DocumentFk,
    /// Foreign key to the shared descriptor table
    DescriptorFk,
    /// Array element position
    Ordinal,
    /// Key part inherited from the root or an ancestor collection
    ParentKeyPart,
}

/// Logical scalar type, mapped to SQL by the DDL generator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarKind {
    String,
    Int32,
    Int64,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
}

impl ScalarKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
        }
    }
}

/// Scalar type plus the length/precision facets some kinds need
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RelationalScalarType {
    pub kind: ScalarKind,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max_length: Option<u32>,
    /// `(precision, scale)` for decimals
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub decimal: Option<(u32, u32)>,
}

impl RelationalScalarType {
    #[must_use]
    pub const fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            max_length: None,
            decimal: None,
        }
    }

    #[must_use]
    pub const fn string(max_length: Option<u32>) -> Self {
        Self {
            kind: ScalarKind::String,
            max_length,
            decimal: None,
        }
    }

    #[must_use]
    pub const fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            kind: ScalarKind::Decimal,
            max_length: None,
            decimal: Some((precision, scale)),
        }
    }
}

/// `string(20)`, `decimal(9,2)`, `int64`
impl fmt::Display for RelationalScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        if let Some(length) = self.max_length {
            write!(f, "({length})")?;
        }
        if let Some((precision, scale)) = self.decimal {
            write!(f, "({precision},{scale})")?;
        }
        Ok(())
    }
}

// =============================================================================
// Column
// =============================================================================

/// A derived column
///
/// `source_json_path` is set for scalar and descriptor columns and names the
/// document value the column stores. Key columns have no source path.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DbColumnModel {
    pub name: DbColumnName,
    pub kind: ColumnKind,
    pub scalar_type: Option<RelationalScalarType>,
    pub is_nullable: bool,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub source_json_path: Option<JsonPathExpression>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub target_resource: Option<QualifiedResourceName>,
}

impl DbColumnModel {
    /// Create a non-nullable column with no source path
    #[must_use]
    pub fn new(name: DbColumnName, kind: ColumnKind, scalar_type: RelationalScalarType) -> Self {
        Self {
            name,
            kind,
            scalar_type: Some(scalar_type),
            is_nullable: false,
            source_json_path: None,
            target_resource: None,
        }
    }

    /// Set nullability
    #[must_use]
    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    /// Set the JSON path the value is read from
    #[must_use]
    pub fn source(mut self, path: JsonPathExpression) -> Self {
        self.source_json_path = Some(path);
        self
    }

    /// Set the resource a foreign-key column points at
    #[must_use]
    pub fn target(mut self, resource: QualifiedResourceName) -> Self {
        self.target_resource = Some(resource);
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}
