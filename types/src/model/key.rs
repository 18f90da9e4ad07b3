//! Primary key types

use super::column::ColumnKind;
use super::names::DbColumnName;

/// One column of a table's primary key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DbKeyColumn {
    pub name: DbColumnName,
    pub kind: ColumnKind,
}

impl DbKeyColumn {
    #[must_use]
    pub fn new(name: DbColumnName, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered primary key with its constraint name
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TableKey {
    pub constraint_name: String,
    pub columns: Vec<DbKeyColumn>,
}

impl TableKey {
    #[must_use]
    pub fn new(constraint_name: impl Into<String>, columns: Vec<DbKeyColumn>) -> Self {
        Self {
            constraint_name: constraint_name.into(),
            columns,
        }
    }

    /// Position of `name` in the key, if it is a key column
    #[must_use]
    pub fn position(&self, name: &DbColumnName) -> Option<usize> {
        self.columns.iter().position(|c| &c.name == name)
    }

    /// Column names in key order
    pub fn column_names(&self) -> impl Iterator<Item = &DbColumnName> {
        self.columns.iter().map(|c| &c.name)
    }
}
