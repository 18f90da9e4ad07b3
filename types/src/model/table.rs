//! Table model

use super::column::DbColumnModel;
use super::constraint::TableConstraint;
use super::key::TableKey;
use super::names::{DbColumnName, DbTableName};
use crate::path::JsonPathExpression;

/// One derived table
///
/// `json_scope` is `$` for a root table and the wildcard path of the array
/// (e.g. `$.addresses[*]`) for a collection table. Key columns also appear
/// in `columns`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DbTableModel {
    pub table: DbTableName,
    pub json_scope: JsonPathExpression,
    pub key: TableKey,
    pub columns: Vec<DbColumnModel>,
    pub constraints: Vec<TableConstraint>,
}

impl DbTableModel {
    #[must_use]
    pub fn new(
        table: DbTableName,
        json_scope: JsonPathExpression,
        key: TableKey,
        columns: Vec<DbColumnModel>,
        constraints: Vec<TableConstraint>,
    ) -> Self {
        Self {
            table,
            json_scope,
            key,
            columns,
            constraints,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&DbColumnModel> {
        self.columns.iter().find(|c| c.name.as_str() == name)
    }

    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&TableConstraint> {
        self.constraints.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn is_key_column(&self, name: &DbColumnName) -> bool {
        self.key.position(name).is_some()
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(DbColumnModel::name)
    }
}
