//! Table constraints

use super::names::{DbColumnName, DbTableName};

// =============================================================================
// Shared Types
// =============================================================================

/// Foreign key referential action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReferentialAction {
    /// No action (default)
    #[default]
    NoAction,
    /// Cascade changes
    Cascade,
}

impl ReferentialAction {
    /// Get the SQL representation
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
        }
    }

    /// Parse from SQL string
    pub fn from_sql(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NO ACTION" => Some(Self::NoAction),
            "CASCADE" => Some(Self::Cascade),
            _ => None,
        }
    }
}

// =============================================================================
// Constraint
// =============================================================================

/// A named table constraint
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")
)]
pub enum TableConstraint {
    Unique {
        name: String,
        columns: Vec<DbColumnName>,
    },
    ForeignKey {
        name: String,
        columns: Vec<DbColumnName>,
        target_table: DbTableName,
        target_columns: Vec<DbColumnName>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
}

impl TableConstraint {
    /// Foreign key with `NO ACTION` on both events
    #[must_use]
    pub fn foreign_key(
        name: impl Into<String>,
        columns: Vec<DbColumnName>,
        target_table: DbTableName,
        target_columns: Vec<DbColumnName>,
    ) -> Self {
        Self::ForeignKey {
            name: name.into(),
            columns,
            target_table,
            target_columns,
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    /// Set ON DELETE on a foreign key; other constraints are returned unchanged
    #[must_use]
    pub fn on_delete(self, action: ReferentialAction) -> Self {
        match self {
            Self::ForeignKey {
                name,
                columns,
                target_table,
                target_columns,
                on_update,
                ..
            } => Self::ForeignKey {
                name,
                columns,
                target_table,
                target_columns,
                on_delete: action,
                on_update,
            },
            other => other,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unique { name, .. } | Self::ForeignKey { name, .. } => name,
        }
    }

    /// Sort group used by canonical ordering: unique constraints before foreign keys
    #[must_use]
    pub const fn group(&self) -> u8 {
        match self {
            Self::Unique { .. } => 1,
            Self::ForeignKey { .. } => 2,
        }
    }
}
