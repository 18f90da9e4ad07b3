//! Identifier collision detection
//!
//! A write-once registry of physical identifiers. Registering the same
//! identifier twice from one origin is harmless; registering it from a
//! different JSON path or original name fails immediately with both origins.

use std::collections::HashMap;
use std::fmt;

use relmodel_types::model::{DbColumnName, DbTableName};

use crate::error::{BuildError, Result};

/// What kind of identifier a scope holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentifierKind {
    Table,
    Column,
}

impl IdentifierKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Column => "column",
        }
    }
}

/// Namespace in which names must be unique
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentifierScope {
    pub kind: IdentifierKind,
    pub schema: String,
    /// Owning table for columns, empty for tables
    pub table: String,
}

impl fmt::Display for IdentifierScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{} {}", self.kind.as_str(), self.schema)
        } else {
            write!(f, "{} {}.{}", self.kind.as_str(), self.schema, self.table)
        }
    }
}

/// Where an identifier came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierOrigin {
    /// `table s.n` or `column s.t.c`
    pub description: String,
    pub resource_label: String,
    pub json_path: String,
}

impl IdentifierOrigin {
    #[must_use]
    pub fn table(table: &DbTableName, resource_label: &str, json_path: &str) -> Self {
        Self {
            description: format!("table {table}"),
            resource_label: resource_label.to_string(),
            json_path: json_path.to_string(),
        }
    }

    #[must_use]
    pub fn column(
        table: &DbTableName,
        column: &DbColumnName,
        resource_label: &str,
        json_path: &str,
    ) -> Self {
        Self {
            description: format!("column {table}.{column}"),
            resource_label: resource_label.to_string(),
            json_path: json_path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IdentifierSource {
    original: String,
    origin: IdentifierOrigin,
}

impl IdentifierSource {
    fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.original,
            &self.origin.description,
            &self.origin.resource_label,
            &self.origin.json_path,
        )
    }
}

impl fmt::Display for IdentifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' from {} ({} at {})",
            self.original, self.origin.description, self.origin.resource_label, self.origin.json_path
        )
    }
}

/// Registry of physical identifiers for one resource build
#[derive(Debug, Default)]
pub struct CollisionDetector {
    entries: HashMap<(IdentifierScope, String), IdentifierSource>,
}

impl CollisionDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_table(
        &mut self,
        table: &DbTableName,
        original_name: &str,
        origin: IdentifierOrigin,
    ) -> Result<()> {
        let scope = IdentifierScope {
            kind: IdentifierKind::Table,
            schema: table.schema().to_string(),
            table: String::new(),
        };
        self.register(scope, table.name(), original_name, origin)
    }

    pub fn register_column(
        &mut self,
        table: &DbTableName,
        column: &DbColumnName,
        original_name: &str,
        origin: IdentifierOrigin,
    ) -> Result<()> {
        let scope = IdentifierScope {
            kind: IdentifierKind::Column,
            schema: table.schema().to_string(),
            table: table.name().to_string(),
        };
        self.register(scope, column.as_str(), original_name, origin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register(
        &mut self,
        scope: IdentifierScope,
        final_name: &str,
        original_name: &str,
        origin: IdentifierOrigin,
    ) -> Result<()> {
        let incoming = IdentifierSource {
            original: original_name.to_string(),
            origin,
        };
        let key = (scope, final_name.to_string());

        match self.entries.get(&key) {
            None => {
                self.entries.insert(key, incoming);
                Ok(())
            }
            Some(existing)
                if existing.origin.json_path == incoming.origin.json_path
                    && existing.original == incoming.original =>
            {
                Ok(())
            }
            Some(existing) => Err(collision_error(&key.0, &key.1, existing, &incoming)),
        }
    }
}

fn collision_error(
    scope: &IdentifierScope,
    final_name: &str,
    a: &IdentifierSource,
    b: &IdentifierSource,
) -> BuildError {
    let mut sources = [a, b];
    sources.sort_by(|x, y| x.sort_key().cmp(&y.sort_key()));

    BuildError::IdentifierCollision(format!(
        "Identifier override collisions detected: {scope}: '{final_name}' <- {}; {}. \
         Use relational.nameOverrides to give one of them a distinct name.",
        sources[0], sources[1]
    ))
}

/// Collision between two columns added to one table under the same name
pub(crate) fn column_collision(
    table: &DbTableName,
    column: &DbColumnName,
    existing: (&str, IdentifierOrigin),
    incoming: (&str, IdentifierOrigin),
) -> BuildError {
    let scope = IdentifierScope {
        kind: IdentifierKind::Column,
        schema: table.schema().to_string(),
        table: table.name().to_string(),
    };
    let a = IdentifierSource {
        original: existing.0.to_string(),
        origin: existing.1,
    };
    let b = IdentifierSource {
        original: incoming.0.to_string(),
        origin: incoming.1,
    };
    collision_error(&scope, column.as_str(), &a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DbTableName {
        DbTableName::from_static("edfi", "School")
    }

    #[test]
    fn test_same_origin_is_idempotent() {
        let mut detector = CollisionDetector::new();
        let origin = IdentifierOrigin::table(&table(), "Ed-Fi:School", "$");
        detector.register_table(&table(), "School", origin.clone()).unwrap();
        detector.register_table(&table(), "School", origin).unwrap();
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn test_different_paths_collide_with_sorted_sources() {
        let mut detector = CollisionDetector::new();
        let column = DbColumnName::from_static("AB");
        detector
            .register_column(
                &table(),
                &column,
                "AB",
                IdentifierOrigin::column(&table(), &column, "Ed-Fi:School", "$.a_b"),
            )
            .unwrap();
        let err = detector
            .register_column(
                &table(),
                &column,
                "AB",
                IdentifierOrigin::column(&table(), &column, "Ed-Fi:School", "$.a-b"),
            )
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Identifier override collisions detected: "));
        assert!(message.contains("relational.nameOverrides"));
        let first = message.find("$.a-b").unwrap();
        let second = message.find("$.a_b").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut detector = CollisionDetector::new();
        let other = DbTableName::from_static("edfi", "SchoolAddress");
        let column = DbColumnName::from_static("City");
        detector
            .register_column(&table(), &column, "City", IdentifierOrigin::column(&table(), &column, "r", "$.city"))
            .unwrap();
        detector
            .register_column(
                &other,
                &column,
                "City",
                IdentifierOrigin::column(&other, &column, "r", "$.addresses[*].city"),
            )
            .unwrap();
        assert_eq!(detector.len(), 2);
    }
}
