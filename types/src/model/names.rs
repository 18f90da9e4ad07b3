//! Logical and physical names

use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "serde")]
use crate::serde_helpers::cow_from_string;

/// A resource identified by its owning project
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct QualifiedResourceName {
    pub project_name: String,
    pub resource_name: String,
}

impl QualifiedResourceName {
    #[must_use]
    pub fn new(project_name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            resource_name: resource_name.into(),
        }
    }
}

/// Renders as `project:resource`, the label used in every diagnostic
impl fmt::Display for QualifiedResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_name, self.resource_name)
    }
}

macro_rules! physical_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(
            #[cfg_attr(feature = "serde", serde(deserialize_with = "cow_from_string"))]
            Cow<'static, str>,
        );

        impl $name {
            /// Create from a static string (usable in consts)
            #[must_use]
            pub const fn from_static(value: &'static str) -> Self {
                Self(Cow::Borrowed(value))
            }

            #[must_use]
            pub fn new(value: impl Into<Cow<'static, str>>) -> Self {
                Self(value.into())
            }

            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Cow::Owned(value))
            }
        }

        impl From<&'static str> for $name {
            fn from(value: &'static str) -> Self {
                Self(Cow::Borrowed(value))
            }
        }
    };
}

physical_name!(
    /// Physical database schema (e.g. `edfi`, `dms`)
    DbSchemaName
);

physical_name!(
    /// Physical column name
    DbColumnName
);

/// Schema-qualified physical table name
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DbTableName {
    pub schema: DbSchemaName,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "cow_from_string"))]
    pub name: Cow<'static, str>,
}

impl DbTableName {
    #[must_use]
    pub fn new(schema: DbSchemaName, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Const constructor for the shared tables
    #[must_use]
    pub const fn from_static(schema: &'static str, name: &'static str) -> Self {
        Self {
            schema: DbSchemaName::from_static(schema),
            name: Cow::Borrowed(name),
        }
    }

    #[inline]
    #[must_use]
    pub fn schema(&self) -> &str {
        self.schema.as_str()
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DbTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
