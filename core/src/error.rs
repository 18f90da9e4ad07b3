use relmodel_types::JsonPathError;
use thiserror::Error;

/// Errors raised while building a relational model
///
/// Every variant carries a message naming the resource (`project:resource`)
/// and, where one applies, the canonical JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A required property is missing, null, or has the wrong JSON type
    #[error("Schema shape error: {0}")]
    SchemaShape(String),

    /// A string failed JSONPath compilation
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Identity paths are not fully covered
    #[error("Identity completeness error: {0}")]
    IdentityCompleteness(String),

    /// An identity path resolved to a nullable column
    #[error("Nullable identity: {0}")]
    NullableIdentity(String),

    /// Two sources produced the same physical identifier
    #[error("{0}")]
    IdentifierCollision(String),

    /// Metadata that was never consumed, or a keyword the mapper does not support
    #[error("Unsupported metadata: {0}")]
    UnsupportedMetadata(String),

    /// A malformed `relational` override block
    #[error("Invalid override: {0}")]
    InvalidOverride(String),
}

impl BuildError {
    /// Message without the variant prefix
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::SchemaShape(m)
            | Self::InvalidPath(m)
            | Self::IdentityCompleteness(m)
            | Self::NullableIdentity(m)
            | Self::IdentifierCollision(m)
            | Self::UnsupportedMetadata(m)
            | Self::InvalidOverride(m) => m,
        }
    }

    /// Short machine-friendly name of the variant
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SchemaShape(_) => "schema_shape",
            Self::InvalidPath(_) => "invalid_path",
            Self::IdentityCompleteness(_) => "identity_completeness",
            Self::NullableIdentity(_) => "nullable_identity",
            Self::IdentifierCollision(_) => "identifier_collision",
            Self::UnsupportedMetadata(_) => "unsupported_metadata",
            Self::InvalidOverride(_) => "invalid_override",
        }
    }

    /// Name the resource in the message unless it already does
    #[must_use]
    pub fn for_resource(self, label: &str) -> Self {
        if self.message().contains(label) {
            return self;
        }
        let prefixed = |m: String| format!("{label}: {m}");
        match self {
            Self::SchemaShape(m) => Self::SchemaShape(prefixed(m)),
            Self::InvalidPath(m) => Self::InvalidPath(prefixed(m)),
            Self::IdentityCompleteness(m) => Self::IdentityCompleteness(prefixed(m)),
            Self::NullableIdentity(m) => Self::NullableIdentity(prefixed(m)),
            Self::IdentifierCollision(m) => Self::IdentifierCollision(prefixed(m)),
            Self::UnsupportedMetadata(m) => Self::UnsupportedMetadata(prefixed(m)),
            Self::InvalidOverride(m) => Self::InvalidOverride(prefixed(m)),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::SchemaShape(message.into())
    }

    /// Wrap a path error with the text that failed and the resource it came from
    pub(crate) fn path(text: &str, resource: &str, source: &JsonPathError) -> Self {
        Self::InvalidPath(format!(
            "'{text}' on resource '{resource}' is not a valid JSONPath: {source}"
        ))
    }
}

impl From<JsonPathError> for BuildError {
    fn from(err: JsonPathError) -> Self {
        Self::InvalidPath(err.to_string())
    }
}

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;
