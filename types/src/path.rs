//! JSONPath expressions used as identities throughout the model
//!
//! Only the restricted dialect the relational mapper needs is accepted:
//! a `$` root followed by `.property` and `[*]` segments. Every expression
//! carries a canonical string so structurally identical paths compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::value,
    sequence::preceded,
};

/// Canonical form of the document root.
pub const ROOT: &str = "$";

// =============================================================================
// Errors
// =============================================================================

/// Reasons a JSONPath string or segment list is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonPathError {
    #[error("JsonPath must not be empty.")]
    Empty,
    #[error("JsonPath must start with '$'.")]
    MissingRoot,
    #[error("JsonPath contains invalid property character '{0}'.")]
    InvalidPropertyCharacter(char),
    #[error("JsonPath property segments must be non-empty.")]
    EmptyProperty,
    #[error("JsonPath array wildcards must follow a property segment.")]
    WildcardWithoutProperty,
    #[error("JsonPath array segments must use the wildcard [*].")]
    NonWildcardArray,
    #[error("JsonPath contains unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("JsonPath property name '{0}' is invalid.")]
    InvalidPropertyName(String),
}

// =============================================================================
// Segments
// =============================================================================

/// A single step of a path expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JsonPathSegment {
    /// `.name`
    Property(String),
    /// `[*]`
    AnyArrayElement,
}

impl JsonPathSegment {
    /// Shorthand for a property segment
    #[must_use]
    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    #[inline]
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::AnyArrayElement)
    }

    /// Property name, if this is a property segment
    #[inline]
    #[must_use]
    pub fn as_property(&self) -> Option<&str> {
        match self {
            Self::Property(name) => Some(name),
            Self::AnyArrayElement => None,
        }
    }
}

// =============================================================================
// Expression
// =============================================================================

/// A compiled path expression
///
/// Equality, ordering and hashing all go through [`canonical`](Self::canonical).
///
/// # Examples
///
/// ```
/// use relmodel_types::JsonPathExpression;
///
/// let path = JsonPathExpression::compile("$.addresses[*].city").unwrap();
/// assert_eq!(path.canonical(), "$.addresses[*].city");
/// assert_eq!(path.array_depth(), 1);
/// ```
#[derive(Clone)]
pub struct JsonPathExpression {
    canonical: String,
    segments: Vec<JsonPathSegment>,
}

impl JsonPathExpression {
    /// The `$` expression
    #[must_use]
    pub fn root() -> Self {
        Self {
            canonical: ROOT.to_string(),
            segments: Vec::new(),
        }
    }

    /// Parse a JSONPath string
    pub fn compile(text: &str) -> Result<Self, JsonPathError> {
        if text.is_empty() {
            return Err(JsonPathError::Empty);
        }

        let Some(mut rest) = text.strip_prefix('$') else {
            return Err(JsonPathError::MissingRoot);
        };

        let mut segments: Vec<JsonPathSegment> = Vec::new();

        while !rest.is_empty() {
            let after_property = matches!(segments.last(), Some(JsonPathSegment::Property(_)));

            match segment(rest) {
                Ok((next, parsed)) => {
                    if parsed.is_wildcard() && !after_property {
                        return Err(JsonPathError::WildcardWithoutProperty);
                    }
                    segments.push(parsed);
                    rest = next;
                }
                Err(_) => return Err(diagnose(rest, after_property)),
            }
        }

        Ok(Self::from_valid_segments(segments))
    }

    /// Build an expression from already-split segments
    pub fn from_segments<I>(segments: I) -> Result<Self, JsonPathError>
    where
        I: IntoIterator<Item = JsonPathSegment>,
    {
        let segments: Vec<JsonPathSegment> = segments.into_iter().collect();

        let mut previous: Option<&JsonPathSegment> = None;
        for current in &segments {
            match current {
                JsonPathSegment::Property(name) => {
                    if name.is_empty() || !name.chars().all(is_property_char) {
                        return Err(JsonPathError::InvalidPropertyName(name.clone()));
                    }
                }
                JsonPathSegment::AnyArrayElement => {
                    if !matches!(previous, Some(JsonPathSegment::Property(_))) {
                        return Err(JsonPathError::WildcardWithoutProperty);
                    }
                }
            }
            previous = Some(current);
        }

        Ok(Self::from_valid_segments(segments))
    }

    fn from_valid_segments(segments: Vec<JsonPathSegment>) -> Self {
        let mut canonical = String::from(ROOT);
        for segment in &segments {
            match segment {
                JsonPathSegment::Property(name) => {
                    canonical.push('.');
                    canonical.push_str(name);
                }
                JsonPathSegment::AnyArrayElement => canonical.push_str("[*]"),
            }
        }
        Self {
            canonical,
            segments,
        }
    }

    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[JsonPathSegment] {
        &self.segments
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of `[*]` segments
    #[must_use]
    pub fn array_depth(&self) -> usize {
        self.segments.iter().filter(|s| s.is_wildcard()).count()
    }

    #[must_use]
    pub fn last_segment(&self) -> Option<&JsonPathSegment> {
        self.segments.last()
    }

    /// Name of the last segment when it is a property
    #[must_use]
    pub fn last_property(&self) -> Option<&str> {
        self.segments.last().and_then(JsonPathSegment::as_property)
    }

    /// The expression without its last segment (`None` for the root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self::from_valid_segments(init.to_vec()))
    }

    /// Prefix up to and including the last `[*]`, if any
    #[must_use]
    pub fn array_scope(&self) -> Option<Self> {
        let index = self.segments.iter().rposition(JsonPathSegment::is_wildcard)?;
        Some(Self::from_valid_segments(self.segments[..=index].to_vec()))
    }

    /// Concatenate `other`'s segments onto this expression
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        if other.is_root() {
            return self.clone();
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self::from_valid_segments(segments)
    }

    /// Append a property segment
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(JsonPathSegment::property(name));
        Self::from_valid_segments(segments)
    }

    /// Append a `[*]` segment
    #[must_use]
    pub fn wildcard(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(JsonPathSegment::AnyArrayElement);
        Self::from_valid_segments(segments)
    }

    /// Segment-wise prefix test (`$.a` is a prefix of `$.a.b`, not of `$.ab`)
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Remove `prefix` and re-root the remainder at `$`
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        let rest = self.segments.strip_prefix(prefix.segments.as_slice())?;
        Some(Self::from_valid_segments(rest.to_vec()))
    }
}

// =============================================================================
// Parser
// =============================================================================

fn is_property_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn property(input: &str) -> IResult<&str, JsonPathSegment> {
    preceded(char('.'), take_while1(is_property_char))
        .map(JsonPathSegment::property)
        .parse(input)
}

fn any_element(input: &str) -> IResult<&str, JsonPathSegment> {
    value(JsonPathSegment::AnyArrayElement, tag("[*]")).parse(input)
}

fn segment(input: &str) -> IResult<&str, JsonPathSegment> {
    alt((property, any_element)).parse(input)
}

/// Explain why `rest` did not parse as a segment
fn diagnose(rest: &str, after_property: bool) -> JsonPathError {
    let mut chars = rest.chars();
    match chars.next() {
        Some('.') => match chars.next() {
            None | Some('.') | Some('[') => JsonPathError::EmptyProperty,
            Some(c) => JsonPathError::InvalidPropertyCharacter(c),
        },
        Some('[') if !after_property => JsonPathError::WildcardWithoutProperty,
        Some('[') => JsonPathError::NonWildcardArray,
        Some(c) if after_property => JsonPathError::InvalidPropertyCharacter(c),
        Some(c) => JsonPathError::UnexpectedCharacter(c),
        None => JsonPathError::Empty,
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl fmt::Debug for JsonPathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JsonPathExpression")
            .field(&self.canonical)
            .finish()
    }
}

impl fmt::Display for JsonPathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl PartialEq for JsonPathExpression {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for JsonPathExpression {}

impl Hash for JsonPathExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for JsonPathExpression {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonPathExpression {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl std::str::FromStr for JsonPathExpression {
    type Err = JsonPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

// =============================================================================
// Serde Implementation
// =============================================================================

#[cfg(feature = "serde")]
mod serde_impl {
    use super::JsonPathExpression;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for JsonPathExpression {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.canonical())
        }
    }

    impl<'de> Deserialize<'de> for JsonPathExpression {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let text = String::deserialize(deserializer)?;
            JsonPathExpression::compile(&text).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str) -> JsonPathExpression {
        JsonPathExpression::compile(text).unwrap()
    }

    #[test]
    fn test_root_has_no_segments() {
        let path = compile("$");
        assert!(path.is_root());
        assert_eq!(path.canonical(), "$");
        assert_eq!(path, JsonPathExpression::root());
    }

    #[test]
    fn test_properties_and_wildcards() {
        let path = compile("$.addresses[*].periods[*].beginDate");
        assert_eq!(
            path.segments(),
            &[
                JsonPathSegment::property("addresses"),
                JsonPathSegment::AnyArrayElement,
                JsonPathSegment::property("periods"),
                JsonPathSegment::AnyArrayElement,
                JsonPathSegment::property("beginDate"),
            ]
        );
        assert_eq!(path.array_depth(), 2);
        assert_eq!(path.last_property(), Some("beginDate"));
    }

    #[test]
    fn test_hyphen_and_underscore_names() {
        assert_eq!(compile("$._ext.ed-fi").canonical(), "$._ext.ed-fi");
    }

    #[test]
    fn test_rejects_malformed_paths() {
        let cases = [
            ("", JsonPathError::Empty),
            ("addresses", JsonPathError::MissingRoot),
            ("$.", JsonPathError::EmptyProperty),
            ("$..a", JsonPathError::EmptyProperty),
            ("$[*]", JsonPathError::WildcardWithoutProperty),
            ("$.a[*][*]", JsonPathError::WildcardWithoutProperty),
            ("$.a[0]", JsonPathError::NonWildcardArray),
            ("$.a['b']", JsonPathError::NonWildcardArray),
            ("$.a b", JsonPathError::InvalidPropertyCharacter(' ')),
            ("$x", JsonPathError::UnexpectedCharacter('x')),
        ];

        for (text, expected) in cases {
            assert_eq!(
                JsonPathExpression::compile(text).unwrap_err(),
                expected,
                "{text}"
            );
        }
    }

    #[test]
    fn test_from_segments_matches_compile() {
        let built = JsonPathExpression::from_segments([
            JsonPathSegment::property("items"),
            JsonPathSegment::AnyArrayElement,
            JsonPathSegment::property("code"),
        ])
        .unwrap();
        assert_eq!(built, compile("$.items[*].code"));
        assert_eq!(built.canonical(), "$.items[*].code");
    }

    #[test]
    fn test_from_segments_validation() {
        assert_eq!(
            JsonPathExpression::from_segments([JsonPathSegment::AnyArrayElement]).unwrap_err(),
            JsonPathError::WildcardWithoutProperty
        );
        assert_eq!(
            JsonPathExpression::from_segments([JsonPathSegment::property("a.b")]).unwrap_err(),
            JsonPathError::InvalidPropertyName("a.b".into())
        );
        assert!(JsonPathExpression::from_segments([]).unwrap().is_root());
    }

    #[test]
    fn test_prefix_helpers() {
        let scope = compile("$.a[*]");
        let path = compile("$.a[*].b.c");
        assert!(path.starts_with(&scope));
        assert!(!compile("$.ab").starts_with(&compile("$.a")));
        assert_eq!(path.array_scope(), Some(scope.clone()));
        assert_eq!(path.strip_prefix(&scope).unwrap().canonical(), "$.b.c");
        assert_eq!(scope.join(&compile("$.b.c")), path);
        assert_eq!(path.parent().unwrap().canonical(), "$.a[*].b");
        assert_eq!(compile("$.a").array_scope(), None);
    }
}
