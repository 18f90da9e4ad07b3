//! Shared type definitions for relmodel
//!
//! This crate provides the vocabulary used across the relmodel crates:
//!
//! - [`JsonPathExpression`] - compiled JSONPath used as the identity of every schema location
//! - The relational model in the [`model`] module (tables, keys, columns, constraints)
//!
//! # Features
//!
//! - `serde` - Enable serde serialization/deserialization of the model

pub mod model;
pub mod path;
#[cfg(feature = "serde")]
pub mod serde_helpers;

pub use path::{JsonPathError, JsonPathExpression, JsonPathSegment};

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::model::*;
    pub use crate::path::{JsonPathError, JsonPathExpression, JsonPathSegment};
}
