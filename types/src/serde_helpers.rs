//! Serde helpers for `Cow<'static, str>` identifiers
//!
//! Physical names are `Cow<'static, str>` so the shared `dms` names can be
//! consts; anything read back from JSON becomes `Cow::Owned`.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer};

/// Deserialize a String into `Cow<'static, str>`
pub fn cow_from_string<'de, D>(deserializer: D) -> Result<Cow<'static, str>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(Cow::Owned(s))
}
