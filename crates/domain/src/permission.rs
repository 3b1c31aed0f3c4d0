//! Hierarchical permission strings and the matcher that compares them.
//!
//! A permission is a colon-delimited list of levels such as
//! `cohort:42:write`. Inside a single level a held permission may list
//! comma-separated alternatives (`cohort:read,write`) or use `*` to accept
//! any value for that level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between permission levels.
pub const LEVEL_SEPARATOR: char = ':';

/// Separator between alternatives inside one level.
pub const ALTERNATIVE_SEPARATOR: char = ',';

/// Wildcard accepted in a held permission level.
pub const WILDCARD: &str = "*";

/// A permission string held by a user or requested by a guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Creates a permission from its string form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw permission string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the permission string is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the colon-delimited levels of this permission.
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.0.split(LEVEL_SEPARATOR)
    }

    /// Returns true if holding `self` grants `requested`.
    #[must_use]
    pub fn grants(&self, requested: &str) -> bool {
        is_granted(&self.0, requested)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Evaluates whether a held permission grants a requested one.
///
/// Levels are compared position by position and both strings must have
/// the same number of levels. A held level matches when its alternatives
/// contain `*` or the requested level verbatim.
#[must_use]
pub fn is_granted(held: &str, requested: &str) -> bool {
    if held.is_empty() || requested.is_empty() {
        return false;
    }
    if held == requested {
        return true;
    }

    let held_levels: Vec<&str> = held.split(LEVEL_SEPARATOR).collect();
    let requested_levels: Vec<&str> = requested.split(LEVEL_SEPARATOR).collect();
    if held_levels.len() != requested_levels.len() {
        return false;
    }

    held_levels
        .iter()
        .zip(&requested_levels)
        .all(|(held_level, requested_level)| level_matches(held_level, requested_level))
}

fn level_matches(held_level: &str, requested_level: &str) -> bool {
    held_level
        .split(ALTERNATIVE_SEPARATOR)
        .any(|alternative| alternative == WILDCARD || alternative == requested_level)
}

/// Returns true if any of the held permissions grants `requested`.
///
/// An empty held list never grants anything.
#[must_use]
pub fn has_any_grant(held: &[Permission], requested: &str) -> bool {
    !requested.is_empty() && held.iter().any(|permission| permission.grants(requested))
}
