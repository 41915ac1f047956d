//! Validated name newtypes.
//!
//! A [`Name`] matches `[A-Za-z_][A-Za-z0-9_]*`. A [`QualifiedName`] is one or
//! more names joined by `.`; how many segments are allowed depends on where
//! the name appears, described by [`Namespacing`].

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use crate::error::CoreError;

/// Returns `true` if `value` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A single validated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    /// Validates `value` as a name.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        Self::parse_at(value, "name")
    }

    /// Validates `value`, reporting `path` as the location on failure.
    pub(crate) fn parse_at(value: impl Into<String>, path: &str) -> Result<Self, CoreError> {
        let value = value.into();
        if is_valid_name(&value) {
            Ok(Name(value))
        } else {
            Err(CoreError::InvalidName {
                path: path.to_string(),
                value,
                expected: "a name matching [A-Za-z_][A-Za-z0-9_]*",
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

/// How many `.`-separated segments a qualified name may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespacing {
    /// `name` or `namespace.name`.
    Optional,
    /// At least two segments: `a.b`, `a.b.c`, ...
    Multi,
    /// At least one segment.
    OptionalMulti,
}

impl Namespacing {
    fn accepts(self, segments: usize) -> bool {
        match self {
            Namespacing::Optional => (1..=2).contains(&segments),
            Namespacing::Multi => segments >= 2,
            Namespacing::OptionalMulti => segments >= 1,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Namespacing::Optional => "a name or a namespace.name pair",
            Namespacing::Multi => "a namespaced name with at least two segments",
            Namespacing::OptionalMulti => "one or more names joined by '.'",
        }
    }
}

/// A `.`-joined sequence of validated names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    segments: Vec<Name>,
}

impl QualifiedName {
    /// Parses `value` under the given namespacing rule.
    pub fn parse(value: &str, namespacing: Namespacing) -> Result<Self, CoreError> {
        Self::parse_at(value, namespacing, "name")
    }

    pub(crate) fn parse_at(
        value: &str,
        namespacing: Namespacing,
        path: &str,
    ) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidName {
            path: path.to_string(),
            value: value.to_string(),
            expected: namespacing.expected(),
        };
        let parts: Vec<&str> = value.split('.').collect();
        if !namespacing.accepts(parts.len()) || !parts.iter().all(|p| is_valid_name(p)) {
            return Err(invalid());
        }
        Ok(QualifiedName {
            segments: parts.into_iter().map(|p| Name(p.to_string())).collect(),
        })
    }

    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
