//! Hierarchical path comparison
//!
//! Resource paths and identity paths are both `/`-delimited hierarchies.
//! Everything in here is pure string work with no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Path segment separator
pub const SEPARATOR: char = '/';

/// Returns `true` if `parent` is `child` or one of its ancestors
///
/// Matching respects segment boundaries: `a/b` is a parent of `a/b/c`
/// but not of `a/bc`. A parent that already ends with `/` matches any
/// child starting with it. Comparison is case-sensitive and performs no
/// normalization; callers trim their inputs first.
///
/// # Examples
///
/// ```
/// use pathgate_core::path::is_parent_path;
///
/// assert!(is_parent_path("a/b", "a/b/c"));
/// assert!(is_parent_path("a/b", "a/b"));
/// assert!(!is_parent_path("a/b", "a/bc"));
/// assert!(!is_parent_path("", "a"));
/// ```
pub fn is_parent_path(parent: &str, child: &str) -> bool {
    if parent.is_empty() || child.is_empty() {
        return false;
    }
    if parent == child {
        return true;
    }
    if !child.starts_with(parent) {
        return false;
    }

    parent.ends_with(SEPARATOR) || child.as_bytes().get(parent.len()) == Some(&b'/')
}

/// Strips leading and trailing separators and collapses separator runs
pub fn normalize(path: &str) -> String {
    path.split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins `path` under `base`, normalizing both sides
///
/// An empty base leaves the normalized path untouched.
pub fn join(base: &str, path: &str) -> String {
    let base = normalize(base);
    let path = normalize(path);

    match (base.is_empty(), path.is_empty()) {
        (true, _) => path,
        (false, true) => base,
        (false, false) => format!("{}/{}", base, path),
    }
}

/// Identity of a user within the nested groups of the credential tree
///
/// An identity path such as `staff/alice` names the leaf `alice` inside
/// group `staff`. The empty path is the anonymous identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityPath(String);

impl IdentityPath {
    /// Creates an identity path, normalizing separators
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize(path.as_ref()))
    }

    /// The unauthenticated identity
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    /// Whether this names an actual user
    pub fn is_authenticated(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns the raw path string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path segments, root first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Login name: the last segment
    pub fn name(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Enclosing group path, `None` for top-level identities
    pub fn group(&self) -> Option<&str> {
        self.0.rfind(SEPARATOR).map(|idx| &self.0[..idx])
    }

    /// Whether this identity equals `prefix` or lies underneath it
    pub fn is_under(&self, prefix: &str) -> bool {
        is_parent_path(prefix, &self.0)
    }
}

impl FromStr for IdentityPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let path = Self::new(s);
        if path.is_authenticated() {
            Ok(path)
        } else {
            Err(CoreError::invalid_path(format!("'{}' has no segments", s)))
        }
    }
}

impl From<&str> for IdentityPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IdentityPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for IdentityPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
