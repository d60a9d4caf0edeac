//! Nested credential store
//!
//! Users are configured as a tree of groups whose leaves are password
//! hashes. The path from the root to a leaf is the user's identity:
//!
//! ```text
//! users:
//!   staff:
//!     alice: <hash>      → staff/alice
//!     admins:
//!       carol: <hash>    → staff/admins/carol
//!   root: <hash>         → root
//! ```
//!
//! The tree is rebuilt from configuration for every request and never
//! mutated afterwards.

use indexmap::IndexMap;
use pathgate_core::IdentityPath;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{AuthzError, Result};

/// Groups nested deeper than this are dropped while loading
pub const MAX_DEPTH: usize = 32;

/// A node of the credential tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialNode {
    /// Password hash of a single user
    Leaf(String),
    /// Named children, in configuration order
    Group(IndexMap<String, CredentialNode>),
}

/// Read-only tree of identity segments to password hashes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    root: IndexMap<String, CredentialNode>,
}

impl CredentialStore {
    /// Creates a store from an already-built tree
    pub fn new(root: IndexMap<String, CredentialNode>) -> Self {
        Self { root }
    }

    /// Builds the tree from the parsed `users` configuration section
    ///
    /// The section must be an object. Entries that are neither a hash
    /// string nor a nested object, segment names that are empty or contain
    /// `/`, and groups nested deeper than [`MAX_DEPTH`] are skipped.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(AuthzError::invalid_config(format!(
                "users must be a mapping, found {}",
                value_kind(value)
            )));
        };

        let store = Self::new(build_group(map, "", 1));
        debug!("Loaded credential store with {} identities", store.len());
        Ok(store)
    }

    /// Searches every leaf, in configuration order
    ///
    /// A leaf matches when `name` is unset or equals its own segment name,
    /// and `hash` is unset or equals its stored hash. Returns the full
    /// identity path of each match; an empty result means nothing matched.
    pub fn find_by_name_and_hash(
        &self,
        name: Option<&str>,
        hash: Option<&str>,
    ) -> Vec<IdentityPath> {
        let mut results = Vec::new();
        let mut stack = Vec::new();
        push_children(&mut stack, "", &self.root);

        while let Some((path, segment, node)) = stack.pop() {
            match node {
                CredentialNode::Leaf(stored) => {
                    let name_matches = name.map_or(true, |n| n == segment);
                    let hash_matches = hash.map_or(true, |h| h == stored);
                    if name_matches && hash_matches {
                        results.push(IdentityPath::new(&path));
                    }
                }
                CredentialNode::Group(children) => push_children(&mut stack, &path, children),
            }
        }

        results
    }

    /// Returns the hash stored at `path`
    ///
    /// `None` when a segment is missing or the path ends on a group.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        let identity = IdentityPath::new(path);
        let mut segments = identity.segments().peekable();
        let mut level = &self.root;

        while let Some(segment) = segments.next() {
            let node = level.get(segment)?;
            match (node, segments.peek().is_some()) {
                (CredentialNode::Leaf(hash), false) => return Some(hash.as_str()),
                (CredentialNode::Group(children), true) => level = children,
                _ => return None,
            }
        }

        None
    }

    /// Every configured identity, in configuration order
    pub fn identities(&self) -> Vec<IdentityPath> {
        self.find_by_name_and_hash(None, None)
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.identities().len()
    }

    /// Whether the tree has no leaves
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type StackEntry<'a> = (String, &'a str, &'a CredentialNode);

/// Pushes children in reverse so they pop in configuration order
fn push_children<'a>(
    stack: &mut Vec<StackEntry<'a>>,
    prefix: &str,
    children: &'a IndexMap<String, CredentialNode>,
) {
    for (segment, node) in children.iter().rev() {
        stack.push((child_path(prefix, segment), segment.as_str(), node));
    }
}

fn child_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", prefix, segment)
    }
}

fn build_group(
    map: &Map<String, Value>,
    prefix: &str,
    depth: usize,
) -> IndexMap<String, CredentialNode> {
    let mut children = IndexMap::with_capacity(map.len());

    for (segment, value) in map {
        let path = child_path(prefix, segment);
        if segment.is_empty() || segment.contains('/') {
            warn!("Skipping credential entry '{}': invalid segment name", path);
            continue;
        }

        match value {
            Value::String(hash) => {
                children.insert(segment.clone(), CredentialNode::Leaf(hash.clone()));
            }
            Value::Object(inner) if depth < MAX_DEPTH => {
                let group = build_group(inner, &path, depth + 1);
                children.insert(segment.clone(), CredentialNode::Group(group));
            }
            Value::Object(_) => {
                warn!("Skipping credential group '{}': nested deeper than {}", path, MAX_DEPTH);
            }
            other => {
                warn!(
                    "Skipping credential entry '{}': expected hash or group, found {}",
                    path,
                    value_kind(other)
                );
            }
        }
    }

    children
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
