//! Session entries and the store capability that holds them

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pathgate_core::{HashAlgorithm, IdentityPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::fingerprint::Fingerprint;
use crate::error::Result;

/// Per-fingerprint record of an authenticated login
///
/// Only the credential hash is kept; the submitted password never reaches
/// the store. Changing the configured hash algorithm therefore invalidates
/// every existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Login name as submitted
    pub name: String,

    /// Identity resolved at login
    pub path: IdentityPath,

    /// Credential hash that matched
    pub hash: String,

    /// Algorithm that produced `hash`
    pub algorithm: HashAlgorithm,

    /// When the login happened; kept across re-validation
    pub logged_in_at: DateTime<Utc>,
}

impl SessionEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        name: impl Into<String>,
        path: IdentityPath,
        hash: impl Into<String>,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            hash: hash.into(),
            algorithm,
            logged_in_at: Utc::now(),
        }
    }
}

/// Key-value session storage keyed by fingerprint
///
/// Each call must be atomic for its key. A request's `get` followed by
/// `set` or `delete` is not; serializing concurrent requests that share a
/// fingerprint is left to the host's session layer.
pub trait SessionStore: Send + Sync {
    /// Get the entry stored under `key`
    fn get(&self, key: &Fingerprint) -> Result<Option<SessionEntry>>;

    /// Store `entry` under `key`, replacing any previous entry
    fn set(&self, key: &Fingerprint, entry: SessionEntry) -> Result<()>;

    /// Remove the entry under `key`; absent keys are not an error
    fn delete(&self, key: &Fingerprint) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &Fingerprint) -> Result<Option<SessionEntry>> {
        (**self).get(key)
    }

    fn set(&self, key: &Fingerprint, entry: SessionEntry) -> Result<()> {
        (**self).set(key, entry)
    }

    fn delete(&self, key: &Fingerprint) -> Result<()> {
        (**self).delete(key)
    }
}

/// In-memory session store
///
/// Backed by a sharded `DashMap`: each call on a key is atomic and
/// different keys proceed independently. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<DashMap<Fingerprint, SessionEntry>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &Fingerprint) -> Result<Option<SessionEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &Fingerprint, entry: SessionEntry) -> Result<()> {
        self.entries.insert(key.clone(), entry);
        Ok(())
    }

    fn delete(&self, key: &Fingerprint) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fingerprint::ClientSignature;

    fn key(session_id: &str) -> Fingerprint {
        let signature = ClientSignature::new("ua", "127.0.0.1", "/index.php", session_id);
        Fingerprint::compute(&signature, HashAlgorithm::Sha256)
    }

    fn entry() -> SessionEntry {
        SessionEntry::new("alice", IdentityPath::new("staff/alice"), "h", HashAlgorithm::Sha256)
    }

    #[test]
    fn test_set_get_delete() {
        let store = InMemorySessionStore::new();
        assert!(store.get(&key("a")).unwrap().is_none());

        store.set(&key("a"), entry()).unwrap();
        let stored = store.get(&key("a")).unwrap().unwrap();
        assert_eq!(stored.name, "alice");
        assert_eq!(stored.path, IdentityPath::new("staff/alice"));
        assert!(store.get(&key("b")).unwrap().is_none());

        store.delete(&key("a")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let store = InMemorySessionStore::new();
        store.delete(&key("missing")).unwrap();
        store.delete(&key("missing")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = InMemorySessionStore::new();
        let shared: Arc<dyn SessionStore> = Arc::new(store.clone());
        shared.set(&key("a"), entry()).unwrap();
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(shared.get(&key("a")).unwrap().is_none());
    }

    #[test]
    fn test_entry_serializes_without_password() {
        let value = serde_json::to_value(entry()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["path"], "staff/alice");
        assert_eq!(object["algorithm"], "sha256");
        assert!(!object.contains_key("password"));
    }

    #[test]
    fn test_concurrent_writers_on_distinct_keys() {
        let store = InMemorySessionStore::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let key = key(&format!("sess-{}", i));
                    store.set(&key, entry()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_same_key_calls_are_atomic() {
        let store = InMemorySessionStore::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            store.set(&key("shared"), entry()).unwrap();
                        } else {
                            store.delete(&key("shared")).unwrap();
                        }
                        if let Some(stored) = store.get(&key("shared")).unwrap() {
                            assert_eq!(stored.path, IdentityPath::new("staff/alice"));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(store.len() <= 1);
    }
}
