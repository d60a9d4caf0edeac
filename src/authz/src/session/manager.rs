//! Login, logout and re-authentication against the session store
//!
//! ```text
//!                 login ok                 revalidation ok
//! Unauthenticated ────────▶ Authenticated ◀──────────────┐
//!        ▲                      │  │                     │
//!        │   logout / failed    │  └─────────────────────┘
//!        └──── revalidation ────┘
//! ```
//!
//! The state is recomputed on every request from the session entry stored
//! under the request's fingerprint and the current credential tree.

use pathgate_core::{HashAlgorithm, IdentityPath};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::fingerprint::{ClientSignature, Fingerprint, DEFAULT_FINGERPRINT_ALGORITHM};
use super::request::{FormAction, RequestContext};
use super::store::{SessionEntry, SessionStore};
use crate::credentials::CredentialStore;

/// Which transition a request went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Explicit logout; any entry was removed
    LoggedOut,
    /// Submitted credentials matched; an entry was written
    LoggedIn,
    /// Submitted credentials matched nothing; the store was left alone
    LoginRejected,
    /// Stored entry still matches the credential tree
    Revalidated,
    /// Stored entry no longer matches and was removed
    Invalidated,
    /// No action and no stored entry
    Anonymous,
}

/// Outcome of resolving one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved identity, anonymous when unauthenticated
    pub identity: IdentityPath,

    /// Transition taken
    pub transition: Transition,

    /// Fingerprint the request was keyed by
    pub fingerprint: Fingerprint,
}

impl Resolution {
    /// Whether the request ended authenticated
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_authenticated()
    }
}

/// Drives the session state machine for a request
pub struct SessionManager<'a> {
    store: &'a dyn SessionStore,
    credentials: &'a CredentialStore,
    algorithm: HashAlgorithm,
    fingerprint_algorithm: HashAlgorithm,
}

impl<'a> SessionManager<'a> {
    /// Create a manager over a store and this request's credential tree
    ///
    /// `algorithm` hashes passwords. Fingerprints use
    /// [`DEFAULT_FINGERPRINT_ALGORITHM`] unless overridden.
    pub fn new(
        store: &'a dyn SessionStore,
        credentials: &'a CredentialStore,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            store,
            credentials,
            algorithm,
            fingerprint_algorithm: DEFAULT_FINGERPRINT_ALGORITHM,
        }
    }

    /// Use `algorithm` for fingerprints
    pub fn with_fingerprint_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.fingerprint_algorithm = algorithm;
        self
    }

    /// Fingerprint for `signature`
    pub fn fingerprint(&self, signature: &ClientSignature) -> Fingerprint {
        Fingerprint::compute(signature, self.fingerprint_algorithm)
    }

    /// Resolves the identity for `request`, updating the session store
    pub fn resolve(&self, request: &RequestContext) -> Resolution {
        let fingerprint = self.fingerprint(&request.signature);

        let (identity, transition) = match &request.action {
            Some(FormAction::Logout) => {
                self.logout(&fingerprint);
                (IdentityPath::anonymous(), Transition::LoggedOut)
            }
            Some(FormAction::Login { name, password }) => {
                match self.login(&fingerprint, name, password) {
                    Some(identity) => (identity, Transition::LoggedIn),
                    None => (IdentityPath::anonymous(), Transition::LoginRejected),
                }
            }
            None => self.revalidate(&fingerprint),
        };

        Resolution {
            identity,
            transition,
            fingerprint,
        }
    }

    /// Attempts a login, recording a session entry on success
    ///
    /// The first identity whose leaf name and hash match wins. A failed
    /// attempt leaves the store untouched.
    pub fn login(
        &self,
        fingerprint: &Fingerprint,
        name: &str,
        password: &SecretString,
    ) -> Option<IdentityPath> {
        let hash = self.algorithm.hash_hex(password.expose_secret().as_bytes());

        let Some(identity) = self.authenticate(name, &hash) else {
            info!("Login rejected for '{}' [{}]", name, fingerprint.short());
            return None;
        };

        let entry = SessionEntry::new(name, identity.clone(), hash, self.algorithm);
        self.persist(fingerprint, entry);
        info!("Login as '{}' [{}]", identity, fingerprint.short());

        Some(identity)
    }

    /// Removes the session entry; a no-op when there is none
    pub fn logout(&self, fingerprint: &Fingerprint) {
        match self.store.delete(fingerprint) {
            Ok(()) => debug!("Session cleared [{}]", fingerprint.short()),
            Err(e) => warn!("Failed to clear session [{}]: {}", fingerprint.short(), e),
        }
    }

    /// Re-checks a stored entry against the current credential tree
    fn revalidate(&self, fingerprint: &Fingerprint) -> (IdentityPath, Transition) {
        let entry = match self.store.get(fingerprint) {
            Ok(Some(entry)) => entry,
            Ok(None) => return (IdentityPath::anonymous(), Transition::Anonymous),
            Err(e) => {
                warn!("Failed to read session [{}]: {}", fingerprint.short(), e);
                return (IdentityPath::anonymous(), Transition::Anonymous);
            }
        };

        if entry.algorithm != self.algorithm {
            info!(
                "Session for '{}' hashed with {}, now {}; invalidating [{}]",
                entry.path,
                entry.algorithm,
                self.algorithm,
                fingerprint.short()
            );
            self.logout(fingerprint);
            return (IdentityPath::anonymous(), Transition::Invalidated);
        }

        match self.authenticate(&entry.name, &entry.hash) {
            Some(identity) => {
                if identity != entry.path {
                    debug!("Session identity moved from '{}' to '{}'", entry.path, identity);
                    let moved = SessionEntry {
                        path: identity.clone(),
                        ..entry
                    };
                    self.persist(fingerprint, moved);
                }
                (identity, Transition::Revalidated)
            }
            None => {
                info!(
                    "Credentials for '{}' changed or removed; invalidating [{}]",
                    entry.path,
                    fingerprint.short()
                );
                self.logout(fingerprint);
                (IdentityPath::anonymous(), Transition::Invalidated)
            }
        }
    }

    fn authenticate(&self, name: &str, hash: &str) -> Option<IdentityPath> {
        self.credentials
            .find_by_name_and_hash(Some(name), Some(hash))
            .into_iter()
            .next()
    }

    fn persist(&self, fingerprint: &Fingerprint, entry: SessionEntry) {
        if let Err(e) = self.store.set(fingerprint, entry) {
            warn!("Failed to write session [{}]: {}", fingerprint.short(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthzError, Result};
    use crate::session::store::InMemorySessionStore;
    use serde_json::json;

    const ALG: HashAlgorithm = HashAlgorithm::Sha256;

    fn credentials(password: &str) -> CredentialStore {
        CredentialStore::from_value(&json!({
            "staff": { "alice": ALG.hash_hex(password.as_bytes()) },
            "guests": { "bob": ALG.hash_hex(b"pw2") }
        }))
        .unwrap()
    }

    fn signature() -> ClientSignature {
        ClientSignature::new("Mozilla/5.0", "127.0.0.1", "/index.php", "sess-1")
    }

    #[test]
    fn test_login_then_revalidate() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let manager = SessionManager::new(&store, &creds, ALG);

        let login = manager.resolve(&RequestContext::new(signature()).with_login("alice", "pw"));
        assert_eq!(login.transition, Transition::LoggedIn);
        assert_eq!(login.identity, IdentityPath::new("staff/alice"));
        assert_eq!(store.len(), 1);

        let next = manager.resolve(&RequestContext::new(signature()));
        assert_eq!(next.transition, Transition::Revalidated);
        assert_eq!(next.identity, IdentityPath::new("staff/alice"));
        assert_eq!(next.fingerprint, login.fingerprint);
    }

    #[test]
    fn test_wrong_password_leaves_store_alone() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let manager = SessionManager::new(&store, &creds, ALG);

        let result = manager.resolve(&RequestContext::new(signature()).with_login("alice", "nope"));
        assert_eq!(result.transition, Transition::LoginRejected);
        assert!(!result.is_authenticated());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stored_entry_has_hash_not_password() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let manager = SessionManager::new(&store, &creds, ALG);

        let login = manager.resolve(&RequestContext::new(signature()).with_login("alice", "pw"));
        let entry = store.get(&login.fingerprint).unwrap().unwrap();
        assert_eq!(entry.hash, ALG.hash_hex(b"pw"));
        assert_eq!(entry.name, "alice");
        assert_eq!(entry.algorithm, ALG);
    }

    #[test]
    fn test_changed_credential_invalidates_session() {
        let store = InMemorySessionStore::new();
        let before = credentials("pw");
        SessionManager::new(&store, &before, ALG)
            .resolve(&RequestContext::new(signature()).with_login("alice", "pw"));

        let after = credentials("rotated");
        let result = SessionManager::new(&store, &after, ALG).resolve(&RequestContext::new(signature()));
        assert_eq!(result.transition, Transition::Invalidated);
        assert!(!result.is_authenticated());
        assert!(store.is_empty());
    }

    #[test]
    fn test_removed_credential_invalidates_session() {
        let store = InMemorySessionStore::new();
        let before = credentials("pw");
        SessionManager::new(&store, &before, ALG)
            .resolve(&RequestContext::new(signature()).with_login("alice", "pw"));

        let after = CredentialStore::from_value(&json!({ "guests": { "bob": "x" } })).unwrap();
        let result = SessionManager::new(&store, &after, ALG).resolve(&RequestContext::new(signature()));
        assert_eq!(result.transition, Transition::Invalidated);
        assert!(store.is_empty());
    }

    #[test]
    fn test_algorithm_change_invalidates_session() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let login = SessionManager::new(&store, &creds, ALG)
            .resolve(&RequestContext::new(signature()).with_login("alice", "pw"));

        let manager = SessionManager::new(&store, &creds, HashAlgorithm::Sha512);
        assert_eq!(manager.fingerprint(&signature()), login.fingerprint);

        let result = manager.resolve(&RequestContext::new(signature()));
        assert_eq!(result.transition, Transition::Invalidated);
        assert!(!result.is_authenticated());
        assert!(store.is_empty());
    }

    #[test]
    fn test_fingerprint_algorithm_override() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let default = SessionManager::new(&store, &creds, ALG);
        let blake = SessionManager::new(&store, &creds, ALG)
            .with_fingerprint_algorithm(HashAlgorithm::Blake3);

        assert_eq!(
            blake.fingerprint(&signature()),
            Fingerprint::compute(&signature(), HashAlgorithm::Blake3)
        );
        assert_ne!(blake.fingerprint(&signature()), default.fingerprint(&signature()));
    }

    #[test]
    fn test_moved_identity_follows_credentials() {
        let store = InMemorySessionStore::new();
        let hash = ALG.hash_hex(b"pw");
        let before = CredentialStore::from_value(&json!({ "staff": { "alice": hash } })).unwrap();
        SessionManager::new(&store, &before, ALG)
            .resolve(&RequestContext::new(signature()).with_login("alice", "pw"));

        let after =
            CredentialStore::from_value(&json!({ "staff": { "admins": { "alice": hash } } })).unwrap();
        let manager = SessionManager::new(&store, &after, ALG);
        let result = manager.resolve(&RequestContext::new(signature()));
        assert_eq!(result.identity, IdentityPath::new("staff/admins/alice"));

        let entry = store.get(&result.fingerprint).unwrap().unwrap();
        assert_eq!(entry.path, IdentityPath::new("staff/admins/alice"));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let manager = SessionManager::new(&store, &creds, ALG);
        manager.resolve(&RequestContext::new(signature()).with_login("alice", "pw"));

        for _ in 0..2 {
            let result = manager.resolve(&RequestContext::new(signature()).with_logout());
            assert_eq!(result.transition, Transition::LoggedOut);
            assert!(!result.is_authenticated());
            assert!(store.is_empty());
        }
    }

    #[test]
    fn test_other_signature_does_not_share_session() {
        let store = InMemorySessionStore::new();
        let creds = credentials("pw");
        let manager = SessionManager::new(&store, &creds, ALG);
        manager.resolve(&RequestContext::new(signature()).with_login("alice", "pw"));

        let stranger = ClientSignature {
            user_agent: "curl/8.0".into(),
            ..signature()
        };
        let result = manager.resolve(&RequestContext::new(stranger));
        assert_eq!(result.transition, Transition::Anonymous);
        assert_eq!(store.len(), 1);
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn get(&self, _: &Fingerprint) -> Result<Option<SessionEntry>> {
            Err(AuthzError::session_store("unavailable"))
        }

        fn set(&self, _: &Fingerprint, _: SessionEntry) -> Result<()> {
            Err(AuthzError::session_store("unavailable"))
        }

        fn delete(&self, _: &Fingerprint) -> Result<()> {
            Err(AuthzError::session_store("unavailable"))
        }
    }

    #[test]
    fn test_store_failures_resolve_safely() {
        let creds = credentials("pw");
        let manager = SessionManager::new(&FailingStore, &creds, ALG);

        let anonymous = manager.resolve(&RequestContext::new(signature()));
        assert_eq!(anonymous.transition, Transition::Anonymous);

        let login = manager.resolve(&RequestContext::new(signature()).with_login("alice", "pw"));
        assert_eq!(login.identity, IdentityPath::new("staff/alice"));

        let logout = manager.resolve(&RequestContext::new(signature()).with_logout());
        assert_eq!(logout.transition, Transition::LoggedOut);
    }
}
