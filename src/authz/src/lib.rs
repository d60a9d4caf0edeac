//! # Pathgate Authorization
//!
//! Hierarchical path authorization with fingerprinted sessions for content
//! hosts.
//!
//! ## Features
//!
//! - **Prefix rules** mapping resource paths to the identity subtrees allowed in
//! - **Nested credential tree** with group paths as identities
//! - **Fingerprinted sessions** re-validated against configuration on every request
//! - **Host hooks** that forbid requests, filter page lists and feed templates
//!
//! ## Example
//!
//! ```rust
//! use pathgate_authz::{ClientSignature, Gatekeeper, InMemorySessionStore, RequestContext};
//! use pathgate_core::HashAlgorithm;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let config = json!({
//!     "users": { "staff": { "alice": HashAlgorithm::Sha256.hash_hex(b"secret") } },
//!     "rights": { "private": "staff" }
//! });
//!
//! let mut gate = Gatekeeper::from_config(&config, Arc::new(InMemorySessionStore::new()));
//! let signature = ClientSignature::new("Mozilla/5.0", "10.0.0.1", "/index.php", "sess-1");
//! let request = RequestContext::new(signature).with_login("alice", "secret");
//!
//! let identity = gate.resolve_identity(&request);
//! assert_eq!(identity.as_str(), "staff/alice");
//! assert!(gate.is_authorized("private/report"));
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod gatekeeper;
pub mod hooks;
pub mod rules;
pub mod session;
pub mod widget;

// Re-export commonly used types
pub use config::Settings;
pub use credentials::{CredentialNode, CredentialStore};
pub use error::{AuthzError, Result};
pub use gatekeeper::Gatekeeper;
pub use hooks::{AccessPlugin, HookDispatcher, Page, PluginHooks, RequestOutcome, FORBIDDEN_PAGE};
pub use rules::{evaluate, is_authorized, AuthorizationEngine, Decision, DecisionReason, Rule};
pub use session::{
    ClientSignature, Fingerprint, FormAction, InMemorySessionStore, RequestContext, Resolution,
    SessionEntry, SessionManager, SessionStore, Transition, DEFAULT_FINGERPRINT_ALGORITHM,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
