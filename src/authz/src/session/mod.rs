//! Fingerprinted session authentication
//!
//! A login is bound to a fingerprint of the client's signature and kept in
//! a [`SessionStore`] entry. Each request recomputes the fingerprint and
//! re-checks the entry against the current credential tree, so revoking a
//! credential in configuration ends its sessions on their next request.

mod fingerprint;
mod manager;
mod request;
mod store;

pub use fingerprint::{ClientSignature, Fingerprint, DEFAULT_FINGERPRINT_ALGORITHM};
pub use manager::{Resolution, SessionManager, Transition};
pub use request::{FormAction, RequestContext, LOGIN_FIELD, LOGOUT_FIELD, PASSWORD_FIELD};
pub use store::{InMemorySessionStore, SessionEntry, SessionStore};
