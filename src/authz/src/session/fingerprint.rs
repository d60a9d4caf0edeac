//! Client fingerprints used as session-store keys

use pathgate_core::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain tag mixed into every fingerprint
const FINGERPRINT_DOMAIN: &[u8] = b"pathgate-session-v1";

/// Digest used for fingerprints unless configured otherwise
///
/// Independent of the password digest: changing `hash_type` must leave
/// session keys stable so stale entries are found and invalidated.
pub const DEFAULT_FINGERPRINT_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Client-identifying request attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSignature {
    /// `User-Agent` header
    pub user_agent: String,

    /// Remote address as reported by the host
    pub remote_addr: String,

    /// Requested script or entry path
    pub script_name: String,

    /// Identifier of the host's underlying session
    pub session_id: String,
}

impl ClientSignature {
    /// Create a signature from its four attributes
    pub fn new(
        user_agent: impl Into<String>,
        remote_addr: impl Into<String>,
        script_name: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            remote_addr: remote_addr.into(),
            script_name: script_name.into(),
            session_id: session_id.into(),
        }
    }
}

/// Session-store key derived from a [`ClientSignature`]
///
/// Binds a login to one client signature within one host session. It is
/// not a secret and not a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of `signature` with `algorithm`
    ///
    /// Each attribute is length-prefixed so no two distinct signatures
    /// share an encoding.
    pub fn compute(signature: &ClientSignature, algorithm: HashAlgorithm) -> Self {
        let fields = [
            &signature.user_agent,
            &signature.remote_addr,
            &signature.script_name,
            &signature.session_id,
        ];

        let capacity = FINGERPRINT_DOMAIN.len() + fields.iter().map(|f| f.len() + 8).sum::<usize>();
        let mut encoded = Vec::with_capacity(capacity);
        encoded.extend_from_slice(FINGERPRINT_DOMAIN);
        for field in fields {
            encoded.extend_from_slice(&(field.len() as u64).to_le_bytes());
            encoded.extend_from_slice(field.as_bytes());
        }

        Self(algorithm.hash_hex(&encoded))
    }

    /// Hex digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
