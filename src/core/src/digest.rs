//! One-way digests for credential hashes and session fingerprints
//!
//! All digests render as lowercase hex, the form credential hashes are
//! written in configuration files.

use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// SHA-1 (legacy configurations only)
    Sha1,
    /// SHA-256
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA3-256
    #[serde(rename = "sha3-256")]
    Sha3_256,
    /// SHA3-512
    #[serde(rename = "sha3-512")]
    Sha3_512,
    /// BLAKE3 (32-byte output)
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm
    pub const ALL: [HashAlgorithm; 7] = [
        Self::Sha1,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_256,
        Self::Sha3_512,
        Self::Blake3,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_512 => "sha3-512",
            Self::Blake3 => "blake3",
        }
    }

    /// Parses a name, substituting the default for anything unknown
    ///
    /// Returns the algorithm and whether a substitution happened, so the
    /// caller can log it.
    pub fn from_name_or_default(name: Option<&str>) -> (Self, bool) {
        match name.map(str::parse::<Self>) {
            Some(Ok(algorithm)) => (algorithm, false),
            Some(Err(_)) => (Self::default(), true),
            None => (Self::default(), false),
        }
    }

    /// Hashes `data`, returning lowercase hex
    pub fn hash_hex(&self, data: &[u8]) -> String {
        match self {
            Self::Sha1 => hex::encode(sha1::Sha1::digest(data)),
            Self::Sha256 => hex::encode(sha2::Sha256::digest(data)),
            Self::Sha384 => hex::encode(sha2::Sha384::digest(data)),
            Self::Sha512 => hex::encode(sha2::Sha512::digest(data)),
            Self::Sha3_256 => hex::encode(sha3::Sha3_256::digest(data)),
            Self::Sha3_512 => hex::encode(sha3::Sha3_512::digest(data)),
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }

    /// Hex digest length produced by this algorithm
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 | Self::Sha3_256 | Self::Blake3 => 64,
            Self::Sha384 => 96,
            Self::Sha512 | Self::Sha3_512 => 128,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "sha3-256" | "sha3_256" => Ok(Self::Sha3_256),
            "sha3-512" | "sha3_512" => Ok(Self::Sha3_512),
            "blake3" => Ok(Self::Blake3),
            _ => Err(CoreError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
