//! Request-scoped settings snapshot
//!
//! The host parses its configuration file and hands over the resulting
//! JSON value. Loading is lenient: a missing or malformed section is logged
//! and treated as empty so a bad config never takes the site down.

use pathgate_core::HashAlgorithm;
use serde_json::{Map, Value};
use tracing::warn;

use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::rules::{rules_from_value, Rule};

/// Parsed `users`, `rights` and policy settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Prefix every resource path is rooted under before matching
    pub base_path: String,

    /// Credential tree
    pub users: CredentialStore,

    /// Ordered access rules
    pub rights: Vec<Rule>,

    /// Digest for passwords
    pub hash_algorithm: HashAlgorithm,

    /// Digest for session fingerprints, kept apart from `hash_algorithm`
    pub fingerprint_algorithm: HashAlgorithm,

    /// Close resources no rule mentions
    pub require_explicit_grant: bool,
}

impl Settings {
    /// Reads settings out of an already-parsed configuration value
    pub fn from_value(config: &Value) -> Self {
        let Value::Object(config) = config else {
            warn!("Configuration is not a mapping; using defaults");
            return Self::default();
        };

        let users = match lookup(config, &["users"]) {
            Some(value) => CredentialStore::from_value(value).unwrap_or_else(|e| {
                warn!("Ignoring users section: {}", e);
                CredentialStore::default()
            }),
            None => CredentialStore::default(),
        };

        let rights = match lookup(config, &["rights"]) {
            Some(value) => rules_from_value(value).unwrap_or_else(|e| {
                warn!("Ignoring rights section: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let algorithm_name = lookup(config, &["hash_type", "hashAlgorithm", "hash_algorithm"])
            .and_then(Value::as_str);
        let (hash_algorithm, substituted) = HashAlgorithm::from_name_or_default(algorithm_name);
        if substituted {
            warn!(
                "Unsupported hash algorithm '{}'; using {}",
                algorithm_name.unwrap_or_default(),
                hash_algorithm
            );
        }

        let fingerprint_name = lookup(
            config,
            &["fingerprint_hash_type", "fingerprintAlgorithm", "fingerprint_algorithm"],
        )
        .and_then(Value::as_str);
        let (fingerprint_algorithm, substituted) =
            HashAlgorithm::from_name_or_default(fingerprint_name);
        if substituted {
            warn!(
                "Unsupported fingerprint algorithm '{}'; using {}",
                fingerprint_name.unwrap_or_default(),
                fingerprint_algorithm
            );
        }

        let base_path = lookup(config, &["base_url", "basePath", "base_path"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let require_explicit_grant =
            lookup(config, &["require_explicit_grant", "requireExplicitGrant"])
                .and_then(Value::as_bool)
                .unwrap_or(false);

        Self {
            base_path,
            users,
            rights,
            hash_algorithm,
            fingerprint_algorithm,
            require_explicit_grant,
        }
    }

    /// Parses settings from JSON text
    ///
    /// Only a syntax error fails; shape problems fall back as in
    /// [`from_value`](Self::from_value).
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }
}

/// First non-null value among `keys`
fn lookup<'a>(config: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| config.get(*key))
        .find(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathgate_core::IdentityPath;
    use serde_json::json;

    #[test]
    fn test_full_configuration() {
        let settings = Settings::from_value(&json!({
            "base_url": "/site/",
            "hash_type": "sha1",
            "require_explicit_grant": true,
            "users": { "staff": { "alice": "h" } },
            "rights": { "private": "staff" }
        }));

        assert_eq!(settings.base_path, "/site/");
        assert_eq!(settings.hash_algorithm, HashAlgorithm::Sha1);
        assert_eq!(settings.fingerprint_algorithm, HashAlgorithm::Sha256);
        assert!(settings.require_explicit_grant);
        assert_eq!(settings.users.identities(), vec![IdentityPath::new("staff/alice")]);
        assert_eq!(settings.rights, vec![Rule::new("private", "staff")]);
    }

    #[test]
    fn test_camel_case_keys() {
        let settings = Settings::from_value(&json!({
            "basePath": "site",
            "hashAlgorithm": "sha3-256",
            "requireExplicitGrant": true
        }));
        assert_eq!(settings.base_path, "site");
        assert_eq!(settings.hash_algorithm, HashAlgorithm::Sha3_256);
        assert!(settings.require_explicit_grant);
    }

    #[test]
    fn test_fingerprint_algorithm_is_separate() {
        let settings = Settings::from_value(&json!({
            "hash_type": "sha512",
            "fingerprint_hash_type": "blake3"
        }));
        assert_eq!(settings.hash_algorithm, HashAlgorithm::Sha512);
        assert_eq!(settings.fingerprint_algorithm, HashAlgorithm::Blake3);
    }

    #[test]
    fn test_malformed_sections_become_empty() {
        let settings = Settings::from_value(&json!({
            "users": "alice:pw",
            "rights": 7,
            "hash_type": "rot13"
        }));
        assert!(settings.users.is_empty());
        assert!(settings.rights.is_empty());
        assert_eq!(settings.hash_algorithm, HashAlgorithm::Sha256);
        assert!(!settings.require_explicit_grant);
    }

    #[test]
    fn test_non_mapping_config() {
        let settings = Settings::from_value(&json!([1, 2, 3]));
        assert!(settings.users.is_empty());
        assert!(settings.rights.is_empty());
        assert_eq!(settings.base_path, "");
    }

    #[test]
    fn test_from_json() {
        let settings = Settings::from_json(r#"{"rights": {"b": "x", "a": "y"}}"#).unwrap();
        assert_eq!(settings.rights, vec![Rule::new("b", "x"), Rule::new("a", "y")]);
        assert!(Settings::from_json("{not json").is_err());
    }
}
