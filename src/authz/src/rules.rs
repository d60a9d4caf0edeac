//! Path-prefix access rules
//!
//! A rule ties a resource prefix to the identity prefix allowed under it:
//! `private → staff` lets `staff/alice` read `private/page` and keeps
//! `guests/bob` out. Rules are evaluated in order; the first matching rule
//! whose identity check fails decides a denial.

use pathgate_core::path::{self, is_parent_path};
use pathgate_core::IdentityPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::credentials::value_kind;
use crate::error::{AuthzError, Result};

/// A single access rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Resources at or under this path are governed by the rule
    #[serde(alias = "resource", alias = "resourcePathPrefix")]
    pub resource_prefix: String,

    /// Identities at or under this path pass the rule
    #[serde(alias = "identity", alias = "authorizedIdentityPrefix")]
    pub identity_prefix: String,
}

impl Rule {
    /// Create a rule, normalizing both prefixes
    pub fn new(resource_prefix: impl AsRef<str>, identity_prefix: impl AsRef<str>) -> Self {
        Self {
            resource_prefix: path::normalize(resource_prefix.as_ref()),
            identity_prefix: path::normalize(identity_prefix.as_ref()),
        }
    }

    /// Whether this rule governs `resource`
    pub fn applies_to(&self, resource: &str) -> bool {
        is_parent_path(&self.resource_prefix, resource)
    }

    /// Whether `identity` satisfies this rule
    pub fn admits(&self, identity: &str) -> bool {
        is_parent_path(&self.identity_prefix, identity)
    }
}

/// Parses the `rights` configuration section
///
/// Accepts an ordered mapping `{resource: identity}` or a sequence of
/// `{resource, identity}` objects. Malformed entries are skipped. A rule
/// for `/` is kept: under a base path it governs the whole site.
pub fn rules_from_value(value: &Value) -> Result<Vec<Rule>> {
    let candidates: Vec<(String, Option<Rule>)> = match value {
        Value::Object(map) => map
            .iter()
            .map(|(resource, identity)| {
                let rule = identity.as_str().map(|identity| Rule::new(resource, identity));
                (resource.clone(), rule)
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let rule = serde_json::from_value::<Rule>(item.clone())
                    .ok()
                    .map(|rule| Rule::new(rule.resource_prefix, rule.identity_prefix));
                (format!("#{}", idx), rule)
            })
            .collect(),
        other => {
            return Err(AuthzError::invalid_config(format!(
                "rights must be a mapping or sequence, found {}",
                value_kind(other)
            )))
        }
    };

    let mut rules = Vec::with_capacity(candidates.len());
    for (label, rule) in candidates {
        match rule {
            Some(rule) => rules.push(rule),
            None => warn!("Skipping malformed rule '{}'", label),
        }
    }

    Ok(rules)
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    /// No rules configured at all
    NoRulesConfigured,
    /// Rules exist but none governs the resource
    NoMatchingRule,
    /// Every governing rule admitted the identity; `rule` is the first one
    Granted { rule: usize },
    /// The rule at this index governs the resource and rejected the identity
    Excluded { rule: usize },
}

/// Authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether access is allowed
    pub allowed: bool,

    /// Reason for the decision
    pub reason: DecisionReason,
}

impl Decision {
    fn allow(reason: DecisionReason) -> Self {
        Self { allowed: true, reason }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self { allowed: false, reason }
    }
}

/// Evaluates `rules` for `identity` requesting `resource`
///
/// With `require_explicit_grant` unset, resources nobody has a rule for
/// are public; with it set they are closed. In both modes a governing rule
/// that rejects the identity denies access, and an empty rule list allows
/// everything.
pub fn evaluate(
    resource: &str,
    identity: &str,
    rules: &[Rule],
    require_explicit_grant: bool,
) -> Decision {
    if rules.is_empty() {
        return Decision::allow(DecisionReason::NoRulesConfigured);
    }

    let mut first_match = None;
    for (idx, rule) in rules.iter().enumerate() {
        if !rule.applies_to(resource) {
            continue;
        }
        first_match.get_or_insert(idx);

        if !rule.admits(identity) {
            return Decision::deny(DecisionReason::Excluded { rule: idx });
        }
    }

    match first_match {
        Some(rule) => Decision::allow(DecisionReason::Granted { rule }),
        None if require_explicit_grant => Decision::deny(DecisionReason::NoMatchingRule),
        None => Decision::allow(DecisionReason::NoMatchingRule),
    }
}

/// Boolean form of [`evaluate`]
pub fn is_authorized(
    resource: &str,
    identity: &str,
    rules: &[Rule],
    require_explicit_grant: bool,
) -> bool {
    evaluate(resource, identity, rules, require_explicit_grant).allowed
}

/// Rule set bound to a base path and default policy
///
/// Resource paths handed to the engine are relative to the base path; the
/// engine roots both them and the rule prefixes under it before matching.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationEngine {
    base_path: String,
    rules: Vec<Rule>,
    require_explicit_grant: bool,
}

impl AuthorizationEngine {
    /// Create an engine over `rules`
    pub fn new(base_path: &str, rules: Vec<Rule>, require_explicit_grant: bool) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let resource_prefix = path::join(base_path, &rule.resource_prefix);
                if resource_prefix.is_empty() {
                    // An empty prefix is nobody's parent; the rule could never apply.
                    warn!(
                        "Ignoring rule for '/' -> '{}': no base path to root it under",
                        rule.identity_prefix
                    );
                    return None;
                }
                Some(Rule {
                    resource_prefix,
                    identity_prefix: rule.identity_prefix,
                })
            })
            .collect();

        Self {
            base_path: path::normalize(base_path),
            rules,
            require_explicit_grant,
        }
    }

    /// Decide whether `identity` may access `resource`
    pub fn decide(&self, resource: &str, identity: &IdentityPath) -> Decision {
        self.decide_with_default(resource, identity, self.require_explicit_grant)
    }

    /// Like [`decide`](Self::decide) with an explicit default policy
    pub fn decide_with_default(
        &self,
        resource: &str,
        identity: &IdentityPath,
        require_explicit_grant: bool,
    ) -> Decision {
        let resource = path::join(&self.base_path, resource);
        let decision = evaluate(&resource, identity.as_str(), &self.rules, require_explicit_grant);

        debug!(
            "Decision for '{}' as '{}': {} ({:?})",
            resource,
            identity,
            if decision.allowed { "ALLOW" } else { "DENY" },
            decision.reason
        );

        decision
    }

    /// Whether `identity` may access `resource`
    pub fn is_authorized(&self, resource: &str, identity: &IdentityPath) -> bool {
        self.decide(resource, identity).allowed
    }

    /// Rules rooted under the base path, in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether unmatched resources are closed
    pub fn requires_explicit_grant(&self) -> bool {
        self.require_explicit_grant
    }
}
