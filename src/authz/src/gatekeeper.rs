//! Per-request facade over settings, sessions and rules
//!
//! # Architecture
//!
//! ```text
//! config ──▶ Settings ──┬──▶ CredentialStore ──▶ SessionManager ──▶ identity
//!                       └──▶ AuthorizationEngine ◀───────────────────┘
//!                                   │
//!                                   ▼
//!                         allow / deny per resource
//! ```

use pathgate_core::IdentityPath;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Settings;
use crate::rules::{AuthorizationEngine, Decision};
use crate::session::{ClientSignature, RequestContext, Resolution, SessionManager, SessionStore};
use crate::widget::LoginWidget;

/// Authorization and identity for one request
pub struct Gatekeeper {
    settings: Settings,
    engine: AuthorizationEngine,
    store: Arc<dyn SessionStore>,
    identity: IdentityPath,
    resolution: Option<Resolution>,
}

impl Gatekeeper {
    /// Create a gatekeeper from a settings snapshot
    pub fn new(settings: Settings, store: Arc<dyn SessionStore>) -> Self {
        let engine = AuthorizationEngine::new(
            &settings.base_path,
            settings.rights.clone(),
            settings.require_explicit_grant,
        );

        Self {
            settings,
            engine,
            store,
            identity: IdentityPath::anonymous(),
            resolution: None,
        }
    }

    /// Create a gatekeeper from the host's parsed configuration
    pub fn from_config(config: &Value, store: Arc<dyn SessionStore>) -> Self {
        Self::new(Settings::from_value(config), store)
    }

    /// Session manager bound to this request's credentials
    pub fn session_manager(&self) -> SessionManager<'_> {
        SessionManager::new(
            self.store.as_ref(),
            &self.settings.users,
            self.settings.hash_algorithm,
        )
        .with_fingerprint_algorithm(self.settings.fingerprint_algorithm)
    }

    /// Runs login, logout or re-validation for `request`
    ///
    /// Returns the resolved identity, anonymous when unauthenticated.
    pub fn resolve_identity(&mut self, request: &RequestContext) -> IdentityPath {
        let resolution = self.session_manager().resolve(request);
        self.identity = resolution.identity.clone();
        self.resolution = Some(resolution);
        self.identity.clone()
    }

    /// Logs in with explicit credentials
    pub fn login(&mut self, signature: &ClientSignature, name: &str, password: &str) -> bool {
        let request = RequestContext::new(signature.clone()).with_login(name, password);
        self.resolve_identity(&request).is_authenticated()
    }

    /// Ends the session bound to `signature`
    pub fn logout(&mut self, signature: &ClientSignature) {
        let request = RequestContext::new(signature.clone()).with_logout();
        self.resolve_identity(&request);
    }

    /// Identity resolved for this request
    pub fn identity(&self) -> &IdentityPath {
        &self.identity
    }

    /// Details of the last resolution, if any ran
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Whether the current identity may access `resource`
    pub fn is_authorized(&self, resource: &str) -> bool {
        self.decide(resource).allowed
    }

    /// Full decision for `resource`
    pub fn decide(&self, resource: &str) -> Decision {
        self.engine.decide(resource, &self.identity)
    }

    /// Checks `resource` with a caller-chosen default for unmatched paths
    pub fn has_right(&self, resource: &str, open_by_default: bool) -> bool {
        self.engine
            .decide_with_default(resource, &self.identity, !open_by_default)
            .allowed
    }

    /// Login widget for the current identity
    pub fn render_login_widget(&self) -> LoginWidget {
        LoginWidget::for_identity(&self.identity)
    }

    /// Settings snapshot in effect
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
