//! Host lifecycle hooks
//!
//! Content hosts drive plugins through a fixed sequence of events per
//! request: configuration loaded, resource requested, page list built,
//! page about to render. [`HookDispatcher`] fans each event out to the
//! registered plugins in registration order; [`AccessPlugin`] is the
//! pathgate plugin that answers them.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::gatekeeper::Gatekeeper;
use crate::session::{RequestContext, SessionStore};

/// Page id and URL the host serves for forbidden resources
pub const FORBIDDEN_PAGE: &str = "403";

/// A page known to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Host-side page identifier
    pub id: String,

    /// Resource path relative to the base path
    pub path: String,
}

impl Page {
    /// Create a page
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Verdict on a requested resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Serve the resource
    Allowed,
    /// The URL was rewritten to the forbidden page; respond with 403
    Forbidden,
}

/// Events a host delivers to its plugins
///
/// Every method has a no-op default so plugins implement only what they
/// care about.
pub trait PluginHooks: Send {
    /// Plugin name for logs
    fn name(&self) -> &str;

    /// The host finished parsing its configuration
    fn on_config_loaded(&mut self, _config: &Value) {}

    /// The host resolved the requested URL
    fn on_resource_requested(&mut self, _url: &mut String) -> RequestOutcome {
        RequestOutcome::Allowed
    }

    /// The host assembled its page list
    fn on_resource_list_filtering(&mut self, _pages: &mut Vec<Page>) {}

    /// The host is about to render a template with `vars`
    fn on_render_preparing(&mut self, _vars: &mut Map<String, Value>) {}
}

/// Delivers host events to registered plugins
#[derive(Default)]
pub struct HookDispatcher {
    plugins: Vec<Box<dyn PluginHooks>>,
}

impl HookDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; events reach plugins in registration order
    pub fn register(&mut self, plugin: Box<dyn PluginHooks>) {
        debug!("Registered plugin '{}'", plugin.name());
        self.plugins.push(plugin);
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn config_loaded(&mut self, config: &Value) {
        for plugin in &mut self.plugins {
            plugin.on_config_loaded(config);
        }
    }

    /// Forbidden if any plugin forbids; later plugins see the rewritten URL
    pub fn resource_requested(&mut self, url: &mut String) -> RequestOutcome {
        let mut outcome = RequestOutcome::Allowed;
        for plugin in &mut self.plugins {
            if plugin.on_resource_requested(url) == RequestOutcome::Forbidden {
                outcome = RequestOutcome::Forbidden;
            }
        }
        outcome
    }

    pub fn resource_list_filtering(&mut self, pages: &mut Vec<Page>) {
        for plugin in &mut self.plugins {
            plugin.on_resource_list_filtering(pages);
        }
    }

    pub fn render_preparing(&mut self, vars: &mut Map<String, Value>) {
        for plugin in &mut self.plugins {
            plugin.on_render_preparing(vars);
        }
    }
}

/// Plugin enforcing pathgate rules for one request
///
/// Until the configuration arrives it runs with empty settings, which
/// allows everything.
pub struct AccessPlugin {
    request: RequestContext,
    store: Arc<dyn SessionStore>,
    gatekeeper: Gatekeeper,
}

impl AccessPlugin {
    /// Create the plugin for `request`
    pub fn new(request: RequestContext, store: Arc<dyn SessionStore>) -> Self {
        let gatekeeper = Gatekeeper::new(Default::default(), store.clone());
        Self {
            request,
            store,
            gatekeeper,
        }
    }

    /// Gatekeeper for direct queries
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }
}

impl PluginHooks for AccessPlugin {
    fn name(&self) -> &str {
        "pathgate"
    }

    fn on_config_loaded(&mut self, config: &Value) {
        self.gatekeeper = Gatekeeper::from_config(config, self.store.clone());
        self.gatekeeper.resolve_identity(&self.request);
    }

    fn on_resource_requested(&mut self, url: &mut String) -> RequestOutcome {
        if self.gatekeeper.is_authorized(url) {
            return RequestOutcome::Allowed;
        }

        info!(
            "Forbidden: '{}' for '{}'",
            url,
            self.gatekeeper.identity()
        );
        *url = FORBIDDEN_PAGE.to_string();
        RequestOutcome::Forbidden
    }

    fn on_resource_list_filtering(&mut self, pages: &mut Vec<Page>) {
        let before = pages.len();
        pages.retain(|page| page.id != FORBIDDEN_PAGE && self.gatekeeper.is_authorized(&page.path));
        debug!("Page list filtered: {} of {} visible", pages.len(), before);
    }

    fn on_render_preparing(&mut self, vars: &mut Map<String, Value>) {
        let widget = self.gatekeeper.render_login_widget();
        if let Ok(widget) = serde_json::to_value(widget) {
            vars.insert("login_form".to_string(), widget);
        }

        let identity = self.gatekeeper.identity();
        if identity.is_authenticated() {
            vars.insert("user".to_string(), Value::from(identity.as_str()));
            vars.insert("username".to_string(), Value::from(identity.name()));
            vars.insert(
                "usergroup".to_string(),
                identity.group().map_or(Value::Null, Value::from),
            );
        }
    }
}
