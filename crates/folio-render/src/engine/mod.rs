//! The diagram engine seam.
//!
//! A [`DiagramEngine`] receives one configuration object and then renders diagram sources
//! asynchronously, one request per figure. [`EngineHandle`] is the value the renderer threads
//! through a session: it owns the settings and makes configuration happen at most once, no matter
//! how many passes or figures share the handle.

pub mod detect;
mod hydration;

pub use hydration::HydrationEngine;

use crate::EngineError;
use crate::config::DiagramSettings;
use futures::FutureExt as _;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub type RenderFuture = BoxFuture<'static, Result<String, EngineError>>;

pub trait DiagramEngine: Send + Sync {
    /// Applies the engine-wide configuration. Called at most once per [`EngineHandle`].
    fn configure(&self, config: &Value) -> Result<(), EngineError>;

    /// Renders one diagram. `key` is unique among concurrently pending renders.
    fn render(&self, key: RenderKey, source: String) -> RenderFuture;
}

/// Unique identifier for one render request, usable as a DOM id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey(String);

impl RenderKey {
    /// `mermaid-<unix-millis>-<random suffix>`.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("mermaid-{millis}-{}", &random[..9]))
    }

    pub fn from_raw(raw: &str) -> Self {
        Self(sanitize_dom_id(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts an arbitrary string into a conservative DOM `id` token.
///
/// Unsupported characters become `-`, runs of `-` collapse, and the result always starts with an
/// ASCII letter (`m-` is prefixed when needed).
pub fn sanitize_dom_id(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "m-untitled".to_string();
    }

    let mut out = String::with_capacity(raw.len() + 2);
    for ch in raw.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
        out.push(if ok { ch } else { '-' });
    }
    if !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
        out.insert_str(0, "m-");
    }
    while out.contains("--") {
        out = out.replace("--", "-");
    }
    let out = out.trim_matches('-');
    if out.is_empty() || out == "m" {
        return "m-untitled".to_string();
    }
    out.to_string()
}

/// Shared handle to a configured engine.
///
/// Cloning is cheap and clones share the one-time configuration.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<dyn DiagramEngine>,
    settings: DiagramSettings,
    configured: Arc<OnceLock<Result<(), EngineError>>>,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("settings", &self.settings)
            .field("configured", &self.configured.get())
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    pub fn new(engine: impl DiagramEngine + 'static, settings: DiagramSettings) -> Self {
        Self::from_arc(Arc::new(engine), settings)
    }

    pub fn from_arc(engine: Arc<dyn DiagramEngine>, settings: DiagramSettings) -> Self {
        Self {
            engine,
            settings,
            configured: Arc::new(OnceLock::new()),
        }
    }

    pub fn settings(&self) -> &DiagramSettings {
        &self.settings
    }

    /// Configures the engine on first use and replays that outcome afterwards.
    pub fn ensure_configured(&self) -> Result<(), EngineError> {
        self.configured
            .get_or_init(|| {
                let config = self.settings.to_engine_config();
                tracing::debug!(%config, "configuring diagram engine");
                let result = self.engine.configure(&config);
                if let Err(err) = &result {
                    tracing::warn!(%err, "diagram engine configuration failed");
                }
                result
            })
            .clone()
    }

    /// Starts one render under a freshly generated key.
    pub fn render(&self, source: impl Into<String>) -> RenderFuture {
        if let Err(err) = self.ensure_configured() {
            return futures::future::ready(Err(err)).boxed();
        }
        let key = RenderKey::generate();
        tracing::trace!(%key, "requesting diagram render");
        self.engine.render(key, source.into())
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new(HydrationEngine::new(), DiagramSettings::default())
    }
}
