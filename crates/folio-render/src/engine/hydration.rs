use super::detect::{DetectorRegistry, normalize_line_endings};
use super::{DiagramEngine, RenderFuture, RenderKey};
use crate::EngineError;
use futures::FutureExt as _;
use serde_json::Value;
use std::sync::OnceLock;

/// Validates diagrams server-side and emits `<pre class="mermaid">` elements for a browser-side
/// Mermaid runtime to draw.
///
/// Sources whose type cannot be detected, or that declare a type but contain no statements, are
/// rejected here so the failure shows up on the figure instead of as a blank box in the page.
#[derive(Debug)]
pub struct HydrationEngine {
    registry: DetectorRegistry,
    config: OnceLock<Value>,
}

impl Default for HydrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HydrationEngine {
    pub fn new() -> Self {
        Self::with_registry(DetectorRegistry::builtin())
    }

    pub fn with_registry(registry: DetectorRegistry) -> Self {
        Self {
            registry,
            config: OnceLock::new(),
        }
    }

    /// The configuration in effect, if `configure` has been called.
    pub fn config(&self) -> Option<&Value> {
        self.config.get()
    }

    fn render_now(&self, key: &RenderKey, source: &str) -> Result<String, EngineError> {
        let Some(config) = self.config.get() else {
            return Err(EngineError::Configuration {
                message: "render requested before configuration".to_string(),
            });
        };
        let theme = config
            .get("theme")
            .and_then(Value::as_str)
            .unwrap_or("default");
        let prepared = self.registry.prepare(source)?;

        let mut out = format!(
            r#"<pre class="mermaid" id="{}" data-diagram-type="{}" data-theme="{}""#,
            htmlize::escape_attribute(key.as_str()),
            prepared.diagram_type,
            htmlize::escape_attribute(theme),
        );
        if let Some(title) = &prepared.title {
            out.push_str(&format!(
                r#" data-title="{}""#,
                htmlize::escape_attribute(title.as_str())
            ));
        }
        out.push('>');
        out.push_str(&htmlize::escape_text(normalize_line_endings(source).trim()));
        out.push_str("</pre>");
        Ok(out)
    }
}

impl DiagramEngine for HydrationEngine {
    fn configure(&self, config: &Value) -> Result<(), EngineError> {
        if !config.is_object() {
            return Err(EngineError::Configuration {
                message: format!("expected a JSON object, got {config}"),
            });
        }
        let current = self.config.get_or_init(|| config.clone());
        if current != config {
            tracing::warn!("ignoring diagram engine re-configuration with different settings");
        }
        Ok(())
    }

    fn render(&self, key: RenderKey, source: String) -> RenderFuture {
        let result = self.render_now(&key, &source);
        if let Err(err) = &result {
            tracing::debug!(%key, %err, "diagram rejected");
        }
        futures::future::ready(result).boxed()
    }
}
