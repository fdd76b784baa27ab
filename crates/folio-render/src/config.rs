use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::str::FromStr;

/// Rendering configuration for a whole article.
///
/// Every section is optional in serialized form; missing keys take their defaults. Keys are
/// camelCase in both YAML and JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolioConfig {
    pub diagram: DiagramSettings,
    pub prose: ElementStyles,
    pub render: RenderOptions,
}

impl FolioConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(Error::Config {
                message: format!(
                    "unsupported config file extension (expected .yaml, .yml or .json): {}",
                    path.display()
                ),
            }),
        }
    }

    /// Returns a copy with `overrides` deep-merged on top of this config.
    ///
    /// Objects merge key by key; any other value replaces what was there.
    pub fn with_overrides(&self, overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        deep_merge_value(&mut base, overrides);
        Ok(serde_json::from_value(base)?)
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramTheme {
    #[default]
    Default,
    Neutral,
    Dark,
    Forest,
    Base,
}

impl DiagramTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Neutral => "neutral",
            Self::Dark => "dark",
            Self::Forest => "forest",
            Self::Base => "base",
        }
    }
}

impl FromStr for DiagramTheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "neutral" => Ok(Self::Neutral),
            "dark" => Ok(Self::Dark),
            "forest" => Ok(Self::Forest),
            "base" => Ok(Self::Base),
            other => Err(Error::Config {
                message: format!("unknown diagram theme `{other}`"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    #[default]
    Strict,
    Loose,
    Antiscript,
    Sandbox,
}

impl SecurityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Loose => "loose",
            Self::Antiscript => "antiscript",
            Self::Sandbox => "sandbox",
        }
    }
}

/// The one-time diagram engine configuration shared by every figure of a render session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramSettings {
    pub theme: DiagramTheme,
    pub use_max_width: bool,
    pub security_level: SecurityLevel,
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self {
            theme: DiagramTheme::Default,
            use_max_width: true,
            security_level: SecurityLevel::Strict,
        }
    }
}

impl DiagramSettings {
    /// The JSON object handed to [`crate::DiagramEngine::configure`].
    ///
    /// Auto-start is always disabled: figures are rendered explicitly, one request per figure.
    pub fn to_engine_config(&self) -> Value {
        json!({
            "startOnLoad": false,
            "theme": self.theme.as_str(),
            "securityLevel": self.security_level.as_str(),
            "flowchart": { "useMaxWidth": self.use_max_width },
            "sequence": { "useMaxWidth": self.use_max_width },
        })
    }
}

/// Per-element CSS classes applied by the prose renderer.
///
/// The same set is used for prose segments and for nested-markdown figures. An empty string
/// emits no `class` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStyles {
    pub h1: String,
    pub h2: String,
    pub h3: String,
    pub h4: String,
    pub p: String,
    pub ul: String,
    pub ol: String,
    pub li: String,
    pub blockquote: String,
    pub code: String,
    pub pre: String,
    pub table: String,
    pub th: String,
    pub td: String,
    pub a: String,
    pub hr: String,
    pub strong: String,
    pub em: String,
}

impl Default for ElementStyles {
    fn default() -> Self {
        let class = |name: &str| format!("folio-{name}");
        Self {
            h1: class("h1"),
            h2: class("h2"),
            h3: class("h3"),
            h4: class("h4"),
            p: class("p"),
            ul: class("ul"),
            ol: class("ol"),
            li: class("li"),
            blockquote: class("blockquote"),
            code: class("code"),
            pre: class("pre"),
            table: class("table"),
            th: class("th"),
            td: class("td"),
            a: class("a"),
            hr: class("hr"),
            strong: class("strong"),
            em: class("em"),
        }
    }
}

impl ElementStyles {
    /// Styles that emit bare elements.
    pub fn unstyled() -> Self {
        let mut styles = Self::default();
        for slot in [
            &mut styles.h1,
            &mut styles.h2,
            &mut styles.h3,
            &mut styles.h4,
            &mut styles.p,
            &mut styles.ul,
            &mut styles.ol,
            &mut styles.li,
            &mut styles.blockquote,
            &mut styles.code,
            &mut styles.pre,
            &mut styles.table,
            &mut styles.th,
            &mut styles.td,
            &mut styles.a,
            &mut styles.hr,
            &mut styles.strong,
            &mut styles.em,
        ] {
            slot.clear();
        }
        styles
    }
}

/// What to do with raw HTML found in prose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawHtml {
    /// Render it as visible text.
    #[default]
    Escape,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Skip prose segments that contain only whitespace.
    pub drop_blank_prose: bool,
    pub raw_html: RawHtml,
    pub figure_class: String,
    pub caption_class: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            drop_blank_prose: true,
            raw_html: RawHtml::Escape,
            figure_class: "folio-figure".to_string(),
            caption_class: "folio-caption".to_string(),
        }
    }
}
