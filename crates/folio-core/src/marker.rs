//! Inline figure markers.
//!
//! A marker replaces a recognized `<figure-link>` in the document text:
//!
//! ```text
//! <!--MERMAID_CHART:<base64 title>:<base64 content>-->
//! <!--MARKDOWN_FIGURE:<base64 title>:<base64 content>-->
//! ```
//!
//! Both fields use the standard base64 alphabet, which contains neither `:` nor `-` nor `>`, so
//! the first `-->` after the tag name always terminates the marker.

use crate::annotation::AnnotationKind;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::ops::Range;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureKind {
    Mermaid,
    Markdown,
}

impl FigureKind {
    pub fn from_annotation(kind: AnnotationKind) -> Option<Self> {
        match kind {
            AnnotationKind::Mermaid => Some(Self::Mermaid),
            AnnotationKind::Markdown => Some(Self::Markdown),
            AnnotationKind::Other => None,
        }
    }

    pub fn marker_tag(self) -> &'static str {
        match self {
            Self::Mermaid => "MERMAID_CHART",
            Self::Markdown => "MARKDOWN_FIGURE",
        }
    }

    pub fn from_marker_tag(tag: &str) -> Option<Self> {
        match tag {
            "MERMAID_CHART" => Some(Self::Mermaid),
            "MARKDOWN_FIGURE" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Markdown => "markdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkerError {
    #[error("payload has no title/content separator")]
    MissingSeparator,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub kind: FigureKind,
    pub title: String,
    pub content: String,
}

impl Marker {
    pub fn new(kind: FigureKind, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn encode(&self) -> String {
        let title = STANDARD.encode(self.title.as_bytes());
        let content = STANDARD.encode(self.content.as_bytes());
        format!(
            "{COMMENT_OPEN}{}:{title}:{content}{COMMENT_CLOSE}",
            self.kind.marker_tag()
        )
    }

    /// Decodes the `<title>:<content>` payload of a marker of the given kind.
    pub fn decode_payload(kind: FigureKind, payload: &str) -> Result<Self, MarkerError> {
        let (title, content) = payload
            .split_once(':')
            .ok_or(MarkerError::MissingSeparator)?;
        Ok(Self {
            kind,
            title: decode_field(title)?,
            content: decode_field(content)?,
        })
    }
}

fn decode_field(field: &str) -> Result<String, MarkerError> {
    let bytes = STANDARD.decode(field.trim())?;
    Ok(std::str::from_utf8(&bytes)?.to_string())
}

/// A marker-shaped span found by [`find_marker`]. The payload has not been decoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub span: Range<usize>,
    pub kind: FigureKind,
    pub payload: Range<usize>,
}

impl MarkerMatch {
    pub fn decode(&self, text: &str) -> Result<Marker, MarkerError> {
        Marker::decode_payload(self.kind, &text[self.payload.clone()])
    }
}

/// Finds the next marker at or after byte `from`.
///
/// Ordinary HTML comments and marker tags without a terminating `-->` are skipped.
pub fn find_marker(text: &str, from: usize) -> Option<MarkerMatch> {
    let mut pos = from;
    while let Some(rel) = text.get(pos..)?.find(COMMENT_OPEN) {
        let start = pos + rel;
        let after_open = start + COMMENT_OPEN.len();
        pos = after_open;

        let rest = &text[after_open..];
        let Some(kind) = [FigureKind::Mermaid, FigureKind::Markdown]
            .into_iter()
            .find(|k| {
                rest.strip_prefix(k.marker_tag())
                    .is_some_and(|r| r.starts_with(':'))
            })
        else {
            continue;
        };
        let payload_start = after_open + kind.marker_tag().len() + 1;
        let Some(rel_close) = text[payload_start..].find(COMMENT_CLOSE) else {
            tracing::trace!(offset = start, "unterminated marker");
            continue;
        };
        let payload_end = payload_start + rel_close;
        // A truncated marker must not borrow the terminator of the next one.
        if text[payload_start..payload_end].contains(COMMENT_OPEN) {
            tracing::trace!(offset = start, "marker interrupted by another comment");
            continue;
        }
        return Some(MarkerMatch {
            span: start..payload_end + COMMENT_CLOSE.len(),
            kind,
            payload: payload_start..payload_end,
        });
    }
    None
}
