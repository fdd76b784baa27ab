//! Producing `<figure-link>` tags.
//!
//! Chart suggestions come back from the generator as loosely structured text:
//!
//! ````text
//! Section Title: Background
//! Position Sentence: Transformers dominate the field.
//! Figure Title: Model lineage
//! ```mermaid
//! graph TD
//!   A --> B
//! ```
//! ````
//!
//! [`parse_chart_response`] extracts those blocks and [`insert_figure`] places the resulting tag
//! in front of the position sentence, where [`crate::scan_annotations`] later finds it.

use crate::annotation::{AnnotationKind, TAG_NAME};
use crate::marker::FigureKind;
use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static CHART_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Section Title:\s*(.+?)\n\s*Position Sentence:\s*(.+?)\n\s*Figure Title:\s*(.+?)\n\s*```(mermaid|markdown)\n([\s\S]+?)```",
    )
    .expect("chart block pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureLink {
    pub kind: FigureKind,
    pub title: String,
    pub content: String,
}

impl FigureLink {
    pub fn new(kind: FigureKind, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Builds a link from a fence info string such as `mermaid` or `Markdown`.
    pub fn from_fence(
        info: &str,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self> {
        let Some(kind) = FigureKind::from_annotation(AnnotationKind::classify(info)) else {
            return Err(Error::UnsupportedFigureType {
                declared_type: info.trim().to_string(),
            });
        };
        Ok(Self::new(kind, title, content))
    }

    /// Renders the paired-tag form with single-quoted attributes.
    ///
    /// Newlines and single quotes are backslash-escaped. Upstream generators that leave a bare `'`
    /// inside a value (`title='Bob's flow'`) produce tags the scanner reports as malformed; tags
    /// built here always scan cleanly.
    pub fn to_tag(&self) -> String {
        format!(
            "<{TAG_NAME} title='{}' type='{}' content='{}'></{TAG_NAME}>",
            escape_attribute(&self.title),
            self.kind.as_str(),
            escape_attribute(&self.content),
        )
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('\n', "\\n").replace('\'', "\\'")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPlacement {
    pub section_title: String,
    pub position_sentence: String,
    pub link: FigureLink,
}

pub fn parse_chart_response(text: &str) -> Vec<ChartPlacement> {
    CHART_BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let link = FigureLink::from_fence(&caps[4], caps[3].trim(), caps[5].trim()).ok()?;
            Some(ChartPlacement {
                section_title: caps[1].trim().to_string(),
                position_sentence: caps[2].trim().to_string(),
                link,
            })
        })
        .collect()
}

/// Inserts the placement's tag on its own line before the first occurrence of the position
/// sentence. Returns `None` when the sentence does not occur in `section`.
pub fn insert_figure(section: &str, placement: &ChartPlacement) -> Option<String> {
    let sentence = placement.position_sentence.as_str();
    if sentence.is_empty() || !section.contains(sentence) {
        return None;
    }
    let replacement = format!("\n{}\n{sentence}", placement.link.to_tag());
    Some(section.replacen(sentence, &replacement, 1))
}
