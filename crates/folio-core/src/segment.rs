use crate::Error;
use crate::marker::{FigureKind, find_marker};
use serde::Serialize;
use std::ops::Range;

/// A decoded figure marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Figure {
    pub kind: FigureKind,
    pub title: String,
    pub content: String,
    /// Byte range of the marker in the marker-embedded text.
    pub span: Range<usize>,
}

impl Figure {
    pub fn caption(&self) -> Option<&str> {
        let title = self.title.trim();
        (!title.is_empty()).then_some(title)
    }
}

/// One ordered unit of a document.
///
/// Concatenating `text[segment.span()]` over a segment list reproduces the segmented text
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Prose { text: String, span: Range<usize> },
    Figure(Figure),
}

impl Segment {
    pub fn span(&self) -> Range<usize> {
        match self {
            Self::Prose { span, .. } => span.clone(),
            Self::Figure(figure) => figure.span.clone(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Prose { text, .. } if text.trim().is_empty())
    }

    pub fn as_figure(&self) -> Option<&Figure> {
        match self {
            Self::Figure(figure) => Some(figure),
            Self::Prose { .. } => None,
        }
    }
}

/// Splits marker-embedded text into prose and figure segments in a single forward scan.
///
/// A marker whose payload does not decode stays in the surrounding prose verbatim.
pub fn segment_document(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut prose_start = 0;
    let mut pos = 0;

    while let Some(found) = find_marker(text, pos) {
        pos = found.span.end;
        let marker = match found.decode(text) {
            Ok(marker) => marker,
            Err(source) => {
                let err = Error::CorruptMarker {
                    offset: found.span.start,
                    source,
                };
                tracing::warn!(%err, "keeping figure marker as prose");
                continue;
            }
        };

        if prose_start < found.span.start {
            segments.push(Segment::Prose {
                text: text[prose_start..found.span.start].to_string(),
                span: prose_start..found.span.start,
            });
        }
        segments.push(Segment::Figure(Figure {
            kind: marker.kind,
            title: marker.title,
            content: marker.content,
            span: found.span,
        }));
        prose_start = pos;
    }

    if prose_start < text.len() {
        segments.push(Segment::Prose {
            text: text[prose_start..].to_string(),
            span: prose_start..text.len(),
        });
    }

    tracing::debug!(
        segments = segments.len(),
        figures = segments.iter().filter(|s| s.as_figure().is_some()).count(),
        "segmented document"
    );
    segments
}
