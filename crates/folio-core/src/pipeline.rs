use crate::annotation::{ScannedAnnotation, scan_annotations};
use crate::cite::normalize_bracket_citations;
use crate::marker::{FigureKind, Marker};
use crate::segment::{Segment, segment_document};
use serde::Serialize;

/// Per-document counts gathered while splicing markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    pub mermaid: usize,
    pub markdown: usize,
    /// Well-formed tags with an unrecognized `type`, left verbatim.
    pub passthrough: usize,
    /// Tags that could not be decoded, left verbatim.
    pub malformed: usize,
}

impl AnnotationReport {
    pub fn figures(&self) -> usize {
        self.mermaid + self.markdown
    }
}

/// A raw article after bracket-cite cleanup with every eligible tag replaced by a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedDocument {
    pub text: String,
    pub report: AnnotationReport,
}

impl PreparedDocument {
    pub fn segments(&self) -> Vec<Segment> {
        segment_document(&self.text)
    }
}

pub fn prepare_document(raw: &str) -> PreparedDocument {
    let cleaned = normalize_bracket_citations(raw);
    let mut report = AnnotationReport::default();
    let mut text = String::with_capacity(cleaned.len());
    let mut last = 0;

    for scanned in scan_annotations(&cleaned) {
        let tag = match scanned {
            ScannedAnnotation::Tag(tag) => tag,
            ScannedAnnotation::Malformed { .. } => {
                report.malformed += 1;
                continue;
            }
        };
        let decoded = tag.decode();
        let Some(kind) = FigureKind::from_annotation(decoded.kind) else {
            tracing::debug!(ty = %tag.declared_type, "passing through figure-link with unknown type");
            report.passthrough += 1;
            continue;
        };
        match kind {
            FigureKind::Mermaid => report.mermaid += 1,
            FigureKind::Markdown => report.markdown += 1,
        }
        text.push_str(&cleaned[last..tag.span.start]);
        text.push_str(&Marker::new(kind, decoded.title, decoded.content).encode());
        last = tag.span.end;
    }
    text.push_str(&cleaned[last..]);

    tracing::debug!(?report, "prepared document");
    PreparedDocument { text, report }
}

/// `prepare_document` followed by `segment_document`.
pub fn segment_article(raw: &str) -> Vec<Segment> {
    prepare_document(raw).segments()
}
