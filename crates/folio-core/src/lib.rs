#![forbid(unsafe_code)]

//! Annotation extraction and document segmentation for generated research articles.
//!
//! Article bodies are Markdown interleaved with `<figure-link>` tags that embed either a Mermaid
//! diagram or a nested Markdown fragment. This crate turns such a body into an ordered list of
//! [`Segment`]s in three synchronous steps:
//!
//! 1. [`scan_annotations`] finds every `<figure-link>` occurrence (after the bracket-cite cleanup
//!    in [`cite`]), reporting malformed ones without aborting.
//! 2. [`prepare_document`] replaces each recognized tag with a compact [`Marker`].
//! 3. [`segment_document`] walks the marker stream once and yields prose and figure segments.
//!
//! Nothing here performs I/O or suspends; rendering lives in `folio-render`.

pub mod annotation;
pub mod article;
pub mod authoring;
pub mod cite;
pub mod error;
pub mod marker;
pub mod pipeline;
pub mod segment;

pub use annotation::{
    AnnotationKind, AnnotationTag, DecodedAnnotation, MalformedTag, ScannedAnnotation, TagForm,
    parse_tag_at, scan_annotations, unescape_content,
};
pub use article::{article_title, download_file_name, reading_time_minutes};
pub use authoring::{ChartPlacement, FigureLink, insert_figure, parse_chart_response};
pub use cite::normalize_bracket_citations;
pub use error::{Error, Result};
pub use marker::{FigureKind, Marker, MarkerError, MarkerMatch, find_marker};
pub use pipeline::{AnnotationReport, PreparedDocument, prepare_document, segment_article};
pub use segment::{Figure, Segment, segment_document};

#[cfg(test)]
mod tests;
