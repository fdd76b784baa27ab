//! `<figure-link>` tag scanning.
//!
//! The tag surface produced upstream looks like:
//!
//! ```text
//! <figure-link title='Pipeline' type='mermaid' content='graph TD\nA-->B'></figure-link>
//! <figure-link type="markdown" title="Summary" content="| a | b |" />
//! ```
//!
//! Attribute values routinely contain `>` (Mermaid arrows) and backslash-escaped quotes, so the
//! scanner is quote-aware instead of pattern based. Matching is non-greedy: a paired tag closes at
//! the nearest `</figure-link>`, and a tag that runs into another `<figure-link` opening before it
//! is complete is reported as malformed and left in place.

use crate::{Error, Result};
use serde::Serialize;
use std::ops::Range;

pub(crate) const TAG_NAME: &str = "figure-link";

const OPEN: &[u8] = b"<figure-link";
const CLOSE: &[u8] = b"</figure-link>";

/// The closed set a tag's free-form `type` attribute is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Mermaid,
    Markdown,
    Other,
}

impl AnnotationKind {
    pub fn classify(declared_type: &str) -> Self {
        let declared_type = declared_type.trim();
        if declared_type.eq_ignore_ascii_case("mermaid") {
            Self::Mermaid
        } else if declared_type.eq_ignore_ascii_case("markdown") {
            Self::Markdown
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Markdown => "markdown",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagForm {
    SelfClosing,
    Paired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum MalformedTag {
    #[error("the tag is never closed")]
    Unclosed,
    #[error("an attribute value is missing its closing quote")]
    UnterminatedValue,
    #[error("an attribute value has no name")]
    MissingAttributeName,
    #[error("another <figure-link> starts before this tag is complete")]
    Interrupted,
    #[error("no matching </figure-link> for the opening tag")]
    MissingCloseTag,
}

/// One syntactically complete `<figure-link>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationTag {
    /// Byte range from `<figure-link` through `/>` or `</figure-link>`.
    pub span: Range<usize>,
    pub form: TagForm,
    pub declared_type: String,
    pub title: String,
    /// Still escaped, exactly as written in the attribute (or the element body).
    pub raw_content: String,
}

/// An [`AnnotationTag`] with its payload unescaped and its type classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedAnnotation {
    pub span: Range<usize>,
    pub kind: AnnotationKind,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScannedAnnotation {
    Tag(AnnotationTag),
    /// Left untouched downstream. `span` only covers the `<figure-link` opening.
    Malformed {
        span: Range<usize>,
        reason: MalformedTag,
    },
}

impl AnnotationTag {
    pub fn source<'a>(&self, text: &'a str) -> &'a str {
        &text[self.span.clone()]
    }

    pub fn kind(&self) -> AnnotationKind {
        AnnotationKind::classify(&self.declared_type)
    }

    pub fn decode(&self) -> DecodedAnnotation {
        DecodedAnnotation {
            span: self.span.clone(),
            kind: self.kind(),
            title: unescape_content(&self.title),
            content: unescape_content(&self.raw_content),
        }
    }
}

/// Resolves `\n`, `\'` and `\"` in that order, once.
pub fn unescape_content(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\'", "'")
        .replace("\\\"", "\"")
}

/// Scans `text` left to right and returns every `<figure-link>` occurrence in order.
///
/// Malformed occurrences are reported and scanning resumes right after their opening, so one
/// broken tag never hides the tags that follow it.
pub fn scan_annotations(text: &str) -> Vec<ScannedAnnotation> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = find_open(text.as_bytes(), pos) {
        match parse_tag_at(text, start) {
            Ok(tag) => {
                tracing::trace!(start, end = tag.span.end, ty = %tag.declared_type, "figure-link");
                pos = tag.span.end;
                out.push(ScannedAnnotation::Tag(tag));
            }
            Err(Error::MalformedTag { reason, .. }) => {
                tracing::warn!(offset = start, %reason, "leaving malformed figure-link untouched");
                pos = start + OPEN.len();
                out.push(ScannedAnnotation::Malformed {
                    span: start..pos,
                    reason,
                });
            }
            Err(err) => {
                tracing::warn!(offset = start, %err, "leaving figure-link untouched");
                pos = start + OPEN.len();
            }
        }
    }
    out
}

/// Parses the tag whose `<figure-link` opening starts at byte `start`.
pub fn parse_tag_at(text: &str, start: usize) -> Result<AnnotationTag> {
    let malformed = |reason| Error::MalformedTag {
        offset: start,
        reason,
    };
    let bytes = text.as_bytes();
    if !opens_at(bytes, start) {
        return Err(malformed(MalformedTag::Unclosed));
    }

    let mut attrs = Attributes::default();
    let mut i = start + OPEN.len();
    let (form, open_end) = loop {
        i = skip_whitespace(bytes, i);
        let Some(&b) = bytes.get(i) else {
            return Err(malformed(MalformedTag::Unclosed));
        };
        match b {
            b'/' if bytes.get(i + 1) == Some(&b'>') => break (TagForm::SelfClosing, i + 2),
            b'/' => i += 1,
            b'>' => break (TagForm::Paired, i + 1),
            b'<' => return Err(malformed(MalformedTag::Interrupted)),
            b'=' | b'"' | b'\'' => return Err(malformed(MalformedTag::MissingAttributeName)),
            _ => {
                let name_start = i;
                while i < bytes.len() && !ends_name(bytes[i]) {
                    i += 1;
                }
                let name = text[name_start..i].to_ascii_lowercase();
                i = skip_whitespace(bytes, i);
                let value = if bytes.get(i) == Some(&b'=') {
                    let (value, next) = read_value(text, skip_whitespace(bytes, i + 1))
                        .map_err(malformed)?;
                    i = next;
                    value
                } else {
                    ""
                };
                attrs.insert(name, value);
            }
        }
    };

    let (end, body) = match form {
        TagForm::SelfClosing => (open_end, None),
        TagForm::Paired => {
            let Some(close) = find_ignore_ascii_case(bytes, CLOSE, open_end) else {
                return Err(malformed(MalformedTag::MissingCloseTag));
            };
            if find_open(bytes, open_end).is_some_and(|next| next < close) {
                return Err(malformed(MalformedTag::MissingCloseTag));
            }
            (close + CLOSE.len(), Some(&text[open_end..close]))
        }
    };

    let raw_content = match (attrs.content, body) {
        (Some(content), _) => content.to_string(),
        (None, Some(body)) => body.trim().to_string(),
        (None, None) => String::new(),
    };

    Ok(AnnotationTag {
        span: start..end,
        form,
        declared_type: attrs.ty.unwrap_or_default().to_string(),
        title: attrs.title.unwrap_or_default().to_string(),
        raw_content,
    })
}

#[derive(Default)]
struct Attributes<'a> {
    ty: Option<&'a str>,
    title: Option<&'a str>,
    content: Option<&'a str>,
}

impl<'a> Attributes<'a> {
    // First occurrence wins.
    fn insert(&mut self, name: String, value: &'a str) {
        let slot = match name.as_str() {
            "type" => &mut self.ty,
            "title" => &mut self.title,
            "content" => &mut self.content,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

fn read_value(text: &str, i: usize) -> std::result::Result<(&str, usize), MalformedTag> {
    let bytes = text.as_bytes();
    match bytes.get(i) {
        None => Err(MalformedTag::Unclosed),
        Some(&quote @ (b'"' | b'\'')) => {
            let mut j = i + 1;
            loop {
                let Some(&b) = bytes.get(j) else {
                    return Err(MalformedTag::UnterminatedValue);
                };
                if b == b'\\' {
                    j += 2;
                    continue;
                }
                if b == quote {
                    return Ok((&text[i + 1..j], j + 1));
                }
                if b == b'<' && opens_at(bytes, j) {
                    return Err(MalformedTag::Interrupted);
                }
                j += 1;
            }
        }
        Some(_) => {
            let mut j = i;
            while let Some(&b) = bytes.get(j) {
                let self_close = b == b'/' && bytes.get(j + 1) == Some(&b'>');
                if b.is_ascii_whitespace() || b == b'>' || b == b'<' || self_close {
                    break;
                }
                j += 1;
            }
            Ok((&text[i..j], j))
        }
    }
}

fn ends_name(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/' | b'<' | b'"' | b'\'')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

/// `<figure-link` at `i`, followed by whitespace, `/` or `>` (so `<figure-links` is not a tag).
fn opens_at(bytes: &[u8], i: usize) -> bool {
    let Some(candidate) = bytes.get(i..i + OPEN.len()) else {
        return false;
    };
    if !candidate.eq_ignore_ascii_case(OPEN) {
        return false;
    }
    match bytes.get(i + OPEN.len()) {
        None => true,
        Some(&b) => b.is_ascii_whitespace() || b == b'/' || b == b'>',
    }
}

fn find_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(i) = find_ignore_ascii_case(bytes, OPEN, pos) {
        if opens_at(bytes, i) {
            return Some(i);
        }
        pos = i + 1;
    }
    None
}

fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|p| p + from)
}
