use crate::EngineError;
use regex::Regex;
use std::sync::LazyLock;

static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+").expect("front-matter pattern is valid")
});

pub type DetectorFn = fn(text: &str) -> bool;

#[derive(Debug, Clone)]
pub struct Detector {
    pub id: &'static str,
    pub detector: DetectorFn,
}

/// A diagram source after cleanup, with its detected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDiagram {
    pub diagram_type: &'static str,
    /// Front-matter `title`, if present.
    pub title: Option<String>,
    /// Source with line endings normalized, front-matter, directives and comments removed.
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn add(&mut self, detector: Detector) {
        self.detectors.push(detector);
    }

    pub fn add_fn(&mut self, id: &'static str, detector: DetectorFn) {
        self.add(Detector { id, detector });
    }

    /// Detects the type of an already cleaned source.
    pub fn detect_type(&self, cleaned: &str) -> Result<&'static str, EngineError> {
        self.detectors
            .iter()
            .find(|det| (det.detector)(cleaned))
            .map(|det| det.id)
            .ok_or_else(|| EngineError::UnknownDiagram {
                text: cleaned.to_string(),
            })
    }

    /// Cleans `source`, detects its type and checks that it has at least one statement.
    pub fn prepare(&self, source: &str) -> Result<PreparedDiagram, EngineError> {
        let normalized = normalize_line_endings(source);
        let (body, title) = split_front_matter(&normalized)?;
        let code = cleanup_comments(&remove_directives(body));
        let diagram_type = self.detect_type(&code)?;
        if !has_statements(diagram_type, &code) {
            return Err(EngineError::EmptyDiagram {
                diagram_type: diagram_type.to_string(),
            });
        }
        Ok(PreparedDiagram {
            diagram_type,
            title,
            code,
        })
    }

    pub fn builtin() -> Self {
        let mut reg = Self::new();

        // Order is significant: longer keywords sharing a prefix come first.
        reg.add_fn("c4", detector_c4);
        reg.add_fn("kanban", detector_kanban);
        reg.add_fn("classDiagram", detector_class);
        reg.add_fn("er", detector_er);
        reg.add_fn("gantt", detector_gantt);
        reg.add_fn("info", detector_info);
        reg.add_fn("pie", detector_pie);
        reg.add_fn("requirement", detector_requirement);
        reg.add_fn("sequence", detector_sequence);
        reg.add_fn("flowchart", detector_flowchart);
        reg.add_fn("timeline", detector_timeline);
        reg.add_fn("gitGraph", detector_git_graph);
        reg.add_fn("stateDiagram", detector_state);
        reg.add_fn("journey", detector_journey);
        reg.add_fn("quadrantChart", detector_quadrant);
        reg.add_fn("sankey", detector_sankey);
        reg.add_fn("packet", detector_packet);
        reg.add_fn("xychart", detector_xychart);
        reg.add_fn("block", detector_block);
        reg.add_fn("radar", detector_radar);
        reg.add_fn("treemap", detector_treemap);
        reg.add_fn("mindmap", detector_mindmap);
        reg.add_fn("architecture", detector_architecture);

        reg
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn split_front_matter(text: &str) -> Result<(&str, Option<String>), EngineError> {
    let Some(caps) = FRONTMATTER_RE.captures(text) else {
        return Ok((text, None));
    };
    let yaml_body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(yaml_body).map_err(|e| EngineError::Rejected {
            message: format!("invalid front-matter: {e}"),
        })?;
    let title = parsed
        .get("title")
        .and_then(serde_yaml::Value::as_str)
        .map(str::to_string);
    let end = caps.get(0).map_or(0, |m| m.end());
    Ok((&text[end..], title))
}

pub fn remove_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(rel) = text[pos..].find("%%{") {
        let start = pos + rel;
        out.push_str(&text[pos..start]);
        let after_start = start + 3;
        if let Some(rel_end) = text[after_start..].find("}%%") {
            pos = after_start + rel_end + 3;
        } else {
            return out;
        }
    }
    out.push_str(&text[pos..]);
    out
}

fn cleanup_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with("%%") {
            continue;
        }
        out.push_str(line);
    }
    out.trim_start().to_string()
}

/// Matches `keyword` at the start of `text` (after leading whitespace) as a whole word.
fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.trim_start().strip_prefix(keyword).is_some_and(|rest| {
        !rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

fn starts_with_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| starts_with_keyword(text, kw))
}

fn header_keyword_len(text: &str) -> usize {
    let trimmed = text.trim_start();
    let offset = text.len() - trimmed.len();
    offset
        + trimmed
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(trimmed.len())
}

fn has_statements(diagram_type: &str, code: &str) -> bool {
    if diagram_type == "info" {
        return true;
    }
    let mut rest = code[header_keyword_len(code)..].trim_start_matches([' ', '\t']);
    if diagram_type == "flowchart" {
        for direction in ["TB", "TD", "BT", "RL", "LR"] {
            if starts_with_keyword(rest, direction) {
                rest = &rest[direction.len()..];
                break;
            }
        }
    }
    !rest
        .trim_matches(|c: char| c.is_whitespace() || c == ';')
        .is_empty()
}

fn detector_c4(txt: &str) -> bool {
    starts_with_any(
        txt,
        &[
            "C4Context",
            "C4Container",
            "C4Component",
            "C4Dynamic",
            "C4Deployment",
        ],
    )
}

fn detector_kanban(txt: &str) -> bool {
    starts_with_keyword(txt, "kanban")
}

fn detector_class(txt: &str) -> bool {
    starts_with_any(txt, &["classDiagram-v2", "classDiagram"])
}

fn detector_er(txt: &str) -> bool {
    starts_with_keyword(txt, "erDiagram")
}

fn detector_gantt(txt: &str) -> bool {
    starts_with_keyword(txt, "gantt")
}

fn detector_info(txt: &str) -> bool {
    starts_with_keyword(txt, "info")
}

fn detector_pie(txt: &str) -> bool {
    starts_with_keyword(txt, "pie")
}

fn detector_requirement(txt: &str) -> bool {
    starts_with_any(txt, &["requirementDiagram", "requirement"])
}

fn detector_sequence(txt: &str) -> bool {
    starts_with_keyword(txt, "sequenceDiagram")
}

fn detector_flowchart(txt: &str) -> bool {
    starts_with_any(txt, &["flowchart-elk", "flowchart-v2", "flowchart", "graph"])
}

fn detector_timeline(txt: &str) -> bool {
    starts_with_keyword(txt, "timeline")
}

fn detector_git_graph(txt: &str) -> bool {
    starts_with_keyword(txt, "gitGraph")
}

fn detector_state(txt: &str) -> bool {
    starts_with_any(txt, &["stateDiagram-v2", "stateDiagram"])
}

fn detector_journey(txt: &str) -> bool {
    starts_with_keyword(txt, "journey")
}

fn detector_quadrant(txt: &str) -> bool {
    starts_with_keyword(txt, "quadrantChart")
}

fn detector_sankey(txt: &str) -> bool {
    starts_with_any(txt, &["sankey-beta", "sankey"])
}

fn detector_packet(txt: &str) -> bool {
    starts_with_any(txt, &["packet-beta", "packet"])
}

fn detector_xychart(txt: &str) -> bool {
    starts_with_any(txt, &["xychart-beta", "xychart"])
}

fn detector_block(txt: &str) -> bool {
    starts_with_any(txt, &["block-beta", "block"])
}

fn detector_radar(txt: &str) -> bool {
    starts_with_keyword(txt, "radar-beta")
}

fn detector_treemap(txt: &str) -> bool {
    starts_with_any(txt, &["treemap-beta", "treemap"])
}

fn detector_mindmap(txt: &str) -> bool {
    starts_with_keyword(txt, "mindmap")
}

fn detector_architecture(txt: &str) -> bool {
    starts_with_any(txt, &["architecture-beta", "architecture"])
}
