use crate::*;

#[test]
fn recognized_tags_become_markers_and_are_counted() {
    let raw = "Intro.\n<figure-link title='Flow' type='mermaid' content='graph TD\\nA-->B'></figure-link>\n\
               Middle.\n<figure-link type=\"Markdown\" content=\"| a |\" />\nEnd.";
    let prepared = prepare_document(raw);

    assert_eq!(
        prepared.report,
        AnnotationReport {
            mermaid: 1,
            markdown: 1,
            passthrough: 0,
            malformed: 0,
        }
    );
    assert_eq!(prepared.report.figures(), 2);
    assert!(!prepared.text.contains("<figure-link"));

    let figures: Vec<_> = prepared
        .segments()
        .into_iter()
        .filter_map(|s| match s {
            Segment::Figure(f) => Some(f),
            Segment::Prose { .. } => None,
        })
        .collect();
    assert_eq!(figures.len(), 2);
    assert_eq!(figures[0].kind, FigureKind::Mermaid);
    assert_eq!(figures[0].title, "Flow");
    assert_eq!(figures[0].content, "graph TD\nA-->B");
    assert_eq!(figures[1].kind, FigureKind::Markdown);
    assert_eq!(figures[1].content, "| a |");
}

#[test]
fn unknown_type_passes_through_verbatim() {
    let raw = "a <figure-link type='chart' content='x'></figure-link> b";
    let prepared = prepare_document(raw);
    assert_eq!(prepared.text, raw);
    assert_eq!(prepared.report.passthrough, 1);
    assert_eq!(prepared.report.figures(), 0);

    let segments = prepared.segments();
    assert_eq!(segments.len(), 1);
    assert!(matches!(&segments[0], Segment::Prose { text, .. } if text == raw));
}

#[test]
fn truncated_tag_stays_in_prose_next_to_a_valid_figure() {
    let truncated = "<figure-link type='mermaid' content='graph TD";
    let raw = format!("<figure-link type='mermaid' content='graph LR'></figure-link> tail {truncated}");
    let prepared = prepare_document(&raw);

    assert_eq!(prepared.report.mermaid, 1);
    assert_eq!(prepared.report.malformed, 1);
    assert!(prepared.text.ends_with(truncated));

    let segments = prepared.segments();
    assert_eq!(segments.len(), 2);
    assert_eq!(
        segments[0].as_figure().map(|f| f.content.as_str()),
        Some("graph LR")
    );
    let Segment::Prose { text, .. } = &segments[1] else {
        panic!("expected trailing prose");
    };
    assert_eq!(text, &format!(" tail {truncated}"));
}

#[test]
fn document_without_tags_is_unchanged() {
    let raw = "# Title\n\nJust prose with <b>html</b>.";
    let prepared = prepare_document(raw);
    assert_eq!(prepared.text, raw);
    assert_eq!(prepared.report, AnnotationReport::default());
}

#[test]
fn segment_article_runs_both_stages() {
    let raw = "See [1]]. <figure-link type='mermaid' content='graph TD' />";
    let segments = segment_article(raw);
    assert_eq!(segments.len(), 2);
    assert!(matches!(&segments[0], Segment::Prose { text, .. } if text == "See [1]. "));
    assert!(segments[1].as_figure().is_some());
}
