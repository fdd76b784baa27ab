use crate::*;
use folio_core::{FigureKind, Marker, segment_document};
use futures::executor::block_on;

fn marker(kind: FigureKind, title: &str, content: &str) -> String {
    Marker::new(kind, title, content).encode()
}

#[test]
fn markdown_figures_are_ready_without_the_engine() {
    let text = format!(
        "Intro\n{}\n",
        marker(FigureKind::Markdown, "Scores", "| a |\n| - |\n| 1 |")
    );
    let mut session = RenderSession::default();
    let (view, pass) = session.begin(&segment_document(&text));

    assert!(pass.is_empty());
    assert!(view.is_settled());
    let figure = view.figures().next().unwrap();
    let FigureRenderState::Ready { output } = &figure.state else {
        panic!("expected a ready figure, got {:?}", figure.state);
    };
    assert!(output.contains("<td class=\"folio-td\">1</td>"));
}

#[test]
fn blank_prose_is_dropped_unless_configured() {
    let text = format!("{}\n\n", marker(FigureKind::Markdown, "", "x"));
    let segments = segment_document(&text);
    assert_eq!(segments.len(), 2);

    let (view, _) = RenderSession::default().begin(&segments);
    assert_eq!(view.segments().len(), 1);

    let config = FolioConfig::default()
        .with_overrides(&serde_json::json!({"render": {"dropBlankProse": false}}))
        .unwrap();
    let (view, _) = RenderSession::from_config(&config).begin(&segments);
    assert_eq!(view.segments().len(), 2);
}

#[test]
fn apply_rejects_prose_indices_and_double_completion() {
    let text = format!(
        "Intro\n{}",
        marker(FigureKind::Mermaid, "", "graph TD\nA-->B")
    );
    let mut session = RenderSession::default();
    let (mut view, pass) = session.begin(&segment_document(&text));
    assert_eq!(view.pending_figures(), 1);

    let completions: Vec<_> = block_on(futures::StreamExt::collect(pass));
    assert_eq!(completions.len(), 1);
    let completion = completions[0].clone();
    assert_eq!(completion.index, 1);

    assert_eq!(
        view.apply(FigureCompletion {
            index: 0,
            ..completion.clone()
        }),
        ApplyOutcome::NotAFigure
    );
    assert_eq!(
        view.apply(FigureCompletion {
            index: 9,
            ..completion.clone()
        }),
        ApplyOutcome::NotAFigure
    );
    assert_eq!(view.apply(completion.clone()), ApplyOutcome::Applied);
    assert_eq!(view.apply(completion), ApplyOutcome::AlreadySettled);
    assert!(view.is_settled());
}

#[test]
fn generations_increase_per_begin() {
    let mut session = RenderSession::default();
    assert_eq!(session.generation(), 0);
    let (first, _) = session.begin(&[]);
    let (second, _) = session.begin(&[]);
    assert_eq!(first.generation(), 1);
    assert_eq!(second.generation(), 2);
    assert!(!session.is_current(first.generation()));
    assert!(session.is_current(second.generation()));
}

#[test]
fn render_article_sync_renders_diagrams_and_prose() {
    let raw = "# Title\n\n<figure-link title='Flow' type='mermaid' content='graph TD\\nA-->B'></figure-link>\n\nDone.";
    let html = render_article_sync(raw, &FolioConfig::default());
    assert!(html.starts_with("<h1 class=\"folio-h1\">Title</h1>\n"));
    assert!(html.contains(r#"data-state="ready""#));
    assert!(html.contains(r#"<pre class="mermaid""#));
    assert!(html.contains("graph TD\nA--&gt;B</pre>"));
    assert!(html.contains("<figcaption class=\"folio-caption\">Flow</figcaption>"));
    assert!(html.ends_with("<p class=\"folio-p\">Done.</p>\n"));
}
