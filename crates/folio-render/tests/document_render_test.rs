use folio_core::{FigureKind, Marker, segment_article, segment_document};
use folio_render::{
    ApplyOutcome, DiagramEngine, DiagramSettings, EngineError, EngineHandle, FigureRenderState,
    FolioConfig, RenderFuture, RenderKey, RenderSession, SegmentView,
};
use futures::FutureExt as _;
use futures::StreamExt as _;
use futures::channel::oneshot;
use futures::executor::block_on;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Outcome = Result<String, EngineError>;

/// Completes each render only when the test sends a result for its source.
#[derive(Default)]
struct ChannelEngine {
    waiting: Mutex<HashMap<String, oneshot::Sender<Outcome>>>,
}

impl ChannelEngine {
    fn complete(&self, source: &str, outcome: Outcome) {
        let sender = self
            .waiting
            .lock()
            .unwrap()
            .remove(source)
            .unwrap_or_else(|| panic!("no render pending for {source:?}"));
        sender.send(outcome).unwrap();
    }

    fn pending(&self) -> usize {
        self.waiting.lock().unwrap().len()
    }
}

impl DiagramEngine for ChannelEngine {
    fn configure(&self, _config: &Value) -> Result<(), EngineError> {
        Ok(())
    }

    fn render(&self, _key: RenderKey, source: String) -> RenderFuture {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().unwrap().insert(source, tx);
        rx.map(|received| {
            received.unwrap_or_else(|_| {
                Err(EngineError::Rejected {
                    message: "render cancelled".to_string(),
                })
            })
        })
        .boxed()
    }
}

fn session_with(engine: &Arc<ChannelEngine>) -> RenderSession {
    let handle = EngineHandle::from_arc(engine.clone(), DiagramSettings::default());
    RenderSession::with_engine(handle, &FolioConfig::default())
}

fn mermaid_marker(title: &str, content: &str) -> String {
    Marker::new(FigureKind::Mermaid, title, content).encode()
}

fn figure_states(segments: &[SegmentView]) -> Vec<&'static str> {
    segments
        .iter()
        .filter_map(SegmentView::as_figure)
        .map(|f| f.state.as_str())
        .collect()
}

#[test]
fn figures_keep_document_order_when_completing_out_of_order() {
    let engine = Arc::new(ChannelEngine::default());
    let mut session = session_with(&engine);
    let text = format!(
        "First\n{}\nSecond\n{}\nThird",
        mermaid_marker("one", "graph TD\nA-->B"),
        mermaid_marker("two", "graph LR\nC-->D"),
    );
    let (mut view, mut pass) = session.begin(&segment_document(&text));
    assert_eq!(pass.len(), 2);
    assert_eq!(engine.pending(), 2);
    assert_eq!(figure_states(view.segments()), ["pending", "pending"]);

    engine.complete("graph LR\nC-->D", Ok("<svg>two</svg>".to_string()));
    let completion = block_on(pass.next()).unwrap();
    assert_eq!(completion.index, 3);
    assert_eq!(view.apply(completion), ApplyOutcome::Applied);
    assert_eq!(figure_states(view.segments()), ["pending", "ready"]);

    engine.complete("graph TD\nA-->B", Ok("<svg>one</svg>".to_string()));
    let completion = block_on(pass.next()).unwrap();
    assert_eq!(completion.index, 1);
    assert_eq!(view.apply(completion), ApplyOutcome::Applied);
    assert!(block_on(pass.next()).is_none());

    let html = view.to_html();
    let positions: Vec<usize> = ["First", "<svg>one</svg>", "Second", "<svg>two</svg>", "Third"]
        .iter()
        .map(|needle| html.find(needle).unwrap_or_else(|| panic!("{needle} missing")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{html}");
}

#[test]
fn one_failing_diagram_does_not_affect_its_sibling() {
    let mut session = RenderSession::default();
    let raw = "<figure-link type='mermaid' title='Good' content='graph TD\\nA-->B'></figure-link>\n\
               <figure-link type='mermaid' title='Bad' content='grph TD\\nA-->B'></figure-link>";
    let (prepared, mut view, pass) = session.load(raw);
    assert_eq!(prepared.report.mermaid, 2);

    assert_eq!(block_on(pass.drive(&mut view)), 2);
    let figures: Vec<_> = view.figures().collect();
    assert!(matches!(figures[0].state, FigureRenderState::Ready { .. }));
    let FigureRenderState::Failed { message } = &figures[1].state else {
        panic!("expected the second figure to fail: {:?}", figures[1].state);
    };
    assert!(message.starts_with("No diagram type detected"));

    let html = view.to_html();
    assert!(html.contains(r#"data-state="ready""#));
    assert!(html.contains(r#"role="alert""#));
    assert!(html.contains("grph TD\nA--&gt;B"));
}

#[test]
fn results_for_a_superseded_document_are_stale() {
    let engine = Arc::new(ChannelEngine::default());
    let mut session = session_with(&engine);

    let old_text = mermaid_marker("old", "graph TD\nOld-->Doc");
    let (mut old_view, mut old_pass) = session.begin(&segment_document(&old_text));
    let new_text = format!("Intro\n{}", mermaid_marker("new", "graph TD\nNew-->Doc"));
    let (mut new_view, mut new_pass) = session.begin(&segment_document(&new_text));
    assert!(!session.is_current(old_view.generation()));

    engine.complete("graph TD\nOld-->Doc", Ok("<svg>old</svg>".to_string()));
    let late = block_on(old_pass.next()).unwrap();
    assert!(!session.is_current(late.generation));

    // Index 1 is the new document's figure; the guard is the generation, not the index.
    let misrouted = folio_render::FigureCompletion {
        index: 1,
        ..late.clone()
    };
    assert_eq!(new_view.apply(misrouted), ApplyOutcome::Stale);
    assert_eq!(figure_states(new_view.segments()), ["pending"]);
    assert!(!new_view.to_html().contains("old"));

    assert_eq!(old_view.apply(late), ApplyOutcome::Applied);

    engine.complete("graph TD\nNew-->Doc", Ok("<svg>new</svg>".to_string()));
    let fresh = block_on(new_pass.next()).unwrap();
    assert_eq!(new_view.apply(fresh), ApplyOutcome::Applied);
    assert!(new_view.to_html().contains("<svg>new</svg>"));
}

#[test]
fn dropped_pass_leaves_figures_pending() {
    let engine = Arc::new(ChannelEngine::default());
    let mut session = session_with(&engine);
    let text = mermaid_marker("", "graph TD\nA-->B");
    let (view, pass) = session.begin(&segment_document(&text));
    drop(pass);
    assert_eq!(view.pending_figures(), 1);
    assert!(view.to_html().contains("Rendering diagram..."));
}

#[test]
fn unknown_types_and_truncated_tags_render_as_visible_text() {
    let raw = "Before <figure-link type=\"chart\" title=\"x\" content=\"y\" /> after.\n\n\
               <figure-link type='mermaid' content='graph TD\\nA-->B'></figure-link>\n\n\
               <figure-link type='mermaid' content='graph TD";
    let segments = segment_article(raw);
    assert_eq!(segments.iter().filter(|s| s.as_figure().is_some()).count(), 1);

    let mut session = RenderSession::default();
    let (mut view, pass) = session.begin(&segments);
    block_on(pass.drive(&mut view));
    let html = view.to_html();
    assert!(html.contains("&lt;figure-link type=\"chart\" title=\"x\" content=\"y\" /&gt;"));
    assert!(html.contains("&lt;figure-link type='mermaid' content='graph TD"));
    assert_eq!(html.matches("<figure ").count(), 1);
}
