//! Document views, render passes and sessions.
//!
//! A [`RenderSession::begin`] call turns a segment list into a [`DocumentView`], rendering prose
//! and nested-markdown figures immediately, and a [`RenderPass`] that yields one
//! [`FigureCompletion`] per diagram as the engine finishes them, in whatever order that happens.
//! Completions carry the generation of the pass that produced them, and a view refuses
//! completions from any other generation, so results of a superseded document never land in the
//! current one.

use crate::EngineError;
use crate::config::{FolioConfig, RenderOptions};
use crate::engine::{EngineHandle, HydrationEngine};
use crate::figure::FigureView;
use crate::prose::ProseRenderer;
use folio_core::{FigureKind, PreparedDocument, Segment, prepare_document};
use futures::FutureExt as _;
use futures::StreamExt as _;
use futures::future::BoxFuture;
use futures::stream::{FusedStream, FuturesUnordered, Stream};
use serde::Serialize;
use std::ops::Range;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentView {
    Prose { html: String, span: Range<usize> },
    Figure(FigureView),
}

impl SegmentView {
    pub fn as_figure(&self) -> Option<&FigureView> {
        match self {
            Self::Figure(view) => Some(view),
            Self::Prose { .. } => None,
        }
    }

    pub fn to_html(&self, options: &RenderOptions) -> String {
        match self {
            Self::Prose { html, .. } => html.clone(),
            Self::Figure(view) => view.to_html(options),
        }
    }
}

/// The result of one diagram render, addressed to a segment of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureCompletion {
    pub generation: u64,
    /// Index into [`DocumentView::segments`].
    pub index: usize,
    pub outcome: Result<String, EngineError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOutcome {
    Applied,
    /// The completion belongs to another generation; the view is unchanged.
    Stale,
    /// The figure already left `Pending`; the view is unchanged.
    AlreadySettled,
    /// The index is out of range or names a prose segment.
    NotAFigure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    generation: u64,
    segments: Vec<SegmentView>,
    #[serde(skip)]
    options: RenderOptions,
}

impl DocumentView {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn segments(&self) -> &[SegmentView] {
        &self.segments
    }

    pub fn figures(&self) -> impl Iterator<Item = &FigureView> {
        self.segments.iter().filter_map(SegmentView::as_figure)
    }

    pub fn pending_figures(&self) -> usize {
        self.figures().filter(|f| f.state.is_pending()).count()
    }

    pub fn is_settled(&self) -> bool {
        self.pending_figures() == 0
    }

    pub fn apply(&mut self, completion: FigureCompletion) -> ApplyOutcome {
        if completion.generation != self.generation {
            tracing::debug!(
                current = self.generation,
                completion = completion.generation,
                index = completion.index,
                "dropping stale figure completion"
            );
            return ApplyOutcome::Stale;
        }
        let Some(SegmentView::Figure(view)) = self.segments.get_mut(completion.index) else {
            return ApplyOutcome::NotAFigure;
        };
        if let Err(err) = &completion.outcome {
            tracing::warn!(
                index = completion.index,
                title = %view.figure.title,
                %err,
                "figure failed to render"
            );
        }
        if view.state.settle(completion.outcome) {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::AlreadySettled
        }
    }

    /// Segment HTML in document order, whatever order the figures settled in.
    pub fn to_html(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.to_html(&self.options))
            .collect()
    }
}

/// In-flight diagram renders of one generation.
///
/// A `Stream` of [`FigureCompletion`]s in completion order. All renders are polled
/// concurrently; nothing runs unless the pass is polled.
pub struct RenderPass {
    generation: u64,
    in_flight: FuturesUnordered<BoxFuture<'static, FigureCompletion>>,
}

impl std::fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl RenderPass {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Renders not yet completed.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Applies every completion to `view` as it arrives. Returns the number applied.
    pub async fn drive(mut self, view: &mut DocumentView) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.next().await {
            if view.apply(completion) == ApplyOutcome::Applied {
                applied += 1;
            }
        }
        tracing::debug!(generation = self.generation, applied, "render pass finished");
        applied
    }
}

impl Stream for RenderPass {
    type Item = FigureCompletion;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.in_flight).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.in_flight.size_hint()
    }
}

impl FusedStream for RenderPass {
    fn is_terminated(&self) -> bool {
        self.in_flight.is_terminated()
    }
}

/// Owns the engine handle, the prose renderer and the generation counter for a sequence of
/// documents shown in the same place.
#[derive(Debug)]
pub struct RenderSession {
    engine: EngineHandle,
    prose: ProseRenderer,
    options: RenderOptions,
    generation: u64,
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::from_config(&FolioConfig::default())
    }
}

impl RenderSession {
    pub fn new(engine: EngineHandle, prose: ProseRenderer, options: RenderOptions) -> Self {
        Self {
            engine,
            prose,
            options,
            generation: 0,
        }
    }

    /// A session using the built-in [`HydrationEngine`].
    pub fn from_config(config: &FolioConfig) -> Self {
        Self::with_engine(
            EngineHandle::new(HydrationEngine::new(), config.diagram.clone()),
            config,
        )
    }

    pub fn with_engine(engine: EngineHandle, config: &FolioConfig) -> Self {
        Self::new(
            engine,
            ProseRenderer::from_config(config),
            config.render.clone(),
        )
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Generation of the most recent [`Self::begin`], `0` before the first.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Starts rendering `segments` as a new generation, superseding any earlier one.
    pub fn begin(&mut self, segments: &[Segment]) -> (DocumentView, RenderPass) {
        self.generation += 1;
        let generation = self.generation;
        let in_flight = FuturesUnordered::new();
        let mut views = Vec::with_capacity(segments.len());

        for segment in segments {
            match segment {
                Segment::Prose { text, span } => {
                    if self.options.drop_blank_prose && segment.is_blank() {
                        continue;
                    }
                    views.push(SegmentView::Prose {
                        html: self.prose.render(text),
                        span: span.clone(),
                    });
                }
                Segment::Figure(figure) => match figure.kind {
                    FigureKind::Markdown => {
                        let output = self.prose.render(&figure.content);
                        views.push(SegmentView::Figure(FigureView::ready(figure.clone(), output)));
                    }
                    FigureKind::Mermaid => {
                        let index = views.len();
                        let render = self.engine.render(figure.content.as_str());
                        in_flight.push(
                            render
                                .map(move |outcome| FigureCompletion {
                                    generation,
                                    index,
                                    outcome,
                                })
                                .boxed(),
                        );
                        views.push(SegmentView::Figure(FigureView::pending(figure.clone())));
                    }
                },
            }
        }

        tracing::debug!(
            generation,
            segments = views.len(),
            pending = in_flight.len(),
            "render pass started"
        );
        let view = DocumentView {
            generation,
            segments: views,
            options: self.options.clone(),
        };
        let pass = RenderPass {
            generation,
            in_flight,
        };
        (view, pass)
    }

    /// Runs the text pipeline on a raw article and begins rendering it.
    pub fn load(&mut self, raw: &str) -> (PreparedDocument, DocumentView, RenderPass) {
        let prepared = prepare_document(raw);
        let (view, pass) = self.begin(&prepared.segments());
        (prepared, view, pass)
    }

    /// Renders a raw article to HTML once every figure has settled.
    pub async fn render_to_html(&mut self, raw: &str) -> String {
        let (_, mut view, pass) = self.load(raw);
        pass.drive(&mut view).await;
        view.to_html()
    }
}
