#![forbid(unsafe_code)]

//! HTML rendering for segmented articles.
//!
//! Prose segments and nested-markdown figures render synchronously through [`ProseRenderer`].
//! Diagram figures go through a [`DiagramEngine`] asynchronously; each one owns a small
//! [`FigureRenderState`] machine (`pending` to `ready` or `failed`) updated by
//! [`FigureCompletion`] messages. Nothing here depends on a specific executor: a [`RenderPass`]
//! is a plain `Stream`, and tests drive it with `futures::executor::block_on`.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod figure;
pub mod prose;

pub use config::{
    DiagramSettings, DiagramTheme, ElementStyles, FolioConfig, RawHtml, RenderOptions,
    SecurityLevel,
};
pub use document::{
    ApplyOutcome, DocumentView, FigureCompletion, RenderPass, RenderSession, SegmentView,
};
pub use engine::{
    DiagramEngine, EngineHandle, HydrationEngine, RenderFuture, RenderKey, sanitize_dom_id,
};
pub use error::{EngineError, Error, Result};
pub use figure::{FigureRenderState, FigureView};
pub use prose::ProseRenderer;

/// Renders a raw article with `config` and the built-in engine, blocking until every figure has
/// settled.
pub fn render_article_sync(raw: &str, config: &FolioConfig) -> String {
    let mut session = RenderSession::from_config(config);
    futures::executor::block_on(session.render_to_html(raw))
}
