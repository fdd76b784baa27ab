use crate::EngineError;
use crate::config::RenderOptions;
use folio_core::{Figure, FigureKind};
use htmlize::{escape_attribute, escape_text};
use serde::Serialize;

/// Render state of one figure. Transitions only out of `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FigureRenderState {
    Pending,
    Ready { output: String },
    Failed { message: String },
}

impl FigureRenderState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    /// Moves a pending state to ready or failed. Returns `false`, leaving the state untouched,
    /// when it has already settled.
    pub fn settle(&mut self, outcome: Result<String, EngineError>) -> bool {
        if !self.is_pending() {
            return false;
        }
        *self = match outcome {
            Ok(output) => Self::Ready { output },
            Err(err) => Self::Failed {
                message: err.to_string(),
            },
        };
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigureView {
    pub figure: Figure,
    pub state: FigureRenderState,
}

impl FigureView {
    pub fn pending(figure: Figure) -> Self {
        Self {
            figure,
            state: FigureRenderState::Pending,
        }
    }

    pub fn ready(figure: Figure, output: String) -> Self {
        Self {
            figure,
            state: FigureRenderState::Ready { output },
        }
    }

    pub fn to_html(&self, options: &RenderOptions) -> String {
        let kind = self.figure.kind.as_str();
        let mut out = format!(
            r#"<figure class="{}" data-kind="{kind}" data-state="{}">"#,
            escape_attribute(options.figure_class.as_str()),
            self.state.as_str(),
        );
        out.push('\n');

        match &self.state {
            FigureRenderState::Pending => {
                out.push_str(r#"<div class="folio-figure-loading" role="status">"#);
                out.push_str(match self.figure.kind {
                    FigureKind::Mermaid => "Rendering diagram...",
                    FigureKind::Markdown => "Rendering figure...",
                });
                out.push_str("</div>\n");
            }
            FigureRenderState::Ready { output } => {
                out.push_str(output);
                if !output.ends_with('\n') {
                    out.push('\n');
                }
            }
            FigureRenderState::Failed { message } => {
                out.push_str(r#"<div class="folio-figure-error" role="alert">"#);
                out.push_str(&format!(
                    "<p>This {} could not be rendered: {}</p>",
                    match self.figure.kind {
                        FigureKind::Mermaid => "diagram",
                        FigureKind::Markdown => "figure",
                    },
                    escape_text(message.as_str()),
                ));
                out.push_str(&format!(
                    r#"<pre><code class="language-{kind}">{}</code></pre>"#,
                    escape_text(self.figure.content.as_str()),
                ));
                out.push_str("</div>\n");
            }
        }

        if let Some(caption) = self.figure.caption() {
            out.push_str(&format!(
                r#"<figcaption class="{}">{}</figcaption>"#,
                escape_attribute(options.caption_class.as_str()),
                escape_text(caption),
            ));
            out.push('\n');
        }
        out.push_str("</figure>\n");
        out
    }
}
