pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`crate::DiagramEngine`].
///
/// These never abort a document render; they end up in [`crate::FigureRenderState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("No diagram type detected for text: {text}")]
    UnknownDiagram { text: String },

    #[error("Diagram ({diagram_type}) has no statements")]
    EmptyDiagram { diagram_type: String },

    #[error("Diagram rejected: {message}")]
    Rejected { message: String },

    #[error("Diagram engine configuration failed: {message}")]
    Configuration { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
