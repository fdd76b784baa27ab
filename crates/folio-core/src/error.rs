use crate::annotation::MalformedTag;
use crate::marker::MarkerError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Malformed figure-link tag at byte {offset}: {reason}")]
    MalformedTag { offset: usize, reason: MalformedTag },

    #[error("Corrupt figure marker at byte {offset}: {source}")]
    CorruptMarker {
        offset: usize,
        #[source]
        source: MarkerError,
    },

    #[error("Unsupported figure type for authoring: {declared_type}")]
    UnsupportedFigureType { declared_type: String },
}
