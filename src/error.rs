//! Crate-wide error type

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Upload could not be parsed as a PDF
    #[error("PDF could not be read: {0}")]
    Pdf(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered, but not with something we can use
    #[error("backend error: {0}")]
    Backend(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("a summary is required before a suggestion can be generated")]
    MissingSummary,

    #[error("there is no suggestion to save")]
    NothingToSave,

    #[error("at most {max} activities can be stored")]
    ActivityLimit { max: usize },

    #[error("no activity at index {index} (list holds {len})")]
    ActivityIndex { index: usize, len: usize },
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Export(err.to_string())
    }
}
