use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("index artifacts are inconsistent: {0}")]
    InconsistentIndex(String),

    #[error("failed to persist index: {0}")]
    Persist(String),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generator returned status {0}")]
    GeneratorStatus(reqwest::StatusCode),

    #[error("malformed generator response: {0}")]
    MalformedResponse(String),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
