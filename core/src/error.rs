use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Block not found: {id}")]
    BlockNotFound { id: String },

    #[error("Block already exists: {id}")]
    AlreadyExists { id: String },

    #[error("Manifest not found: {id}")]
    ManifestNotFound { id: String },

    #[error("Block store is closed")]
    Closed,

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Declared length {expected} does not match payload length {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("Invalid source '{source_text}': {reason}")]
    InvalidSource { source_text: String, reason: String },

    #[error("Manifest catalog error: {0}")]
    Catalog(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::BlockNotFound { .. } | Error::ManifestNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
