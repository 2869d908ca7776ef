use thiserror::Error;

/// Configuration could not be loaded or failed validation. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    /// The configured model could not be loaded. Fatal to the process.
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Embedding failed: {0}")]
    Inference(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Write to '{collection}' failed: {reason}")]
    Write { collection: String, reason: String },

    #[error("Collection '{collection}' was built with embedder '{indexed}' but queried with '{querying}'")]
    EmbedderMismatch { collection: String, indexed: String, querying: String },

    #[error("Index backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Failures that end an ingestion run. Per-file problems are reported, not raised.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("None of the {0} source path(s) exist")]
    NoSources(usize),

    #[error("No chunks extracted from {0} file(s); nothing to index")]
    NoChunks(usize),

    #[error("Another ingestion run holds the lock at {0}; if no ingestion is running, delete that file and retry")]
    Locked(String),

    #[error("Ingestion I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown domain '{domain}'; expected one of: {known}")]
    UnknownDomain { domain: String, known: String },

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Index(#[from] IndexError),
}
