//! Error taxonomy for the indexing pipeline.
//!
//! Every failure is propagated directly to the caller (the admin
//! workflow); nothing is retried or recovered inside this crate. The
//! pipeline orders its steps so that persistence happens last, after all
//! fallible steps have succeeded.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the extraction, embedding, and index operations.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Document URL unreachable or the server answered with a non-2xx
    /// status.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// PDF binary unparsable or carrying no extractable text layer.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Extracted text was shorter than the minimum a source must provide
    /// to be worth indexing.
    #[error("extracted text is too short ({len} chars, minimum {min})")]
    TextTooShort { len: usize, min: usize },

    /// Input text produced zero chunks (entirely below the chunk floor).
    #[error("no valid chunks could be created from the text")]
    NoChunks,

    /// An embedding batch call failed: non-2xx response, malformed body,
    /// or a result count that does not match the input.
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// The persisted index file exists but is not valid JSON of the
    /// expected shape. Never silently replaced by an empty index.
    #[error("corrupt index file at {}: {source}", path.display())]
    CorruptIndex {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The loaded index records vectors from a different embedding model
    /// than the configured client. Mixing vector spaces silently degrades
    /// retrieval, so the append is rejected.
    #[error("index is tagged with model '{index_model}' but the embedding client uses '{client_model}'")]
    ModelMismatch {
        index_model: String,
        client_model: String,
    },

    /// Filesystem failure reading or writing the index file.
    #[error("index file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
