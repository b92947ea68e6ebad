//! Core data types for the source index.
//!
//! These types mirror the persisted index file exactly: a flat JSON
//! aggregate of chunk records, each carrying its embedding vector.
//! Field names are part of the on-disk contract — renaming any of them
//! breaks compatibility with existing index files.

use serde::{Deserialize, Serialize};

/// One retrievable unit of knowledge: a chunk of an approved source
/// together with its embedding.
///
/// The `id` is derived deterministically as `{source_id}::{ordinal}`,
/// where the ordinal is the zero-based position of the chunk within its
/// source's chunk sequence at creation time. Ids are unique across the
/// whole index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    /// Human-readable provenance label (a URL or file name). Descriptive
    /// only — not unique.
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// The process-wide persisted aggregate: every chunk of every approved
/// source, plus the tag of the embedding model that produced the vectors.
///
/// The aggregate is always read and written as a whole; entries are in
/// insertion order, which has no retrieval semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagIndex {
    pub model: String,
    pub index: Vec<IndexEntry>,
}

impl RagIndex {
    /// An empty index tagged with the given embedding model.
    pub fn empty(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            index: Vec::new(),
        }
    }
}

/// Raw payload of an external source record, as supplied by the admin
/// workflow when a source is approved.
#[derive(Debug, Clone)]
pub enum SourceContent {
    /// A web page to fetch and reduce to plain text.
    Url(String),
    /// An uploaded PDF document.
    PdfBytes(Vec<u8>),
}

/// Build the deterministic chunk id for a source and chunk ordinal.
pub fn chunk_id(source_id: &str, ordinal: usize) -> String {
    format!("{}::{}", source_id, ordinal)
}
