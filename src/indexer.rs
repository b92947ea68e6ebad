//! Source lifecycle orchestration.
//!
//! [`SourceIndexer`] ties the pipeline together: extraction → chunking →
//! embedding → index insertion for approval, and filter-by-id for
//! removal. It is constructed with its collaborators (an
//! [`EmbeddingClient`] and an [`IndexStore`]) rather than reaching for
//! ambient singletons, and keeps no state of its own between calls —
//! all state lives in the store and in the caller's source records.
//!
//! Both mutating operations are all-or-nothing with respect to the
//! persisted index: every fallible step runs before the single `save`,
//! so a failure anywhere leaves the file untouched.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config, FetchConfig};
use crate::embedding::EmbeddingClient;
use crate::error::IndexerError;
use crate::extract::{extract_from_pdf, extract_from_url};
use crate::models::{chunk_id, IndexEntry, SourceContent};
use crate::store::IndexStore;

/// Minimum extracted text length for a source to be worth indexing,
/// enforced on the approval path.
pub const MIN_SOURCE_TEXT_CHARS: usize = 100;

pub struct SourceIndexer {
    store: Arc<IndexStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    chunking: ChunkingConfig,
    fetch: FetchConfig,
}

impl SourceIndexer {
    pub fn new(
        store: Arc<IndexStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            embeddings,
            chunking: config.chunking.clone(),
            fetch: config.fetch.clone(),
        }
    }

    /// Chunk, embed, and append a source's text to the index.
    ///
    /// Returns the created chunk ids `{source_id}::0..n` in chunk order;
    /// the caller records them against its source record for later
    /// removal.
    ///
    /// # Errors
    ///
    /// [`IndexerError::NoChunks`] if the text yields no chunk,
    /// [`IndexerError::EmbeddingProvider`] if any embedding batch fails
    /// (the index file is guaranteed untouched), and
    /// [`IndexerError::ModelMismatch`] if the index on disk was built by
    /// a different embedding model.
    pub async fn add_source(
        &self,
        source_id: &str,
        source_label: &str,
        text: &str,
    ) -> Result<Vec<String>, IndexerError> {
        let chunks = chunk_text(text, self.chunking.chunk_size, self.chunking.overlap);
        if chunks.is_empty() {
            return Err(IndexerError::NoChunks);
        }

        let embeddings = self.embeddings.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(IndexerError::EmbeddingProvider(format!(
                "client returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let _guard = self.store.lock_writes().await;
        let mut index = self.store.load().await?;

        if index.model != self.embeddings.model() {
            return Err(IndexerError::ModelMismatch {
                index_model: index.model,
                client_model: self.embeddings.model().to_string(),
            });
        }

        let mut ids = Vec::with_capacity(chunks.len());
        for (ordinal, (text, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            let id = chunk_id(source_id, ordinal);
            ids.push(id.clone());
            index.index.push(IndexEntry {
                id,
                source: source_label.to_string(),
                text,
                embedding,
            });
        }

        self.store.save(&index).await?;

        info!(
            source_id,
            chunks = ids.len(),
            index_entries = index.index.len(),
            "source indexed"
        );

        Ok(ids)
    }

    /// Remove the given chunk ids from the index.
    ///
    /// Empty input is a no-op that never touches the file. Ids not
    /// present in the index are silently ignored, so removal is
    /// idempotent.
    pub async fn remove_source(&self, chunk_ids: &[String]) -> Result<(), IndexerError> {
        if chunk_ids.is_empty() {
            return Ok(());
        }

        let ids: HashSet<&str> = chunk_ids.iter().map(String::as_str).collect();

        let _guard = self.store.lock_writes().await;
        let mut index = self.store.load().await?;
        let before = index.index.len();
        index.index.retain(|entry| !ids.contains(entry.id.as_str()));
        self.store.save(&index).await?;

        info!(
            removed = before - index.index.len(),
            index_entries = index.index.len(),
            "chunks removed"
        );

        Ok(())
    }

    /// Whether any chunk of the given source is in the index.
    pub async fn source_exists(&self, source_id: &str) -> Result<bool, IndexerError> {
        let prefix = format!("{}::", source_id);
        let index = self.store.load().await?;
        Ok(index.index.iter().any(|entry| entry.id.starts_with(&prefix)))
    }

    /// Approval orchestration: extract a source's content, enforce the
    /// minimum-length policy, and add it to the index.
    ///
    /// The surrounding status bookkeeping (`pending → processing →
    /// approved | error`) stays with the caller; this is the body of the
    /// approved transition.
    pub async fn approve_source(
        &self,
        source_id: &str,
        source_label: &str,
        content: &SourceContent,
    ) -> Result<Vec<String>, IndexerError> {
        let text = match content {
            SourceContent::Url(url) => extract_from_url(&self.fetch, url).await?,
            SourceContent::PdfBytes(bytes) => extract_from_pdf(bytes)?,
        };

        let len = text.chars().count();
        if len < MIN_SOURCE_TEXT_CHARS {
            return Err(IndexerError::TextTooShort {
                len,
                min: MIN_SOURCE_TEXT_CHARS,
            });
        }

        self.add_source(source_id, source_label, &text).await
    }
}
