//! Durable storage for the flat vector index.
//!
//! The whole [`RagIndex`] aggregate round-trips through memory on every
//! mutation: `load` reads and deserializes the full file, `save`
//! serializes and replaces it wholesale. This bounds the design to
//! indexes that fit comfortably in memory — fine for a single-tenant
//! knowledge base of a few thousand chunks.
//!
//! `save` writes to a temporary file and renames it over the canonical
//! path, so a crash mid-write leaves either the old or the new content,
//! never a torn file. The rename protects against corruption only; lost
//! updates between concurrent writers are prevented by the store's write
//! lock, which the lifecycle manager holds across each load-mutate-save
//! cycle. Multi-process deployments still need external mutual exclusion
//! on the file.
//!
//! On-disk format: UTF-8 JSON, pretty-printed at 2-space indent (for
//! human diffability; not required for correctness), shape
//! `{"model": ..., "index": [{"id", "source", "text", "embedding"}, ...]}`.

use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::IndexerError;
use crate::models::RagIndex;

pub struct IndexStore {
    path: PathBuf,
    default_model: String,
    write_lock: Mutex<()>,
}

impl IndexStore {
    /// A store over the given file path. `default_model` tags the empty
    /// index returned when no file exists yet.
    pub fn new(path: impl Into<PathBuf>, default_model: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_model: default_model.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize load-mutate-save cycles. Writers must hold the guard
    /// from before `load` until after `save`; plain readers don't take it.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Read the full index.
    ///
    /// An absent file yields an empty index tagged with the default
    /// model. A file that exists but cannot be parsed as the expected
    /// shape is an [`IndexerError::CorruptIndex`] — never silently
    /// replaced by an empty index.
    pub async fn load(&self) -> Result<RagIndex, IndexerError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RagIndex::empty(self.default_model.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| IndexerError::CorruptIndex {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the persisted index with the given aggregate.
    ///
    /// Writes `<path>.tmp` and renames it over the canonical path.
    pub async fn save(&self, index: &RagIndex) -> Result<(), IndexerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // serde_json's pretty printer uses the 2-space indent the file
        // contract specifies.
        let json = serde_json::to_string_pretty(index)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), entries = index.index.len(), "saved index");

        Ok(())
    }
}
