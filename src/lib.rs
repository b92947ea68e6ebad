//! # Source Index
//!
//! Document ingestion and flat vector indexing for a regulatory-assistant
//! RAG knowledge base.
//!
//! Source Index turns approved documents (web pages, PDFs) into
//! overlapping text chunks, embeds them through a batched external
//! embedding call, and maintains a single durable JSON index file used
//! to ground a chat assistant's answers.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────┐   ┌────────────┐   ┌─────────────┐
//! │ Extractor │──▶│ Chunker │──▶│ Embeddings │──▶│ Index Store │
//! │ URL / PDF │   │ windows │   │  batched   │   │  index.json │
//! └───────────┘   └─────────┘   └────────────┘   └─────────────┘
//!        ▲              orchestrated by               ▲
//!        └──────────── SourceIndexer ─────────────────┘
//! ```
//!
//! The index file is replaced wholesale on every save via a temp-file
//! rename, and load-mutate-save cycles are serialized by a per-store
//! write lock. Failures propagate to the caller untouched; persistence
//! always happens last.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Index data types and the on-disk contract |
//! | [`extract`] | URL fetch + HTML reduction, PDF text extraction |
//! | [`chunk`] | Overlapping fixed-size text chunking |
//! | [`embedding`] | Embedding client trait and OpenAI-compatible HTTP client |
//! | [`store`] | Durable whole-aggregate index storage |
//! | [`indexer`] | Source lifecycle orchestration |
//! | [`error`] | Error taxonomy |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod models;
pub mod store;

pub use error::IndexerError;
pub use indexer::SourceIndexer;
