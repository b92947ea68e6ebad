//! End-to-end lifecycle tests: chunk → embed → persist and back.
//!
//! These drive [`SourceIndexer`] against a temporary index file with a
//! deterministic fake embedding client, so every scenario is exact and
//! offline. The HTTP seams (page fetch, embeddings endpoint) are covered
//! separately in `tests/http_clients.rs` with a mock server.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use source_index::config::{ChunkingConfig, Config, EmbeddingConfig, FetchConfig, IndexConfig};
use source_index::embedding::EmbeddingClient;
use source_index::error::IndexerError;
use source_index::indexer::SourceIndexer;
use source_index::models::RagIndex;
use source_index::store::IndexStore;

const MODEL: &str = "text-embedding-3-small";

/// Deterministic embeddings derived from the chunk text itself.
struct FakeEmbeddings;

#[async_trait]
impl EmbeddingClient for FakeEmbeddings {
    fn model(&self) -> &str {
        MODEL
    }

    async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, IndexerError> {
        Ok(chunks
            .iter()
            .map(|c| {
                let first = c.chars().next().map(|ch| ch as u32).unwrap_or(0);
                vec![c.chars().count() as f32, first as f32, 1.0]
            })
            .collect())
    }
}

/// Always fails, for atomicity checks.
struct FailingEmbeddings;

#[async_trait]
impl EmbeddingClient for FailingEmbeddings {
    fn model(&self) -> &str {
        MODEL
    }

    async fn embed(&self, _chunks: &[String]) -> Result<Vec<Vec<f32>>, IndexerError> {
        Err(IndexerError::EmbeddingProvider("provider down".into()))
    }
}

fn test_config(index_path: PathBuf) -> Config {
    Config {
        index: IndexConfig { path: index_path },
        chunking: ChunkingConfig::default(),
        embedding: EmbeddingConfig::default(),
        fetch: FetchConfig::default(),
    }
}

fn make_indexer(
    dir: &TempDir,
    client: Arc<dyn EmbeddingClient>,
) -> (Arc<IndexStore>, SourceIndexer) {
    let path = dir.path().join("index.json");
    let store = Arc::new(IndexStore::new(path.clone(), MODEL));
    let indexer = SourceIndexer::new(store.clone(), client, &test_config(path));
    (store, indexer)
}

#[tokio::test]
async fn two_thousand_chars_index_as_three_chunks() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));

    let ids = indexer
        .add_source("docA", "Doc A", &"x".repeat(2000))
        .await
        .unwrap();

    assert_eq!(ids, vec!["docA::0", "docA::1", "docA::2"]);

    let index = store.load().await.unwrap();
    assert_eq!(index.model, MODEL);
    assert_eq!(index.index.len(), 3);
    assert_eq!(index.index[0].text.len(), 800);
    assert_eq!(index.index[1].text.len(), 800);
    assert_eq!(index.index[2].text.len(), 600);
    for (entry, id) in index.index.iter().zip(&ids) {
        assert_eq!(&entry.id, id);
        assert_eq!(entry.source, "Doc A");
        assert_eq!(entry.embedding.len(), 3);
    }
}

#[tokio::test]
async fn short_text_fails_without_touching_the_file() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));

    let err = indexer
        .add_source("doc", "Doc", &"x".repeat(40))
        .await
        .unwrap_err();

    assert!(matches!(err, IndexerError::NoChunks));
    assert!(!store.path().exists());
}

#[tokio::test]
async fn chunk_ids_depend_only_on_source_id_and_ordinal() {
    let text = "abc ".repeat(500);

    let dir1 = TempDir::new().unwrap();
    let (_, indexer1) = make_indexer(&dir1, Arc::new(FakeEmbeddings));
    let ids1 = indexer1.add_source("s1", "label", &text).await.unwrap();

    let dir2 = TempDir::new().unwrap();
    let (_, indexer2) = make_indexer(&dir2, Arc::new(FakeEmbeddings));
    let ids2 = indexer2.add_source("s1", "label", &text).await.unwrap();

    assert_eq!(ids1, ids2);
    for (ordinal, id) in ids1.iter().enumerate() {
        assert_eq!(id, &format!("s1::{}", ordinal));
    }
}

#[tokio::test]
async fn embedding_failure_leaves_the_index_file_byte_identical() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));

    indexer
        .add_source("keep", "Keep", &"k".repeat(900))
        .await
        .unwrap();
    let before = std::fs::read(store.path()).unwrap();

    let path = dir.path().join("index.json");
    let failing = SourceIndexer::new(
        store.clone(),
        Arc::new(FailingEmbeddings),
        &test_config(path),
    );
    let err = failing
        .add_source("new", "New", &"n".repeat(900))
        .await
        .unwrap_err();

    assert!(matches!(err, IndexerError::EmbeddingProvider(_)));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
async fn embedding_failure_on_a_fresh_index_creates_no_file() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FailingEmbeddings));

    let err = indexer
        .add_source("doc", "Doc", &"y".repeat(900))
        .await
        .unwrap_err();

    assert!(matches!(err, IndexerError::EmbeddingProvider(_)));
    assert!(!store.path().exists());
}

/// Seed the index with sources `a` (2 chunks) and `b` (1 chunk).
async fn seed_a_and_b(indexer: &SourceIndexer) -> (Vec<String>, Vec<String>) {
    let a_ids = indexer
        .add_source("a", "Source A", &"a".repeat(900))
        .await
        .unwrap();
    let b_ids = indexer
        .add_source("b", "Source B", &"b".repeat(100))
        .await
        .unwrap();
    assert_eq!(a_ids, vec!["a::0", "a::1"]);
    assert_eq!(b_ids, vec!["b::0"]);
    (a_ids, b_ids)
}

#[tokio::test]
async fn removing_one_source_keeps_the_others() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));
    let (a_ids, _) = seed_a_and_b(&indexer).await;

    indexer.remove_source(&a_ids).await.unwrap();

    let index = store.load().await.unwrap();
    let remaining: Vec<&str> = index.index.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(remaining, vec!["b::0"]);
}

#[tokio::test]
async fn removal_is_idempotent_and_ignores_unknown_ids() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));
    let (a_ids, _) = seed_a_and_b(&indexer).await;

    indexer.remove_source(&a_ids).await.unwrap();
    let after_first = std::fs::read(store.path()).unwrap();

    // Same removal again, plus ids that never existed.
    indexer.remove_source(&a_ids).await.unwrap();
    indexer
        .remove_source(&["ghost::0".to_string()])
        .await
        .unwrap();

    assert_eq!(std::fs::read(store.path()).unwrap(), after_first);
    assert_eq!(store.load().await.unwrap().index.len(), 1);
}

#[tokio::test]
async fn empty_removal_never_writes_the_file() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));

    indexer.remove_source(&[]).await.unwrap();

    // No load/save happened: the file was never created.
    assert!(!store.path().exists());
}

#[tokio::test]
async fn source_exists_tracks_additions_and_removals() {
    let dir = TempDir::new().unwrap();
    let (_, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));
    let (a_ids, _) = seed_a_and_b(&indexer).await;

    assert!(indexer.source_exists("a").await.unwrap());
    assert!(indexer.source_exists("b").await.unwrap());
    assert!(!indexer.source_exists("c").await.unwrap());

    indexer.remove_source(&a_ids).await.unwrap();

    assert!(!indexer.source_exists("a").await.unwrap());
    assert!(indexer.source_exists("b").await.unwrap());
}

#[tokio::test]
async fn source_id_prefix_matching_is_exact() {
    let dir = TempDir::new().unwrap();
    let (_, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));

    indexer
        .add_source("doc10", "Doc 10", &"z".repeat(100))
        .await
        .unwrap();

    // "doc1" must not match "doc10::0".
    assert!(indexer.source_exists("doc10").await.unwrap());
    assert!(!indexer.source_exists("doc1").await.unwrap());
}

#[tokio::test]
async fn index_tagged_by_another_model_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));

    store
        .save(&RagIndex::empty("text-embedding-ada-002"))
        .await
        .unwrap();

    let err = indexer
        .add_source("doc", "Doc", &"m".repeat(900))
        .await
        .unwrap_err();

    assert!(matches!(err, IndexerError::ModelMismatch { .. }));
}

#[tokio::test]
async fn sources_accumulate_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let (store, indexer) = make_indexer(&dir, Arc::new(FakeEmbeddings));
    seed_a_and_b(&indexer).await;

    let index = store.load().await.unwrap();
    let ids: Vec<&str> = index.index.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a::0", "a::1", "b::0"]);
}

#[tokio::test]
async fn concurrent_additions_are_both_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");
    let store = Arc::new(IndexStore::new(path.clone(), MODEL));
    let indexer = Arc::new(SourceIndexer::new(
        store.clone(),
        Arc::new(FakeEmbeddings),
        &test_config(path),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let indexer = indexer.clone();
        handles.push(tokio::spawn(async move {
            indexer
                .add_source(&format!("src{}", i), "Source", &"c".repeat(900))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Without the store's write lock, last-writer-wins would drop
    // entries from interleaved load-mutate-save cycles.
    let index = store.load().await.unwrap();
    assert_eq!(index.index.len(), 16);
    for i in 0..8 {
        assert!(indexer.source_exists(&format!("src{}", i)).await.unwrap());
    }
}
