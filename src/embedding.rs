//! Embedding generation for text chunks.
//!
//! [`EmbeddingClient`] is the seam the lifecycle manager is constructed
//! with, so tests can inject a deterministic fake. The production
//! implementation, [`OpenAiEmbeddings`], calls an OpenAI-compatible
//! `POST /embeddings` endpoint in batches of at most [`MAX_EMBED_BATCH`]
//! inputs, sequentially, concatenating results in input order.
//!
//! A failed batch aborts the whole operation — there is no partial
//! success and no retry; the caller decides what to do with the failure.
//!
//! Also provides [`cosine_similarity`], the building block for a future
//! query-time retrieval path over the stored vectors.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::IndexerError;

/// The embedding provider's practical request-size ceiling.
pub const MAX_EMBED_BATCH: usize = 100;

/// A provider of fixed-dimension embedding vectors.
///
/// `embed` must return exactly one vector per input chunk, in input
/// order. Empty input yields empty output without any external call.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// The model tag recorded in the index for vectors this client produces.
    fn model(&self) -> &str;

    async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, IndexerError>;
}

/// A client for operations that never embed (removal, inspection).
/// Any attempt to embed fails with a descriptive error.
pub struct DisabledEmbeddings {
    model: String,
}

impl DisabledEmbeddings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingClient for DisabledEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, _chunks: &[String]) -> Result<Vec<Vec<f32>>, IndexerError> {
        Err(IndexerError::EmbeddingProvider(
            "embedding client is disabled".into(),
        ))
    }
}

/// Embedding client for an OpenAI-compatible embeddings endpoint.
///
/// Reads the API key from the `OPENAI_API_KEY` environment variable at
/// construction time. The endpoint base and model name come from
/// configuration, not logic.
pub struct OpenAiEmbeddings {
    model: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
    batch_size: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Fails if `OPENAI_API_KEY` is not set or the HTTP client cannot be
    /// built.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, IndexerError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            IndexerError::EmbeddingProvider("OPENAI_API_KEY environment variable not set".into())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IndexerError::EmbeddingProvider(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            client,
            batch_size: config.batch_size.min(MAX_EMBED_BATCH),
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, IndexerError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": batch,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexerError::EmbeddingProvider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(IndexerError::EmbeddingProvider(format!(
                "HTTP {}: {}",
                status, body_text
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::EmbeddingProvider(format!("malformed response: {}", e)))?;

        if parsed.data.len() != batch.len() {
            return Err(IndexerError::EmbeddingProvider(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, IndexerError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            debug!(model = %self.model, batch_len = batch.len(), "embedding batch");
            embeddings.extend(self.embed_batch(batch).await?);
        }

        Ok(embeddings)
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors
/// of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
