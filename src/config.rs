use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chunk::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embedding::MAX_EMBED_BATCH;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Path of the persisted index JSON file.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_batch_size() -> usize {
    MAX_EMBED_BATCH
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; SourceIndex/0.1)".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Enforce the caller contracts the pipeline relies on. The chunker in
/// particular never checks `chunk_size > overlap` itself — a violation
/// would make its cursor stop advancing.
pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap == 0 || config.chunking.overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.overlap must satisfy 0 < overlap < chunk_size (got {} / {})",
            config.chunking.overlap,
            config.chunking.chunk_size
        );
    }

    if config.embedding.model.is_empty() {
        anyhow::bail!("embedding.model must not be empty");
    }
    if config.embedding.batch_size == 0 || config.embedding.batch_size > MAX_EMBED_BATCH {
        anyhow::bail!(
            "embedding.batch_size must be in 1..={} (got {})",
            MAX_EMBED_BATCH,
            config.embedding.batch_size
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            index: IndexConfig {
                path: PathBuf::from("data/index.json"),
            },
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            fetch: FetchConfig::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = base_config();
        assert!(validate(&config).is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.overlap, 100);
        assert_eq!(config.embedding.batch_size, 100);
    }

    #[test]
    fn overlap_must_be_below_chunk_size() {
        let mut config = base_config();
        config.chunking.overlap = 800;
        assert!(validate(&config).is_err());

        config.chunking.overlap = 900;
        assert!(validate(&config).is_err());

        config.chunking.overlap = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn batch_size_is_capped_at_provider_ceiling() {
        let mut config = base_config();
        config.embedding.batch_size = MAX_EMBED_BATCH + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [index]
            path = "data/index.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert!(config.fetch.user_agent.contains("SourceIndex"));
    }
}
