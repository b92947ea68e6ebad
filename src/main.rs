//! # Source Index CLI (`sidx`)
//!
//! Thin local driver over the indexing library, for administering the
//! knowledge base from a shell: indexing an approved URL or PDF,
//! removing a source's chunks, and inspecting the index file. The
//! surrounding source-record bookkeeping (submission, review, status)
//! lives with the admin workflow that consumes this crate.
//!
//! ## Usage
//!
//! ```bash
//! sidx --config ./sidx.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sidx add-url <source-id> <url>` | Fetch, chunk, embed, and index a web page |
//! | `sidx add-pdf <source-id> <file>` | Extract, chunk, embed, and index a PDF |
//! | `sidx remove <chunk-id>...` | Remove chunks from the index by id |
//! | `sidx exists <source-id>` | Check whether a source has indexed chunks |
//! | `sidx show` | Print the index model tag and entry counts |
//!
//! Embedding commands read the API key from `OPENAI_API_KEY`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use source_index::config::{load_config, Config};
use source_index::embedding::{DisabledEmbeddings, EmbeddingClient, OpenAiEmbeddings};
use source_index::indexer::SourceIndexer;
use source_index::models::SourceContent;
use source_index::store::IndexStore;

/// Source Index CLI — ingestion and maintenance of the RAG index file.
#[derive(Parser)]
#[command(
    name = "sidx",
    about = "Source Index — document ingestion and vector index maintenance",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./sidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL, reduce it to text, and add it to the index.
    AddUrl {
        /// Opaque id of the source record; chunk ids become `<id>::<n>`.
        source_id: String,

        /// The page to fetch.
        url: String,

        /// Provenance label stored on each chunk; defaults to the URL.
        #[arg(long)]
        label: Option<String>,
    },

    /// Extract a PDF's text layer and add it to the index.
    AddPdf {
        /// Opaque id of the source record; chunk ids become `<id>::<n>`.
        source_id: String,

        /// Path of the PDF file.
        file: PathBuf,

        /// Provenance label stored on each chunk; defaults to the file name.
        #[arg(long)]
        label: Option<String>,
    },

    /// Remove chunks from the index by their ids.
    ///
    /// Ids not present in the index are ignored; running the same
    /// removal twice is safe.
    Remove {
        /// Chunk ids, e.g. `src42::0 src42::1`.
        #[arg(required = true)]
        chunk_ids: Vec<String>,
    },

    /// Check whether a source has chunks in the index.
    Exists { source_id: String },

    /// Print the index model tag and per-source entry counts.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::AddUrl {
            source_id,
            url,
            label,
        } => {
            let indexer = make_indexer(&config, true)?;
            let label = label.unwrap_or_else(|| url.clone());
            let ids = indexer
                .approve_source(&source_id, &label, &SourceContent::Url(url))
                .await?;
            println!("add-url {}", source_id);
            println!("  chunks indexed: {}", ids.len());
            println!("ok");
        }

        Commands::AddPdf {
            source_id,
            file,
            label,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read PDF file: {}", file.display()))?;
            let label = label.unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string())
            });

            let indexer = make_indexer(&config, true)?;
            let ids = indexer
                .approve_source(&source_id, &label, &SourceContent::PdfBytes(bytes))
                .await?;
            println!("add-pdf {}", source_id);
            println!("  chunks indexed: {}", ids.len());
            println!("ok");
        }

        Commands::Remove { chunk_ids } => {
            let indexer = make_indexer(&config, false)?;
            indexer.remove_source(&chunk_ids).await?;
            println!("remove");
            println!("  ids requested: {}", chunk_ids.len());
            println!("ok");
        }

        Commands::Exists { source_id } => {
            let indexer = make_indexer(&config, false)?;
            let exists = indexer.source_exists(&source_id).await?;
            println!("{}", exists);
        }

        Commands::Show => {
            let store = IndexStore::new(&config.index.path, config.embedding.model.as_str());
            let index = store.load().await?;

            let mut per_source: BTreeMap<&str, usize> = BTreeMap::new();
            for entry in &index.index {
                *per_source.entry(entry.source.as_str()).or_default() += 1;
            }

            println!("index {}", config.index.path.display());
            println!("  model: {}", index.model);
            println!("  entries: {}", index.index.len());
            for (source, count) in per_source {
                println!("  {:>6}  {}", count, source);
            }
        }
    }

    Ok(())
}

fn make_indexer(config: &Config, with_embeddings: bool) -> Result<SourceIndexer> {
    let store = Arc::new(IndexStore::new(
        &config.index.path,
        config.embedding.model.as_str(),
    ));

    let embeddings: Arc<dyn EmbeddingClient> = if with_embeddings {
        Arc::new(OpenAiEmbeddings::new(&config.embedding)?)
    } else {
        Arc::new(DisabledEmbeddings::new(config.embedding.model.as_str()))
    };

    Ok(SourceIndexer::new(store, embeddings, config))
}
