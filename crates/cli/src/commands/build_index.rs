//! `railsage build-index` — chunk, embed, and persist the reference documents.

use super::load_config;
use anyhow::Context;
use railsage_knowledge::{BuildLock, IndexBuilder, load_documents};
use railsage_providers::build_embedder;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub async fn run(path: Option<&Path>, docs_override: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let docs_dir = docs_override.unwrap_or_else(|| config.knowledge.docs_dir.clone());
    let index_dir = &config.knowledge.index_dir;

    let docs = load_documents(&docs_dir)
        .await
        .with_context(|| format!("Failed to read documents from {}", docs_dir.display()))?;
    anyhow::ensure!(!docs.is_empty(), "No .txt or .md documents in {}", docs_dir.display());

    if force && BuildLock::clear(index_dir)? {
        warn!(dir = %index_dir.display(), "Removed existing build lock");
    }

    info!(documents = docs.len(), dir = %docs_dir.display(), "Building index");
    let embedder = build_embedder(&config);
    let (_, manifest) = IndexBuilder::new()
        .with_chunking(config.knowledge.chunk_size, config.knowledge.chunk_overlap)
        .with_batch_size(config.embedding.batch_size)
        .build_to(index_dir, &docs, embedder.as_ref())
        .await
        .context("Index build failed")?;

    println!("Indexed {} document(s) into {} chunk(s)", docs.len(), manifest.chunk_count);
    println!("   Embedder: {}", manifest.embedder);
    println!("   Location: {}", index_dir.display());

    Ok(())
}
