//! Embedder implementations.
//!
//! - [`HashEmbedder`]: deterministic, offline character-trigram embeddings.
//!   Not semantically accurate like a neural model, but content-dependent
//!   and stable across runs, which is what index build/query consistency
//!   and tests need.
//! - [`RemoteEmbedder`]: delegates to a [`Provider`]'s `/embeddings` endpoint
//!   and enforces the configured dimension.

use async_trait::async_trait;
use railsage_core::embedding::{Embedder, EmbedderIdentity};
use railsage_core::error::ProviderError;
use railsage_core::provider::{EmbeddingRequest, Provider};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
        "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has",
        "had", "it", "its", "their", "they", "them", "what", "can", "you",
    ]
    .into_iter()
    .collect()
});

/// Deterministic trigram-hash embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    identity: EmbedderIdentity,
}

impl HashEmbedder {
    pub const PROVIDER: &'static str = "hash";
    pub const MODEL: &'static str = "trigram-v1";

    pub fn new(dimensions: usize) -> Self {
        Self {
            identity: EmbedderIdentity::new(Self::PROVIDER, Self::MODEL, dimensions.max(1)),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let dims = self.identity.dimensions;
        let mut embedding = vec![0.0f32; dims];
        let lower = text.to_lowercase();

        // BTreeMap keeps accumulation order fixed, so float sums are
        // bit-identical between runs.
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let mut buf = [0u8; 4];
                let trigram_hash = window.iter().fold(0u64, |acc, c| {
                    c.encode_utf8(&mut buf)
                        .bytes()
                        .fold(acc, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64))
                });
                embedding[(trigram_hash as usize) % dims] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % dims] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Embeddings computed by a remote provider.
pub struct RemoteEmbedder {
    provider: Arc<dyn Provider>,
    identity: EmbedderIdentity,
}

impl RemoteEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, dimensions: usize) -> Self {
        let identity = EmbedderIdentity::new(provider.name(), model, dimensions);
        Self { provider, identity }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.identity.model.clone(),
                inputs: texts.to_vec(),
            })
            .await?;

        if let Some(bad) = response
            .embeddings
            .iter()
            .find(|v| v.len() != self.identity.dimensions)
        {
            return Err(ProviderError::MalformedResponse(format!(
                "embedding has {} dimensions, {} configured",
                bad.len(),
                self.identity.dimensions
            )));
        }

        Ok(response.embeddings)
    }
}
