//! Embedder trait — the text → vector mapping shared by index build and query.
//!
//! An index is only meaningful when queried with the mapping that built it,
//! so every embedder exposes an [`EmbedderIdentity`] that the index records
//! and checks.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifies an embedding function: who computes it, with which model, and
/// how wide its vectors are. Two embedders are interchangeable only when
/// their identities are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbedderIdentity {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl EmbedderIdentity {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            dimensions,
        }
    }
}

impl std::fmt::Display for EmbedderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.model, self.dimensions)
    }
}

/// The core Embedder trait.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The identity recorded in (and checked against) a persisted index.
    fn identity(&self) -> &EmbedderIdentity;

    /// Embed a batch of texts. Returns one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a single text (convenience method).
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::MalformedResponse("no embedding returned".into()))
    }
}
