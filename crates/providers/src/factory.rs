//! Builds the generation provider and the embedder from configuration.

use crate::embedder::{HashEmbedder, RemoteEmbedder};
use crate::openai_compat::OpenAiCompatProvider;
use crate::timeout::{TimeoutEmbedder, TimeoutProvider};
use railsage_config::AppConfig;
use railsage_core::embedding::Embedder;
use railsage_core::provider::Provider;
use std::sync::Arc;
use tracing::info;

/// Build the text-generation provider, bounded by the configured per-call
/// timeout.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let name = config.llm.provider.as_str();
    let base_url = config
        .llm
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(name));
    let api_key = config.api_key.clone().unwrap_or_default();

    info!(provider = name, model = %config.llm.model, "Configured generation provider");

    let inner: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(name, base_url, api_key));
    Arc::new(TimeoutProvider::new(inner, config.agent.call_timeout()))
}

/// Build the embedder described by `config.embedding`.
///
/// `"hash"` selects the offline trigram embedder; anything else is treated
/// as an OpenAI-compatible provider name.
pub fn build_embedder(config: &AppConfig) -> Arc<dyn Embedder> {
    let embedding = &config.embedding;

    let inner: Arc<dyn Embedder> = if embedding.provider == HashEmbedder::PROVIDER {
        Arc::new(HashEmbedder::new(embedding.dimensions))
    } else {
        let base_url = embedding
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(&embedding.provider));
        let api_key = config.api_key.clone().unwrap_or_default();
        let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
            embedding.provider.as_str(),
            base_url,
            api_key,
        ));
        Arc::new(RemoteEmbedder::new(
            provider,
            embedding.model.as_str(),
            embedding.dimensions,
        ))
    };

    info!(embedder = %inner.identity(), "Configured embedder");
    Arc::new(TimeoutEmbedder::new(inner, config.agent.call_timeout()))
}

/// Default base URL for a provider name. Ollama runs locally; everything
/// else talks to OpenAI unless `api_url` is set.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "ollama" => "http://localhost:11434/v1".into(),
        _ => "https://api.openai.com/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
        assert_eq!(default_base_url("anything-else"), default_base_url("openai"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config);
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn default_embedder_is_hash() {
        let config = AppConfig::default();
        let embedder = build_embedder(&config);
        assert_eq!(embedder.identity().to_string(), "hash/trigram-v1/384");
    }

    #[test]
    fn remote_embedder_identity_follows_config() {
        let mut config = AppConfig::default();
        config.embedding.provider = "openai".into();
        config.embedding.model = "text-embedding-3-small".into();
        config.embedding.dimensions = 1536;
        let embedder = build_embedder(&config);
        assert_eq!(
            embedder.identity().to_string(),
            "openai/text-embedding-3-small/1536"
        );
    }
}
