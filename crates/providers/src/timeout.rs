//! Per-call timeouts for providers and embedders.
//!
//! Every external call the assistant makes goes through one of these
//! wrappers, so a hung backend surfaces as `ProviderError::Timeout` instead
//! of stalling a session.

use async_trait::async_trait;
use railsage_core::embedding::{Embedder, EmbedderIdentity};
use railsage_core::error::ProviderError;
use railsage_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A provider that bounds every call to its inner provider.
pub struct TimeoutProvider {
    inner: Arc<dyn Provider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn elapsed(&self, op: &str) -> ProviderError {
        warn!(
            provider = %self.inner.name(),
            op,
            timeout_secs = self.timeout.as_secs(),
            "Provider call timed out"
        );
        ProviderError::Timeout(self.timeout.as_secs())
    }
}

#[async_trait]
impl Provider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.complete(request))
            .await
            .map_err(|_| self.elapsed("complete"))?
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.embed(request))
            .await
            .map_err(|_| self.elapsed("embed"))?
    }
}

/// An embedder that bounds every batch to a timeout. Keeps the inner
/// embedder's identity.
pub struct TimeoutEmbedder {
    inner: Arc<dyn Embedder>,
    timeout: Duration,
}

impl TimeoutEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Embedder for TimeoutEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        self.inner.identity()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.embed_batch(texts)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    embedder = %self.inner.identity(),
                    timeout_secs = self.timeout.as_secs(),
                    "Embedding call timed out"
                );
                Err(ProviderError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;

    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl Provider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(ProviderResponse {
                content: "done".into(),
                usage: None,
                model: request.model,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_call_passes_through() {
        let provider = TimeoutProvider::new(
            Arc::new(SlowProvider { delay: Duration::from_millis(10) }),
            Duration::from_secs(1),
        );
        let response = provider
            .complete(ProviderRequest::prompt("m", "hi", 0.0))
            .await
            .unwrap();
        assert_eq!(response.content, "done");
        assert_eq!(provider.name(), "slow");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let provider = TimeoutProvider::new(
            Arc::new(SlowProvider { delay: Duration::from_secs(30) }),
            Duration::from_secs(2),
        );
        let err = provider
            .complete(ProviderRequest::prompt("m", "hi", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(2)));
    }

    #[tokio::test]
    async fn timeout_embedder_keeps_identity() {
        let embedder = TimeoutEmbedder::new(Arc::new(HashEmbedder::new(32)), Duration::from_secs(5));
        assert_eq!(embedder.identity().model, HashEmbedder::MODEL);
        assert_eq!(embedder.embed("luggage rules").await.unwrap().len(), 32);
    }
}
