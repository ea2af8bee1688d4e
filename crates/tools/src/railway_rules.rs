//! Railway Rules — answers policy questions from the reference-document index.
//!
//! Retrieves the top-k chunks for the question, stuffs them into a single
//! prompt, and asks the generation provider for an answer.

use async_trait::async_trait;
use railsage_core::embedding::Embedder;
use railsage_core::error::{IndexError, ProviderError, ToolError};
use railsage_core::provider::{Provider, ProviderRequest};
use railsage_core::tool::Tool;
use railsage_knowledge::VectorIndex;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "Railway Rules";
pub const DESCRIPTION: &str = "Use this to look up rules about refunds, luggage, and tatkal.";
pub const NO_RULES: &str = "No relevant rules were found in the reference documents.";

/// Retrieval-augmented answering over the vector index.
pub struct RailwayRulesTool {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    provider: Arc<dyn Provider>,
    model: String,
    top_k: usize,
    temperature: f32,
    max_context_chars: usize,
    max_tokens: Option<u32>,
}

impl RailwayRulesTool {
    /// Fails if `embedder` is not the embedder the index was built with.
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Result<Self, IndexError> {
        index.check_identity(embedder.identity())?;
        Ok(Self {
            index,
            embedder,
            provider,
            model: model.into(),
            top_k: 3,
            temperature: 0.3,
            max_context_chars: 6000,
            max_tokens: None,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn failed(reason: impl std::fmt::Display) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: reason.to_string(),
        }
    }
}

/// Join chunk texts with blank lines, keeping at most `max_chars` characters.
pub fn build_context<'a>(texts: impl IntoIterator<Item = &'a str>, max_chars: usize) -> String {
    let joined = texts.into_iter().collect::<Vec<_>>().join("\n\n");
    match joined.char_indices().nth(max_chars) {
        Some((byte_end, _)) => joined[..byte_end].to_string(),
        None => joined,
    }
}

/// The "stuff" prompt: all retrieved context, then the question.
pub fn stuff_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
         {context}\n\n\
         Question: {question}\n\
         Helpful Answer:"
    )
}

#[async_trait]
impl Tool for RailwayRulesTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let question = input.trim();

        let hits = self
            .index
            .retrieve_text(self.embedder.as_ref(), question, self.top_k)
            .await
            .map_err(Self::failed)?;

        if hits.is_empty() {
            return Ok(NO_RULES.to_string());
        }

        debug!(
            tool = NAME,
            chunks = hits.len(),
            best_score = hits[0].score,
            best_source = %hits[0].chunk.source_document,
            "Retrieved rule chunks"
        );

        let context = build_context(hits.iter().map(|h| h.chunk.text.as_str()), self.max_context_chars);
        let request = ProviderRequest::prompt(&self.model, stuff_prompt(&context, question), self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await.map_err(|e| match e {
            ProviderError::Timeout(secs) => ToolError::Timeout {
                tool_name: NAME.into(),
                timeout_secs: secs,
            },
            other => Self::failed(other),
        })?;

        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railsage_core::embedding::EmbedderIdentity;
    use railsage_core::provider::ProviderResponse;
    use railsage_knowledge::{SourceDocument, chunk_documents};
    use railsage_providers::HashEmbedder;
    use std::sync::Mutex;

    /// Records prompts and answers with a fixed reply (or error).
    struct RecordingProvider {
        reply: Result<String, ProviderError>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.prompts.lock().unwrap().push(request.messages[0].content.clone());
            self.reply.clone().map(|content| ProviderResponse {
                content,
                usage: None,
                model: request.model,
            })
        }
    }

    async fn index(embedder: &HashEmbedder) -> Arc<VectorIndex> {
        let docs = vec![
            SourceDocument {
                name: "refunds.txt".into(),
                text: "Tatkal refund policy: no refund is granted on cancellation of confirmed tatkal tickets."
                    .into(),
            },
            SourceDocument {
                name: "luggage.txt".into(),
                text: "Luggage: sleeper class passengers may carry up to 40 kg free.".into(),
            },
        ];
        let chunks = chunk_documents(&docs, 1000, 200);
        Arc::new(VectorIndex::build(chunks, embedder, 8).await.unwrap())
    }

    #[tokio::test]
    async fn answers_from_retrieved_chunks() {
        let embedder = HashEmbedder::new(128);
        let provider = RecordingProvider::replying("  Tatkal tickets are not refundable.  ");
        let tool = RailwayRulesTool::new(index(&embedder).await, Arc::new(embedder), provider.clone(), "gpt-4o-mini")
            .unwrap()
            .with_top_k(1);

        let result = tool.invoke("What is the refund policy for tatkal tickets?").await;
        assert!(result.success);
        assert_eq!(result.output, "Tatkal tickets are not refundable.");

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("no refund is granted"));
        assert!(!prompts[0].contains("40 kg"));
        assert!(prompts[0].contains("Question: What is the refund policy for tatkal tickets?"));
    }

    #[tokio::test]
    async fn empty_index_skips_generation() {
        let embedder = HashEmbedder::new(64);
        let empty = Arc::new(VectorIndex::build(Vec::new(), &embedder, 8).await.unwrap());
        let provider = RecordingProvider::replying("unused");
        let tool = RailwayRulesTool::new(empty, Arc::new(embedder), provider.clone(), "m").unwrap();

        let result = tool.invoke("luggage").await;
        assert_eq!(result.output, NO_RULES);
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn mismatched_embedder_rejected_at_construction() {
        let embedder = HashEmbedder::new(128);
        let idx = index(&embedder).await;
        let other = Arc::new(HashEmbedder::new(64));
        let err = RailwayRulesTool::new(idx, other, RecordingProvider::replying("x"), "m")
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::EmbedderMismatch { .. }));
        assert_ne!(
            EmbedderIdentity::new("hash", "trigram-v1", 128),
            EmbedderIdentity::new("hash", "trigram-v1", 64)
        );
    }

    #[tokio::test]
    async fn generation_failure_is_error_observation() {
        let embedder = HashEmbedder::new(128);
        let provider = RecordingProvider::failing(ProviderError::Network("connection refused".into()));
        let tool = RailwayRulesTool::new(index(&embedder).await, Arc::new(embedder), provider, "m").unwrap();

        let result = tool.invoke("luggage allowance").await;
        assert!(!result.success);
        assert!(result.output.contains("connection refused"));
    }

    #[tokio::test]
    async fn generation_timeout_is_tool_timeout() {
        let embedder = HashEmbedder::new(128);
        let provider = RecordingProvider::failing(ProviderError::Timeout(60));
        let tool = RailwayRulesTool::new(index(&embedder).await, Arc::new(embedder), provider, "m").unwrap();

        let err = tool.execute("luggage").await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_secs: 60, .. }));
    }

    #[test]
    fn context_is_bounded_on_char_boundary() {
        let context = build_context(["ऑनलाइन रिफंड", "second"], 5);
        assert_eq!(context.chars().count(), 5);
        assert_eq!(build_context(["a", "b"], 100), "a\n\nb");
    }
}
