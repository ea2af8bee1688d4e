//! Shared test helpers for agent tests.

use railsage_core::error::{ProviderError, ToolError};
use railsage_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use railsage_core::tool::{Tool, ToolRegistry};
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next entry in the queue and records
/// the prompt it was given. Panics if more calls are made than scripted.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
    stops: Mutex<Vec<Vec<String>>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
            stops: Mutex::new(Vec::new()),
        }
    }

    /// Script plain text replies.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn stops(&self) -> Vec<Vec<String>> {
        self.stops.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = prompts.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        prompts.push(request.messages[0].content.clone());
        self.stops.lock().unwrap().push(request.stop.clone());
        responses[count].clone()
    }
}

/// A provider that never answers.
pub struct StalledProvider;

#[async_trait::async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ProviderError::Network("unreachable".into()))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A tool that answers with a fixed observation and counts its calls.
pub struct FixedTool {
    pub name: &'static str,
    pub description: &'static str,
    pub reply: &'static str,
    pub calls: Mutex<Vec<String>>,
}

impl FixedTool {
    pub fn new(name: &'static str, description: &'static str, reply: &'static str) -> Self {
        Self {
            name,
            description,
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Tool for FixedTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(input.to_string());
        Ok(self.reply.to_string())
    }
}

/// A tool that takes longer than the reasoning timeout used in tests.
pub struct SlowTool;

#[async_trait::async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "Slow Tool"
    }

    fn description(&self) -> &str {
        "Takes its time."
    }

    async fn execute(&self, _input: &str) -> Result<String, ToolError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("slow result".into())
    }
}

pub struct FailingTool;

#[async_trait::async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "Failing Tool"
    }

    fn description(&self) -> &str {
        "Always fails."
    }

    async fn execute(&self, _input: &str) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: "backend unavailable".into(),
        })
    }
}

/// The two railway tools, with canned observations.
pub fn railway_registry() -> ToolRegistry {
    ToolRegistry::from_tools(vec![
        Box::new(FixedTool::new(
            "Train Schedule DB",
            "Use this to find train numbers, routes, and schedules.",
            "12951 | Mumbai Rajdhani Express | Mumbai Central -> New Delhi",
        )),
        Box::new(FixedTool::new(
            "Railway Rules",
            "Use this to look up rules about refunds, luggage, and tatkal.",
            "No refund is granted on cancellation of confirmed tatkal tickets.",
        )),
    ])
    .unwrap()
}
