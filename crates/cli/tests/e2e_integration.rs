//! End-to-end tests for the RailSage pipeline.
//!
//! Real store (SQLite in a temp dir), real index (hash embedder, persisted
//! and reloaded), real tools. Only the generation provider is scripted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use railsage_agent::ReactAgent;
use railsage_core::embedding::{Embedder, EmbedderIdentity};
use railsage_core::error::{AgentErrorKind, IndexError, ProviderError};
use railsage_core::provider::{Provider, ProviderRequest, ProviderResponse};
use railsage_core::tool::{Tool, ToolRegistry};
use railsage_knowledge::{IndexBuilder, SourceDocument, VectorIndex};
use railsage_providers::{HashEmbedder, TimeoutEmbedder, TimeoutProvider};
use railsage_store::TrainStore;
use railsage_tools::{RailwayRulesTool, TrainScheduleTool, railway_registry};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Scripted reasoning; answers "stuff" prompts from the context it was given.
struct ScriptedProvider {
    reasoning: Mutex<VecDeque<String>>,
    rule_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(reasoning: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reasoning: Mutex::new(reasoning.iter().map(|s| s.to_string()).collect()),
            rule_prompts: Mutex::new(Vec::new()),
        })
    }

    fn rule_prompts(&self) -> Vec<String> {
        self.rule_prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.messages[0].content.clone();

        let content = if prompt.starts_with("Use the following pieces of context") {
            let answer = if prompt.contains("no refund") {
                "Confirmed tatkal tickets get no refund on cancellation."
            } else {
                "I don't know."
            };
            self.rule_prompts.lock().unwrap().push(prompt);
            answer.to_string()
        } else {
            self.reasoning
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedProvider exhausted")
        };

        Ok(ProviderResponse {
            content,
            usage: None,
            model: request.model,
        })
    }
}

/// Delays every call before handing it to the inner provider.
struct LaggingProvider {
    inner: Arc<ScriptedProvider>,
    delay: Duration,
}

#[async_trait::async_trait]
impl Provider for LaggingProvider {
    fn name(&self) -> &str {
        "lagging"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.inner.complete(request).await
    }
}

struct LaggingEmbedder {
    inner: HashEmbedder,
    delay: Duration,
}

#[async_trait::async_trait]
impl Embedder for LaggingEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        self.inner.identity()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed_batch(texts).await
    }
}

/// An agent whose only tool is Railway Rules. The tool's embed and
/// generate calls are each delayed by `delay` and bounded by
/// `call_timeout`, the way the runtime wires them.
async fn lagging_rules_agent(
    dir: &std::path::Path,
    provider: Arc<ScriptedProvider>,
    delay: Duration,
    call_timeout: Duration,
) -> ReactAgent {
    let hash = HashEmbedder::new(256);
    IndexBuilder::new()
        .with_chunking(200, 40)
        .build_to(dir, &reference_docs(), &hash)
        .await
        .unwrap();
    let index = Arc::new(VectorIndex::load(dir, hash.identity()).unwrap());

    let embedder = Arc::new(TimeoutEmbedder::new(
        Arc::new(LaggingEmbedder { inner: hash, delay }),
        call_timeout,
    ));
    let generator = Arc::new(TimeoutProvider::new(
        Arc::new(LaggingProvider {
            inner: provider.clone(),
            delay,
        }),
        call_timeout,
    ));

    let rules = RailwayRulesTool::new(index, embedder, generator, "mock-model").unwrap();
    let tools = Arc::new(ToolRegistry::from_tools(vec![Box::new(rules)]).unwrap());
    ReactAgent::new(provider, "mock-model", tools).with_call_timeout(call_timeout)
}

// ── Fixture ──────────────────────────────────────────────────────────────

struct Fixture {
    _dir: tempfile::TempDir,
    store: TrainStore,
    index: Arc<VectorIndex>,
    embedder: Arc<HashEmbedder>,
}

fn reference_docs() -> Vec<SourceDocument> {
    vec![
        SourceDocument {
            name: "refunds.txt".into(),
            text: "Tatkal tickets: no refund is granted on cancellation of confirmed tatkal tickets. \
                   Waitlisted tatkal tickets are refunded after deduction of clerkage."
                .into(),
        },
        SourceDocument {
            name: "luggage.txt".into(),
            text: "Luggage allowance: sleeper class passengers may carry 40 kg free; \
                   AC first class passengers may carry 70 kg free."
                .into(),
        },
    ]
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let db = format!("sqlite://{}", dir.path().join("railways.db").display());
    let store = TrainStore::connect(&db, 4).await.unwrap();
    store.seed_sample_trains().await.unwrap();

    let embedder = Arc::new(HashEmbedder::new(256));
    let index_dir = dir.path().join("index");
    IndexBuilder::new()
        .with_chunking(200, 40)
        .build_to(&index_dir, &reference_docs(), embedder.as_ref())
        .await
        .unwrap();
    let index = Arc::new(VectorIndex::load(&index_dir, embedder.identity()).unwrap());

    Fixture {
        _dir: dir,
        store,
        index,
        embedder,
    }
}

fn agent(fx: &Fixture, provider: Arc<ScriptedProvider>) -> ReactAgent {
    let schedule = TrainScheduleTool::new(fx.store.clone());
    let rules = RailwayRulesTool::new(fx.index.clone(), fx.embedder.clone(), provider.clone(), "mock-model").unwrap();
    let tools = Arc::new(railway_registry(schedule, rules).unwrap());
    ReactAgent::new(provider, "mock-model", tools).with_max_iterations(5)
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn tatkal_refund_routes_to_rules_and_grounds_answer() {
    let fx = fixture().await;
    let provider = ScriptedProvider::new(&[
        " This is a policy question.\nAction: Railway Rules\nAction Input: refund policy for tatkal tickets",
        " I now know the final answer\nFinal Answer: Confirmed tatkal tickets get no refund on cancellation.",
    ]);

    let outcome = agent(&fx, provider.clone())
        .run("What is the refund policy for tatkal tickets?")
        .await
        .unwrap();

    assert_eq!(outcome.tools_used(), vec!["Railway Rules"]);
    assert!(!outcome.tools_used().contains(&"Train Schedule DB"));
    assert!(!outcome.final_answer.is_empty());
    assert!(outcome.scratchpad[0].observation.contains("no refund"));

    let rule_prompts = provider.rule_prompts();
    assert_eq!(rule_prompts.len(), 1);
    assert!(rule_prompts[0].contains("no refund is granted"));
}

#[tokio::test]
async fn train_number_routes_to_schedule_db() {
    let fx = fixture().await;
    let provider = ScriptedProvider::new(&[
        "Action: Train Schedule DB\nAction Input: 12951",
        "Final Answer: 12951 is the Rajdhani Express from Mumbai Central to New Delhi.",
    ]);

    let outcome = agent(&fx, provider.clone()).run("12951").await.unwrap();

    assert_eq!(outcome.tools_used(), vec!["Train Schedule DB"]);
    assert_eq!(
        outcome.scratchpad[0].observation,
        "12951 | Rajdhani Express | Mumbai Central -> New Delhi"
    );
    assert!(provider.rule_prompts().is_empty());
}

#[tokio::test]
async fn station_lookup_finds_rajdhani() {
    let fx = fixture().await;
    let tool = TrainScheduleTool::new(fx.store.clone());

    let result = tool.invoke("trains from Mumbai to Delhi").await;
    assert!(result.success);
    let lines: Vec<&str> = result.output.lines().collect();
    assert!(lines.len() <= 5);
    assert!(lines.contains(&"12951 | Rajdhani Express | Mumbai Central -> New Delhi"));
}

#[tokio::test]
async fn multi_step_session_keeps_trace_consistent() {
    let fx = fixture().await;
    let provider = ScriptedProvider::new(&[
        "Action: Train Schedule DB\nAction Input: 12951",
        "Action: Railway Rules\nAction Input: tatkal refund",
        "Final Answer: 12951 is the Rajdhani; confirmed tatkal tickets are not refundable.",
    ]);

    let outcome = agent(&fx, provider)
        .run("Which train is 12951 and can I get a tatkal refund on it?")
        .await
        .unwrap();

    assert_eq!(outcome.step_count, 2);
    assert_eq!(outcome.step_count, outcome.scratchpad.len());
    assert_eq!(outcome.tools_used(), vec!["Train Schedule DB", "Railway Rules"]);
}

#[tokio::test]
async fn endless_reasoning_hits_the_budget() {
    let fx = fixture().await;
    let looping = "Action: Train Schedule DB\nAction Input: 12951";
    let provider = ScriptedProvider::new(&[looping; 5]);

    let err = agent(&fx, provider).run("12951").await.unwrap_err();

    assert_eq!(err.kind, AgentErrorKind::IterationBudgetExceeded);
    assert_eq!(err.steps, 5);
}

#[tokio::test]
async fn gibberish_fails_as_unparseable() {
    let fx = fixture().await;
    let provider = ScriptedProvider::new(&["hmm", "let me think", "still not sure"]);

    let err = agent(&fx, provider).run("?").await.unwrap_err();

    assert_eq!(err.kind, AgentErrorKind::UnparseableReasoning);
    assert_eq!(err.steps, 0);
}

#[tokio::test]
async fn index_reload_with_other_embedder_is_rejected() {
    let fx = fixture().await;
    let dir = tempfile::tempdir().unwrap();
    IndexBuilder::new()
        .build_to(dir.path(), &reference_docs(), fx.embedder.as_ref())
        .await
        .unwrap();

    let other = HashEmbedder::new(128);
    let err = VectorIndex::load(dir.path(), other.identity())
        .err()
        .unwrap();
    assert!(matches!(err, IndexError::EmbedderMismatch { .. }));
    assert!(err.is_configuration());
}

#[tokio::test(start_paused = true)]
async fn rules_tool_gets_a_timeout_per_external_call() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(&[
        "Action: Railway Rules\nAction Input: tatkal refund",
        "Final Answer: Confirmed tatkal tickets get no refund on cancellation.",
    ]);

    // Embed and generate each take 1.5s: within 2s apiece, 3s together.
    let outcome = lagging_rules_agent(dir.path(), provider.clone(), Duration::from_millis(1500), Duration::from_secs(2))
        .await
        .run("What is the refund policy for tatkal tickets?")
        .await
        .unwrap();

    let observation = &outcome.scratchpad[0].observation;
    assert!(!observation.starts_with("Error:"), "got {observation}");
    assert!(observation.contains("no refund"));
    assert_eq!(provider.rule_prompts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn rules_tool_reports_a_slow_external_call_as_an_error_observation() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(&[
        "Action: Railway Rules\nAction Input: tatkal refund",
        "Final Answer: The rules lookup timed out.",
    ]);

    let outcome = lagging_rules_agent(dir.path(), provider.clone(), Duration::from_secs(3), Duration::from_secs(2))
        .await
        .run("What is the refund policy for tatkal tickets?")
        .await
        .unwrap();

    let observation = &outcome.scratchpad[0].observation;
    assert!(observation.starts_with("Error:"));
    assert!(observation.contains("timed out after 2s"));
    assert!(provider.rule_prompts().is_empty());
}
