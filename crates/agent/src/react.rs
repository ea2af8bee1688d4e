//! ReAct loop: Thought → Action → Observation.
//!
//! Each Thinking step renders the prompt from the question and the
//! scratchpad, asks the provider for one reasoning output, and parses it.
//! An action is executed against the tool registry and its observation is
//! appended to the scratchpad; a final answer ends the session.
//!
//! The loop always terminates. Every pass either appends a scratchpad entry
//! (bounded by `max_iterations`), counts a parse failure (bounded by
//! `max_parse_retries`), or returns.

use crate::parser::{ParseFailure, ReasoningStep, parse_reasoning};
use crate::prompt::{STOP_SEQUENCE, build_prompt};
use crate::session::{AgentSession, ScratchpadEntry, SessionOutcome, SessionStatus};
use railsage_config::AppConfig;
use railsage_core::error::{AgentError, AgentErrorKind, ProviderError};
use railsage_core::provider::{Provider, ProviderRequest};
use railsage_core::tool::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};

/// The ReAct agent. Immutable once built; each [`run`](Self::run) owns its
/// own session, so one agent serves concurrent queries.
pub struct ReactAgent {
    /// Reasoning provider.
    provider: Arc<dyn Provider>,
    /// Model name.
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    /// Maximum scratchpad entries before giving up.
    max_iterations: usize,
    /// Unusable reasoning outputs tolerated per session.
    max_parse_retries: usize,
    /// Applies to each reasoning call. Tools bound their own external calls.
    call_timeout: Duration,
}

impl ReactAgent {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            tools,
            max_iterations: 10,
            max_parse_retries: 2,
            call_timeout: Duration::from_secs(60),
        }
    }

    /// Build from the `[llm]` and `[agent]` config sections.
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        Self::new(provider, &config.llm.model, tools)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_max_parse_retries(config.agent.max_parse_retries)
            .with_call_timeout(config.agent.call_timeout())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// At least one step is always allowed.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_max_parse_retries(mut self, retries: usize) -> Self {
        self.max_parse_retries = retries;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer one question.
    ///
    /// Returns the final answer with the full reasoning trace, or a
    /// structured failure. A failure never carries a partial answer.
    pub async fn run(&self, query: &str) -> Result<SessionOutcome, AgentError> {
        let session = AgentSession::new(query);
        let span = info_span!("session", session_id = %session.session_id);
        self.run_session(session).instrument(span).await
    }

    async fn run_session(&self, mut session: AgentSession) -> Result<SessionOutcome, AgentError> {
        info!(
            model = %self.model,
            max_iter = self.max_iterations,
            tools = self.tools.len(),
            "ReAct session starting"
        );

        loop {
            // ── Budget ──
            if session.step_count() >= self.max_iterations {
                return Err(self.fail(
                    &mut session,
                    AgentErrorKind::IterationBudgetExceeded,
                    format!("no final answer within {} steps", self.max_iterations),
                ));
            }

            // ── Thinking ──
            session.status = SessionStatus::Thinking;
            let output = match self.reason(&session).await {
                Ok(output) => output,
                Err((kind, detail)) => return Err(self.fail(&mut session, kind, detail)),
            };

            let step = parse_reasoning(&output).and_then(|step| match step {
                ReasoningStep::Action { ref tool, .. } if !self.tools.contains(tool) => {
                    Err(ParseFailure::UnknownTool(tool.clone()))
                }
                step => Ok(step),
            });

            match step {
                Ok(ReasoningStep::FinalAnswer { answer, .. }) => {
                    info!(steps = session.step_count(), "ReAct session done");
                    return Ok(session.finish(answer));
                }
                Ok(ReasoningStep::Action { thought, tool, input }) => {
                    session.last_parse_failure = None;

                    // ── Acting ──
                    session.status = SessionStatus::Acting;
                    debug!(step = session.step_count() + 1, tool = %tool, input = %input, "Invoking tool");
                    let observation = self.act(&tool, &input).await;

                    // ── Observing ──
                    session.status = SessionStatus::Observing;
                    debug!(tool = %tool, chars = observation.len(), "Observation recorded");
                    session.record(ScratchpadEntry {
                        thought,
                        action: tool,
                        action_input: input,
                        observation,
                    });
                }
                Err(failure) => {
                    session.parse_failures += 1;
                    warn!(
                        failures = session.parse_failures,
                        reason = %failure,
                        "Unusable reasoning output"
                    );
                    if session.parse_failures > self.max_parse_retries {
                        return Err(self.fail(
                            &mut session,
                            AgentErrorKind::UnparseableReasoning,
                            format!("last output unusable because {failure}"),
                        ));
                    }
                    session.last_parse_failure = Some(failure);
                }
            }
        }
    }

    /// One reasoning call, bounded by the call timeout.
    async fn reason(&self, session: &AgentSession) -> Result<String, (AgentErrorKind, String)> {
        let prompt = build_prompt(
            &self.tools,
            &session.original_query,
            session.scratchpad(),
            session.last_parse_failure.as_ref(),
        );
        let request = ProviderRequest::prompt(&self.model, prompt, self.temperature)
            .with_stop(STOP_SEQUENCE)
            .with_max_tokens(self.max_tokens);

        match tokio::time::timeout(self.call_timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.content),
            Ok(Err(ProviderError::Timeout(secs))) => Err((
                AgentErrorKind::Timeout,
                format!("reasoning call timed out after {secs}s"),
            )),
            Ok(Err(e)) => Err((AgentErrorKind::Provider, e.to_string())),
            Err(_) => Err((
                AgentErrorKind::Timeout,
                format!("reasoning call timed out after {}s", self.call_timeout.as_secs()),
            )),
        }
    }

    /// One tool invocation. Never fails; errors become observation text.
    ///
    /// Not bounded here: a tool may make several external calls, and each
    /// of those carries its own timeout.
    async fn act(&self, tool: &str, input: &str) -> String {
        self.tools.invoke(tool, input).await.output
    }

    fn fail(&self, session: &mut AgentSession, kind: AgentErrorKind, detail: String) -> AgentError {
        session.status = SessionStatus::Failed;
        warn!(kind = %kind, steps = session.step_count(), detail = %detail, "ReAct session failed");
        AgentError::new(kind, session.step_count(), detail)
    }
}
