//! Per-query session state.

use crate::parser::ParseFailure;
use serde::Serialize;

/// One completed Thought → Action → Observation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScratchpadEntry {
    pub thought: String,
    pub action: String,
    pub action_input: String,
    pub observation: String,
}

/// Where a session is in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Thinking,
    Acting,
    Observing,
    Done,
    Failed,
}

/// Mutable state of one agent run. Owned by the loop; never shared.
#[derive(Debug, Clone)]
pub struct AgentSession {
    pub session_id: String,
    pub original_query: String,
    scratchpad: Vec<ScratchpadEntry>,
    step_count: usize,
    pub parse_failures: usize,
    pub last_parse_failure: Option<ParseFailure>,
    pub status: SessionStatus,
}

impl AgentSession {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            original_query: query.into(),
            scratchpad: Vec::new(),
            step_count: 0,
            parse_failures: 0,
            last_parse_failure: None,
            status: SessionStatus::Thinking,
        }
    }

    /// Append an observed step. The only way the scratchpad grows, so
    /// `step_count() == scratchpad().len()` always holds.
    pub fn record(&mut self, entry: ScratchpadEntry) {
        self.scratchpad.push(entry);
        self.step_count += 1;
    }

    pub fn scratchpad(&self) -> &[ScratchpadEntry] {
        &self.scratchpad
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn finish(mut self, final_answer: String) -> SessionOutcome {
        self.status = SessionStatus::Done;
        SessionOutcome {
            session_id: self.session_id,
            original_query: self.original_query,
            final_answer,
            scratchpad: self.scratchpad,
            step_count: self.step_count,
        }
    }
}

/// A completed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: String,
    pub original_query: String,
    pub final_answer: String,
    pub scratchpad: Vec<ScratchpadEntry>,
    pub step_count: usize,
}

impl SessionOutcome {
    /// Tools used, in call order.
    pub fn tools_used(&self) -> Vec<&str> {
        self.scratchpad.iter().map(|e| e.action.as_str()).collect()
    }
}
