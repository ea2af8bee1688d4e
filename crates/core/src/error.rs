//! Error types for the RailSage domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use thiserror::Error;

/// The top-level error type for all RailSage operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

/// Errors raised by the vector index.
///
/// `NotFound`, `EmbedderMismatch` and `DimensionMismatch` are configuration
/// errors: the index on disk cannot be served with the current settings.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Vector index not found at {0}")]
    NotFound(String),

    #[error("Embedder mismatch: index was built with {recorded}, configured embedder is {configured}")]
    EmbedderMismatch { recorded: String, configured: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index is corrupt: {0}")]
    Corrupt(String),

    #[error("Another build holds {0}; if none is running, rerun build-index with --force")]
    BuildInProgress(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IndexError {
    /// Whether this error means the index cannot be used with the current
    /// configuration (as opposed to a transient failure).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::EmbedderMismatch { .. } | Self::DimensionMismatch { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid input at line {line}: {reason}")]
    Input { line: usize, reason: String },

    #[error("Batch {batch} failed after {committed_rows} committed rows: {reason}")]
    Load {
        batch: usize,
        committed_rows: usize,
        reason: String,
    },
}

/// The kind of terminal failure an agent session reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorKind {
    /// The step budget ran out before a final answer was produced.
    IterationBudgetExceeded,
    /// The reasoning output never matched the action / final-answer grammar.
    UnparseableReasoning,
    /// The reasoning provider returned an error.
    Provider,
    /// The reasoning provider did not answer within the per-call timeout.
    Timeout,
}

impl AgentErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IterationBudgetExceeded => "iteration_budget_exceeded",
            Self::UnparseableReasoning => "unparseable_reasoning",
            Self::Provider => "provider_error",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for AgentErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured session failure. Never carries a partial answer.
#[derive(Debug, Clone, Error)]
#[error("{kind} after {steps} step(s): {detail}")]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub steps: usize,
    pub detail: String,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, steps: usize, detail: impl Into<String>) -> Self {
        Self {
            kind,
            steps,
            detail: detail.into(),
        }
    }
}
