//! Configuration loading, validation, and management for RailSage.
//!
//! Loads configuration from `~/.railsage/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.railsage/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key shared by generation and embedding backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Text-generation backend used for reasoning and answer synthesis
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding function used to build and query the vector index
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Reference-document index settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Structured store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP service settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("llm", &self.llm)
            .field("embedding", &self.embedding)
            .field("knowledge", &self.knowledge)
            .field("agent", &self.agent)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name ("openai", "openrouter", "ollama", "groq", ...)
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature for the reasoning step
    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_provider() -> String {
    "openai".into()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_url: None,
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hash" for the offline trigram embedder, otherwise an
    /// OpenAI-compatible provider name
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Texts per embedding request during index build
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_provider() -> String {
    "hash".into()
}
fn default_embedding_model() -> String {
    "trigram-v1".into()
}
fn default_dimensions() -> usize {
    384
}
fn default_embed_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_url: None,
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_embed_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Where the persisted vector index lives
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Directory of reference documents (.txt / .md)
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Chunk window, in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Sampling temperature for answer synthesis
    #[serde(default = "default_knowledge_temperature")]
    pub temperature: f32,

    /// Upper bound on the context handed to the generator
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_index_dir() -> PathBuf {
    AppConfig::config_dir().join("index")
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from("data/reference_docs")
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_top_k() -> usize {
    3
}
fn default_knowledge_temperature() -> f32 {
    0.3
}
fn default_max_context_chars() -> usize {
    6000
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            docs_dir: default_docs_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            temperature: default_knowledge_temperature(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Tool calls allowed per session before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Unparseable reasoning outputs tolerated per session
    #[serde(default = "default_max_parse_retries")]
    pub max_parse_retries: usize,

    /// Timeout applied to each external call (LLM completion, embedding batch)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_max_iterations() -> usize {
    10
}
fn default_max_parse_retries() -> usize {
    2
}
fn default_call_timeout_secs() -> u64 {
    60
}

impl AgentConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_parse_retries: default_max_parse_retries(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite URL or file path
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Maximum records returned by the lookup tool
    #[serde(default = "default_lookup_limit")]
    pub lookup_limit: usize,

    /// Rows per committed batch when bulk loading
    #[serde(default = "default_load_batch_size")]
    pub load_batch_size: usize,
}

fn default_database_url() -> String {
    "sqlite://railways.db".into()
}
fn default_max_connections() -> u32 {
    4
}
fn default_lookup_limit() -> usize {
    5
}
fn default_load_batch_size() -> usize {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            lookup_limit: default_lookup_limit(),
            load_batch_size: default_load_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.railsage/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from a path, then apply environment overrides:
    /// - `RAILSAGE_API_KEY`, then `OPENAI_API_KEY` (only if no key in file)
    /// - `RAILSAGE_MODEL`
    /// - `RAILSAGE_DB`
    /// - `RAILSAGE_INDEX_DIR`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("RAILSAGE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(model) = std::env::var("RAILSAGE_MODEL") {
            config.llm.model = model;
        }
        if let Ok(db) = std::env::var("RAILSAGE_DB") {
            config.store.database_url = db;
        }
        if let Ok(dir) = std::env::var("RAILSAGE_INDEX_DIR") {
            config.knowledge.index_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".railsage")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("llm.temperature", self.llm.temperature),
            ("knowledge.temperature", self.knowledge.temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.knowledge.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_size must be > 0".into(),
            ));
        }
        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_overlap must be smaller than knowledge.chunk_size".into(),
            ));
        }
        if self.knowledge.top_k == 0 {
            return Err(ConfigError::ValidationError("knowledge.top_k must be >= 1".into()));
        }
        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions and embedding.batch_size must be >= 1".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be >= 1".into(),
            ));
        }
        if self.agent.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.call_timeout_secs must be > 0".into(),
            ));
        }
        if self.store.max_connections == 0 || self.store.load_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_connections and store.load_batch_size must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            knowledge: KnowledgeConfig::default(),
            agent: AgentConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
