//! Wires configuration into a ready-to-serve agent.

use railsage_agent::ReactAgent;
use railsage_config::AppConfig;
use railsage_core::Result;
use railsage_knowledge::VectorIndex;
use railsage_providers::{build_embedder, build_from_config};
use railsage_store::TrainStore;
use railsage_tools::{RailwayRulesTool, TrainScheduleTool, railway_registry};
use std::sync::Arc;
use tracing::info;

/// Startup wiring shared by the HTTP server and the one-shot CLI.
pub struct AgentRuntime;

impl AgentRuntime {
    /// Open the store, load the index, register the tools, and build the
    /// agent.
    ///
    /// Fails if the index is missing or was built with a different embedder
    /// than the one configured. Nothing is rebuilt here.
    pub async fn init(config: &AppConfig) -> Result<Arc<ReactAgent>> {
        let provider = build_from_config(config);
        let embedder = build_embedder(config);

        let index = VectorIndex::load(&config.knowledge.index_dir, embedder.identity())?;
        info!(
            chunks = index.len(),
            embedder = %index.identity(),
            dir = %config.knowledge.index_dir.display(),
            "Loaded reference-document index"
        );

        let store = TrainStore::connect(&config.store.database_url, config.store.max_connections).await?;

        let schedule = TrainScheduleTool::new(store).with_limit(config.store.lookup_limit);
        let rules = RailwayRulesTool::new(Arc::new(index), embedder, provider.clone(), &config.llm.model)?
            .with_top_k(config.knowledge.top_k)
            .with_temperature(config.knowledge.temperature)
            .with_max_context_chars(config.knowledge.max_context_chars)
            .with_max_tokens(Some(config.llm.max_tokens));

        let tools = Arc::new(railway_registry(schedule, rules)?);
        info!(tools = ?tools.names(), model = %config.llm.model, "Agent ready");

        Ok(Arc::new(ReactAgent::from_config(provider, tools, config)))
    }
}
