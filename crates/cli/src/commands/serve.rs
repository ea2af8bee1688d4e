//! `railsage serve` — start the HTTP API server.

use super::load_config;
use std::path::Path;

pub async fn run(path: Option<&Path>, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("RailSage API");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.llm.model);

    railsage_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("Gateway failed: {e}"))?;

    Ok(())
}
