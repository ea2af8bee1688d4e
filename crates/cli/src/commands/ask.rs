//! `railsage ask` — answer one question and exit.

use super::load_config;
use anyhow::Context;
use railsage_agent::SessionOutcome;
use railsage_gateway::AgentRuntime;
use std::path::Path;

pub async fn run(path: Option<&Path>, question: &str, trace: bool) -> anyhow::Result<()> {
    let config = load_config(path)?;

    if !config.has_api_key() && config.llm.provider == "openai" {
        anyhow::bail!(
            "No API key configured. Set RAILSAGE_API_KEY or OPENAI_API_KEY, or add api_key to {}",
            super::config_file(path).display()
        );
    }

    let agent = AgentRuntime::init(&config).await.context("Failed to start the agent")?;

    let outcome = agent.run(question).await?;
    if trace {
        print_trace(&outcome);
    }
    println!("{}", outcome.final_answer);

    Ok(())
}

fn print_trace(outcome: &SessionOutcome) {
    eprintln!("session {}", outcome.session_id);
    for (i, entry) in outcome.scratchpad.iter().enumerate() {
        eprintln!("── Step {} ──", i + 1);
        if !entry.thought.is_empty() {
            eprintln!("Thought: {}", entry.thought);
        }
        eprintln!("Action: {}", entry.action);
        eprintln!("Action Input: {}", entry.action_input);
        eprintln!("Observation: {}", entry.observation);
    }
    eprintln!();
}
