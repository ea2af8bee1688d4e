//! RailSage CLI — the main entry point.
//!
//! Commands:
//! - `init`         — Write the default config file
//! - `serve`        — Start the HTTP API
//! - `ask`          — Answer one question and exit
//! - `build-index`  — Chunk, embed, and persist the reference documents
//! - `seed`         — Install the sample trains
//! - `load`         — Bulk-load stations, schedules, or trains from JSON Lines

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::load::LoadKind;

#[derive(Parser)]
#[command(
    name = "railsage",
    about = "RailSage — railway question answering",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.railsage/config.toml)
    #[arg(short, long, global = true, env = "RAILSAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Ask {
        /// The question
        question: String,

        /// Print the full Thought/Action/Observation trace
        #[arg(long)]
        trace: bool,
    },

    /// Build the vector index from the reference documents
    BuildIndex {
        /// Override the documents directory
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Remove a leftover build lock before building
        #[arg(long)]
        force: bool,
    },

    /// Insert the sample trains into the store
    Seed,

    /// Bulk-load records from a JSON Lines file
    Load {
        /// What the file contains
        #[arg(value_enum)]
        kind: LoadKind,

        /// Path to the .jsonl file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask { question, trace } => commands::ask::run(config_path, &question, trace).await?,
        Commands::BuildIndex { docs, force } => commands::build_index::run(config_path, docs, force).await?,
        Commands::Seed => commands::seed::run(config_path).await?,
        Commands::Load { kind, path } => commands::load::run(config_path, kind, &path).await?,
    }

    Ok(())
}
