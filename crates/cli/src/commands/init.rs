//! `railsage init` — write the default configuration file.

use super::config_file;
use railsage_config::AppConfig;
use std::path::Path;

pub async fn run(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let config_path = config_file(path);

    if config_path.exists() && !force {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or re-run with --force.");
        return Ok(());
    }

    if let Some(dir) = config_path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&config_path, AppConfig::default_toml()).await?;

    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set RAILSAGE_API_KEY (or api_key in the file)");
    println!("  2. railsage seed");
    println!("  3. railsage build-index");
    println!("  4. railsage ask \"What is the refund policy for tatkal tickets?\"");

    Ok(())
}
