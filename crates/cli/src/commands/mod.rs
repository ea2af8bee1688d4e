pub mod ask;
pub mod build_index;
pub mod init;
pub mod load;
pub mod seed;
pub mod serve;

use anyhow::Context;
use railsage_config::AppConfig;
use std::path::{Path, PathBuf};

/// The config file path: `--config` if given, else the default location.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load and validate configuration, with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let file = config_file(path);
    let config = AppConfig::load_with_env(&file)
        .with_context(|| format!("Failed to load config from {}", file.display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
