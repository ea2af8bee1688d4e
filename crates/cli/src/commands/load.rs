//! `railsage load` — bulk-load JSON Lines into the store.

use super::load_config;
use anyhow::Context;
use railsage_store::{
    BatchLoader, BatchRecord, LoadReport, Schedule, Station, Train, TrainStore, parse_jsonl,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::warn;

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum LoadKind {
    Stations,
    Schedules,
    Trains,
}

pub async fn run(path: Option<&Path>, kind: LoadKind, file: &Path) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let store = TrainStore::connect(&config.store.database_url, config.store.max_connections).await?;
    let loader = BatchLoader::new(store.pool().clone()).with_batch_size(config.store.load_batch_size);

    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let report = match kind {
        LoadKind::Stations => load_as::<Station>(&loader, &text).await?,
        LoadKind::Schedules => load_as::<Schedule>(&loader, &text).await?,
        LoadKind::Trains => load_as::<Train>(&loader, &text).await?,
    };

    println!(
        "Committed {} row(s) in {} batch(es) of up to {}",
        report.rows_committed,
        report.batches_committed,
        loader.batch_size()
    );
    if !report.is_complete() {
        warn!(failed_batch = ?report.failed_batch, "Load stopped early; earlier batches were kept");
    }
    report.into_result()?;
    Ok(())
}

async fn load_as<R: BatchRecord + DeserializeOwned>(
    loader: &BatchLoader,
    text: &str,
) -> anyhow::Result<LoadReport> {
    let records: Vec<R> = parse_jsonl(text)?;
    Ok(loader.load(&records).await)
}
