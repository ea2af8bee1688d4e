//! `railsage seed` — insert the sample trains.

use super::load_config;
use railsage_store::{StoreTable, TrainStore};
use std::path::Path;

pub async fn run(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let store = TrainStore::connect(&config.store.database_url, config.store.max_connections).await?;

    let inserted = store.seed_sample_trains().await?;
    let total = store.count(StoreTable::Trains).await?;

    println!("Inserted {inserted} sample train(s); {total} train(s) in {}", config.store.database_url);
    Ok(())
}
