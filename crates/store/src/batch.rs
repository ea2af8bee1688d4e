//! Bulk loading in fixed-size committed batches.
//!
//! Each batch runs in its own transaction. The first batch that fails aborts
//! the load; batches committed before it stay committed.

use crate::models::{Schedule, Station, Train};
use railsage_core::error::StoreError;
use serde::de::DeserializeOwned;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};
use tracing::{info, warn};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A record type the loader knows how to insert.
pub trait BatchRecord: Send + Sync {
    /// Parameterized insert statement.
    const INSERT: &'static str;

    /// Bind this record's fields to [`Self::INSERT`].
    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

impl BatchRecord for Train {
    const INSERT: &'static str = "INSERT INTO trains \
        (train_number, train_name, source_station_name, destination_station_name) \
        VALUES (?, ?, ?, ?)";

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.train_number)
            .bind(&self.train_name)
            .bind(&self.source_station_name)
            .bind(&self.destination_station_name)
    }
}

impl BatchRecord for Station {
    const INSERT: &'static str = "INSERT INTO stations \
        (code, name, state, zone, latitude, longitude) VALUES (?, ?, ?, ?, ?, ?)";

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.code)
            .bind(&self.name)
            .bind(&self.state)
            .bind(&self.zone)
            .bind(self.latitude)
            .bind(self.longitude)
    }
}

impl BatchRecord for Schedule {
    const INSERT: &'static str = "INSERT INTO train_schedules \
        (train_no, station_code, station_name, sequence, arrival_time, departure_time, \
         distance, source_station, destination_station) \
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.train_no)
            .bind(&self.station_code)
            .bind(&self.station_name)
            .bind(self.sequence)
            .bind(&self.arrival_time)
            .bind(&self.departure_time)
            .bind(self.distance)
            .bind(&self.source_station)
            .bind(&self.destination_station)
    }
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub batches_committed: usize,
    pub rows_committed: usize,
    /// Zero-based index of the batch that aborted the load
    pub failed_batch: Option<usize>,
    pub failure: Option<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Turn a failed load into a `StoreError::Load`.
    pub fn into_result(self) -> Result<Self, StoreError> {
        if let (Some(batch), Some(reason)) = (self.failed_batch, self.failure.as_ref()) {
            return Err(StoreError::Load {
                batch,
                committed_rows: self.rows_committed,
                reason: reason.clone(),
            });
        }
        Ok(self)
    }
}

/// Inserts records in batches of `batch_size`, one transaction per batch.
#[derive(Debug, Clone)]
pub struct BatchLoader {
    pool: SqlitePool,
    batch_size: usize,
}

impl BatchLoader {
    pub const DEFAULT_BATCH_SIZE: usize = 5000;

    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Load `records`. Never returns `Err`: a failing batch is recorded in
    /// the report and stops the load.
    pub async fn load<R: BatchRecord>(&self, records: &[R]) -> LoadReport {
        let mut report = LoadReport::default();
        let total_batches = records.len().div_ceil(self.batch_size);

        for (batch_no, batch) in records.chunks(self.batch_size).enumerate() {
            match self.load_batch(batch).await {
                Ok(()) => {
                    report.batches_committed += 1;
                    report.rows_committed += batch.len();
                    info!(
                        batch = batch_no + 1,
                        total = total_batches,
                        rows = report.rows_committed,
                        "Committed batch"
                    );
                }
                Err(e) => {
                    warn!(
                        batch = batch_no + 1,
                        total = total_batches,
                        committed_rows = report.rows_committed,
                        error = %e,
                        "Batch failed, aborting load"
                    );
                    report.failed_batch = Some(batch_no);
                    report.failure = Some(e.to_string());
                    break;
                }
            }
        }

        report
    }

    async fn load_batch<R: BatchRecord>(&self, batch: &[R]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        for record in batch {
            record
                .bind(sqlx::query(R::INSERT))
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        // Dropping `tx` on the error path rolls the batch back.
        tx.commit()
            .await
            .map_err(|e| StoreError::Query(format!("commit: {e}")))
    }
}

/// Parse JSON Lines. Blank lines are skipped; errors carry the 1-based line.
pub fn parse_jsonl<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, StoreError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| StoreError::Input {
                line: i + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}
