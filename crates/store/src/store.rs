//! SQLite-backed train store.
//!
//! Tables:
//! - `trains`: one row per train with its end stations (queried by the
//!   lookup tool)
//! - `stations`: station master data keyed by code
//! - `train_schedules`: timetable stops, `station_code → stations.code`

use crate::models::{LookupTerms, Train, sample_trains};
use railsage_core::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Pooled access to the structured railway store.
///
/// Cloning is cheap; clones share the pool. Each query checks out its own
/// connection.
#[derive(Debug, Clone)]
pub struct TrainStore {
    pool: SqlitePool,
}

impl TrainStore {
    /// Open (creating if missing) the database at `url` and run migrations.
    ///
    /// Accepts `sqlite://path`, a plain file path, or `sqlite::memory:`.
    /// An in-memory database is private to each connection, so it is opened
    /// with a single connection.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(format!("Invalid SQLite URL '{url}': {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let max_connections = if url.contains(":memory:") {
            1
        } else {
            max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool).await?;
        info!(url, max_connections, "Train store ready");
        Ok(store)
    }

    /// Wrap an existing pool and run migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements: [(&str, &str); 4] = [
            (
                "trains table",
                r#"
                CREATE TABLE IF NOT EXISTS trains (
                    train_number             TEXT PRIMARY KEY,
                    train_name               TEXT NOT NULL,
                    source_station_name      TEXT NOT NULL,
                    destination_station_name TEXT NOT NULL
                )
                "#,
            ),
            (
                "stations table",
                r#"
                CREATE TABLE IF NOT EXISTS stations (
                    code      TEXT PRIMARY KEY,
                    name      TEXT NOT NULL,
                    state     TEXT,
                    zone      TEXT,
                    latitude  REAL,
                    longitude REAL
                )
                "#,
            ),
            (
                "train_schedules table",
                r#"
                CREATE TABLE IF NOT EXISTS train_schedules (
                    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                    train_no            TEXT NOT NULL,
                    station_code        TEXT NOT NULL REFERENCES stations(code),
                    station_name        TEXT,
                    sequence            INTEGER,
                    arrival_time        TEXT,
                    departure_time      TEXT,
                    distance            REAL,
                    source_station      TEXT,
                    destination_station TEXT
                )
                "#,
            ),
            (
                "train_no index",
                "CREATE INDEX IF NOT EXISTS idx_train_schedules_train_no ON train_schedules(train_no)",
            ),
        ];

        for (what, sql) in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Migration(format!("{what}: {e}")))?;
        }

        debug!("Train store migrations complete");
        Ok(())
    }

    /// Insert or replace a single train.
    pub async fn upsert_train(&self, train: &Train) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO trains \
             (train_number, train_name, source_station_name, destination_station_name) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&train.train_number)
        .bind(&train.train_name)
        .bind(&train.source_station_name)
        .bind(&train.destination_station_name)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(format!("insert train {}: {e}", train.train_number)))?;
        Ok(())
    }

    /// Install the sample trains. Idempotent; returns how many rows were new.
    pub async fn seed_sample_trains(&self) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let mut inserted = 0;
        for train in sample_trains() {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO trains \
                 (train_number, train_name, source_station_name, destination_station_name) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&train.train_number)
            .bind(&train.train_name)
            .bind(&train.source_station_name)
            .bind(&train.destination_station_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(format!("seed {}: {e}", train.train_number)))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(format!("seed commit: {e}")))?;

        info!(inserted, "Seeded sample trains");
        Ok(inserted)
    }

    /// Find trains matching any of `terms`, best matches first.
    ///
    /// A train's hit count is the number of terms it matches; trains with no
    /// hits are excluded. Ordered by hits (descending) then train number.
    /// Runs as one parameterized statement. Station matching ignores ASCII
    /// case only; see [`escape_like`].
    pub async fn search(&self, terms: &LookupTerms, limit: usize) -> Result<Vec<Train>, StoreError> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut qb = build_search_query(terms, limit);
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let trains = rows.iter().map(row_to_train).collect::<Result<Vec<_>, _>>()?;
        debug!(
            stations = ?terms.stations,
            train_numbers = ?terms.train_numbers,
            matches = trains.len(),
            "Train search"
        );
        Ok(trains)
    }

    /// Look up one train by number.
    pub async fn find(&self, train_number: &str) -> Result<Option<Train>, StoreError> {
        let row = sqlx::query(
            "SELECT train_number, train_name, source_station_name, destination_station_name \
             FROM trains WHERE train_number = ?",
        )
        .bind(train_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.as_ref().map(row_to_train).transpose()
    }

    /// Row count of a store table.
    pub async fn count(&self, table: StoreTable) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

/// The tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTable {
    Trains,
    Stations,
    Schedules,
}

impl StoreTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trains => "trains",
            Self::Stations => "stations",
            Self::Schedules => "train_schedules",
        }
    }
}

fn build_search_query(terms: &LookupTerms, limit: usize) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT train_number, train_name, source_station_name, destination_station_name \
         FROM (SELECT *, (0",
    );

    for station in &terms.stations {
        let pattern = format!("%{}%", escape_like(station));
        qb.push(" + (CASE WHEN source_station_name LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR destination_station_name LIKE ");
        qb.push_bind(pattern);
        qb.push(" ESCAPE '\\' THEN 1 ELSE 0 END)");
    }

    for number in &terms.train_numbers {
        qb.push(" + (CASE WHEN train_number = ");
        qb.push_bind(number.clone());
        qb.push(" THEN 1 ELSE 0 END)");
    }

    qb.push(") AS hits FROM trains) WHERE hits > 0 ORDER BY hits DESC, train_number ASC LIMIT ");
    qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    qb
}

/// Escape `LIKE` wildcards so user text matches literally.
///
/// SQLite's `LIKE` folds case for ASCII letters only (as does its built-in
/// `lower()`), so station terms are lowercased before they get here and a
/// non-ASCII letter must match the stored name's case exactly.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn row_to_train(row: &SqliteRow) -> Result<Train, StoreError> {
    let get = |col: &str| -> Result<String, StoreError> {
        row.try_get(col)
            .map_err(|e| StoreError::Query(format!("{col} column: {e}")))
    };
    Ok(Train {
        train_number: get("train_number")?,
        train_name: get("train_name")?,
        source_station_name: get("source_station_name")?,
        destination_station_name: get("destination_station_name")?,
    })
}
