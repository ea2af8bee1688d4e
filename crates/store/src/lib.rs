//! Structured railway store for RailSage.
//!
//! SQLite via `sqlx`: a pooled [`TrainStore`] serving parameterized lookups,
//! and a [`BatchLoader`] for bulk station / schedule / train imports.

pub mod batch;
pub mod models;
pub mod store;

pub use batch::{BatchLoader, BatchRecord, LoadReport, parse_jsonl};
pub use models::{LookupTerms, Schedule, Station, Train, sample_trains};
pub use store::{StoreTable, TrainStore};
