//! # cp-stats
//!
//! Resumable batch collector for competitive-programming profile statistics.
//!
//! A run reads a list of usernames, takes a window of it (`start_offset`, `count`), and for
//! each username queries a stats API for solved-problem counts per difficulty and per
//! language. Results are appended to two CSV tables and flushed after every user, so a run
//! that is interrupted can be resumed by starting a new one at a later offset.
//!
//! Transient API failures are retried with exponential backoff; a user whose data cannot be
//! fetched still gets an all-zero record rather than stopping the run.
//!
//! The collected tables can then be loaded into SQLite, aggregated per language and per
//! country, and reduced to the series the charts are drawn from.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cp_stats::{ApiClient, Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.batch.start_offset = 500;
//!     config.batch.count = Some(100);
//!
//!     let client = ApiClient::new(config.api.clone(), config.retry.clone())?;
//!     let summary = Pipeline::new(config, client).run().await;
//!
//!     println!("{}: {} processed, {} failed", summary.state, summary.processed, summary.failed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch window selection
pub mod batch;
/// HTTP client for the stats API
pub mod client;
/// Configuration types
pub mod config;
/// SQLite loader and aggregate queries
pub mod db;
/// Error types
pub mod error;
/// Record extraction from API payloads
pub mod extract;
/// Username list input
pub mod input;
/// Fetch-and-append orchestration
pub mod pipeline;
/// Chart series
pub mod report;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// Incremental CSV output
pub mod writer;

pub use batch::{Selection, select_batch};
pub use client::{ApiClient, StatsSource};
pub use config::Config;
pub use db::Database;
pub use error::{DatabaseError, Error, FetchError, Result};
pub use pipeline::Pipeline;
pub use types::{FetchResult, LanguageRecord, RunState, RunSummary, SolvedRecord};
pub use writer::StatsWriter;
