//! Batch fetch-and-append pipeline
//!
//! [`Pipeline::run`] drives one run from start to finish:
//!
//! ```text
//! NotStarted -> Initializing -> Running -> Finished
//!                    |
//!                    +-> Aborted   (input missing/unreadable, batch empty or out of range)
//! ```
//!
//! Users are processed strictly one after another: fetch solved counts, fetch language
//! counts, extract rows, append them, sleep the throttle interval. A failure while handling
//! one user is logged and that user contributes no rows; the loop moves on to the next one.

use crate::batch::{Selection, select_batch};
use crate::client::StatsSource;
use crate::config::Config;
use crate::error::Result;
use crate::extract::{extract_languages, extract_solved};
use crate::input::read_usernames;
use crate::types::{RunState, RunSummary};
use crate::writer::StatsWriter;
use std::time::Instant;

/// One configured fetch run
pub struct Pipeline<S> {
    config: Config,
    source: S,
    state: RunState,
}

impl<S: StatsSource> Pipeline<S> {
    /// Create a pipeline over `source` with the given configuration
    pub fn new(config: Config, source: S) -> Self {
        Self {
            config,
            source,
            state: RunState::NotStarted,
        }
    }

    /// Current state of the run
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the configured batch to completion
    ///
    /// Never fails: configuration problems end the run in [`RunState::Aborted`], and every
    /// other error is logged and reflected in the returned counts.
    pub async fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::new();
        self.state = RunState::Initializing;

        self.wait_start_delay().await;
        let started = Instant::now();

        let usernames = match read_usernames(&self.config.paths.input) {
            Ok(usernames) => usernames,
            Err(e) => {
                tracing::error!(
                    input = %self.config.paths.input.display(),
                    error = %e,
                    "cannot read username list"
                );
                return self.finish(summary, RunState::Aborted, started);
            }
        };
        summary.total_items = usernames.len();

        let start_offset = self.config.batch.start_offset;
        let count = self.config.batch.count;
        let selected = match select_batch(&usernames, start_offset, count) {
            Selection::Items(items) => items,
            Selection::OutOfRange { total, .. } => {
                tracing::error!(
                    start_offset,
                    total,
                    "start offset is beyond the end of the username list"
                );
                return self.finish(summary, RunState::Aborted, started);
            }
            Selection::Empty => {
                tracing::warn!(
                    start_offset,
                    count = ?count,
                    "no users to process for this window"
                );
                return self.finish(summary, RunState::Aborted, started);
            }
        };
        summary.selected = selected.len();

        tracing::info!(
            total = summary.total_items,
            start_offset,
            selected = summary.selected,
            "starting batch"
        );

        self.state = RunState::Running;

        let mut writer = match StatsWriter::open(
            &self.config.paths.language_stats,
            &self.config.paths.solved_stats,
        ) {
            Ok(writer) => writer,
            Err(e) => {
                tracing::error!(error = %e, "cannot open output tables");
                return self.finish(summary, RunState::Finished, started);
            }
        };

        for username in selected {
            if username.is_empty() {
                summary.skipped_blank += 1;
                continue;
            }

            match self.process_user(username, &mut writer).await {
                Ok(rows) => {
                    summary.processed += 1;
                    tracing::info!(
                        user = %username,
                        rows,
                        processed = summary.processed,
                        "wrote user stats"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(user = %username, error = %e, "failed to process user");
                }
            }

            if !self.config.batch.throttle.is_zero() {
                tokio::time::sleep(self.config.batch.throttle).await;
            }
        }

        drop(writer);
        self.finish(summary, RunState::Finished, started)
    }

    /// Fetch, extract and append one user's rows; returns the number of rows written
    async fn process_user(&self, username: &str, writer: &mut StatsWriter) -> Result<usize> {
        tracing::debug!(user = %username, "processing user");

        let solved = self.source.solved(username).await?;
        let languages = self.source.language_stats(username).await?;

        if solved.is_absent() && languages.is_absent() {
            tracing::warn!(user = %username, "no data obtained, writing default row");
        }

        let solved_record = extract_solved(username, &solved);
        let language_records = extract_languages(username, &languages);

        writer.write_user(&solved_record, &language_records)?;
        Ok(language_records.len() + 1)
    }

    async fn wait_start_delay(&self) {
        let delay = self.config.batch.start_delay;
        if delay.is_zero() {
            return;
        }

        let resume_at = chrono::Local::now()
            + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
        tracing::info!(
            delay_secs = delay.as_secs_f64(),
            starts_at = %resume_at.format("%Y-%m-%d %H:%M:%S"),
            "delaying start"
        );
        tokio::time::sleep(delay).await;
        tracing::info!("start delay complete");
    }

    fn finish(&mut self, mut summary: RunSummary, state: RunState, started: Instant) -> RunSummary {
        self.state = state;
        summary.state = state;
        summary.elapsed = started.elapsed();

        tracing::info!(
            state = %state,
            processed = summary.processed,
            failed = summary.failed,
            skipped_blank = summary.skipped_blank,
            elapsed_ms = summary.elapsed.as_millis(),
            "run finished"
        );
        summary
    }
}
