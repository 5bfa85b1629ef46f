//! Core types for cp-stats

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one stats API query
///
/// `Absent` means no data could be obtained (all attempts failed). It is distinct from a
/// payload that is present but empty, which extractors treat as "all counts are zero".
#[derive(Clone, Debug, PartialEq)]
pub enum FetchResult {
    /// Decoded JSON body of a successful response
    Payload(serde_json::Value),
    /// Every attempt failed
    Absent,
}

impl FetchResult {
    /// The payload, if one was obtained
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            FetchResult::Payload(value) => Some(value),
            FetchResult::Absent => None,
        }
    }

    /// Whether no data was obtained
    pub fn is_absent(&self) -> bool {
        matches!(self, FetchResult::Absent)
    }
}

/// Problem difficulty levels reported by the API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Difficulty {
    /// Easy problems
    Easy,
    /// Medium problems
    Medium,
    /// Hard problems
    Hard,
}

impl Difficulty {
    /// All difficulties, in table column order
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Label used by the API's `difficulty` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the solved-stats table
///
/// `easy`/`medium`/`hard` come from the attempted collection, `ac_*` from the accepted one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedRecord {
    /// Username the counts belong to
    pub username: String,
    /// Easy problems attempted
    pub easy: i64,
    /// Medium problems attempted
    pub medium: i64,
    /// Hard problems attempted
    pub hard: i64,
    /// Easy problems accepted
    pub ac_easy: i64,
    /// Medium problems accepted
    pub ac_medium: i64,
    /// Hard problems accepted
    pub ac_hard: i64,
}

impl SolvedRecord {
    /// Column names, in write order
    pub const HEADERS: [&'static str; 7] = [
        "username",
        "easy",
        "medium",
        "hard",
        "ac_easy",
        "ac_medium",
        "ac_hard",
    ];

    /// All-zero record for a user whose data could not be fetched
    pub fn zeroed(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Default::default()
        }
    }

    /// Problems attempted over all difficulties, saturating at `i64::MAX`
    pub fn total_attempted(&self) -> i64 {
        self.easy.saturating_add(self.medium).saturating_add(self.hard)
    }

    /// Problems accepted over all difficulties, saturating at `i64::MAX`
    pub fn total_accepted(&self) -> i64 {
        self.ac_easy
            .saturating_add(self.ac_medium)
            .saturating_add(self.ac_hard)
    }
}

/// One row of the language-stats table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    /// Username the count belongs to
    pub username: String,
    /// Programming language name
    #[serde(rename = "languageName")]
    pub language_name: String,
    /// Problems solved in that language
    #[serde(rename = "problemsSolved")]
    pub problems_solved: i64,
}

impl LanguageRecord {
    /// Column names, in write order
    pub const HEADERS: [&'static str; 3] = ["username", "languageName", "problemsSolved"];
}

/// Lifecycle of one pipeline run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, `run` not yet called
    NotStarted,
    /// Waiting out the start delay, reading input, selecting the batch
    Initializing,
    /// Processing usernames
    Running,
    /// The batch loop completed (possibly with per-item failures)
    Finished,
    /// Stopped during initialization: missing input or an empty batch
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::NotStarted => "not started",
            RunState::Initializing => "initializing",
            RunState::Running => "running",
            RunState::Finished => "finished",
            RunState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// What a pipeline run did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Final state of the run
    pub state: RunState,
    /// Usernames in the input list
    pub total_items: usize,
    /// Usernames in the selected batch
    pub selected: usize,
    /// Usernames whose records were written (includes all-default records)
    pub processed: usize,
    /// Usernames that failed and contributed no records
    pub failed: usize,
    /// Blank usernames that were skipped
    pub skipped_blank: usize,
    /// Wall-clock time spent, excluding the start delay
    pub elapsed: Duration,
}

impl RunSummary {
    pub(crate) fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            total_items: 0,
            selected: 0,
            processed: 0,
            failed: 0,
            skipped_blank: 0,
            elapsed: Duration::ZERO,
        }
    }
}
