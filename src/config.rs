//! Configuration types for cp-stats

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Stats API endpoint settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the stats API (default: "http://localhost:3000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single request attempt (default: 10 seconds)
    #[serde(default = "default_request_timeout", with = "secs_f64_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry behavior for API requests
///
/// The delay before retry `k` (0-based) is `initial_backoff * 2^k`. There is no jitter and
/// no delay after the final attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts per request, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 0.1 seconds)
    #[serde(default = "default_initial_backoff", with = "secs_f64_serde")]
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff: default_initial_backoff(),
        }
    }
}

/// Which slice of the input list a run processes, and how fast
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// 0-based index of the first username to process (default: 0)
    #[serde(default)]
    pub start_offset: usize,

    /// Number of usernames to process (None = through the end of the list)
    #[serde(default)]
    pub count: Option<usize>,

    /// Pause after each processed username (default: 0.1 seconds)
    #[serde(default = "default_throttle", with = "secs_f64_serde")]
    pub throttle: Duration,

    /// Pause before any processing begins (default: none)
    #[serde(default, with = "secs_f64_serde")]
    pub start_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            start_offset: 0,
            count: None,
            throttle: default_throttle(),
            start_delay: Duration::ZERO,
        }
    }
}

/// Input and output file locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    /// CSV file with a `username` column (default: "users.csv")
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Output table of per-language solved counts (default: "language_stats.csv")
    #[serde(default = "default_language_stats")]
    pub language_stats: PathBuf,

    /// Output table of per-difficulty counts (default: "solved_stats.csv")
    #[serde(default = "default_solved_stats")]
    pub solved_stats: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            language_stats: default_language_stats(),
            solved_stats: default_solved_stats(),
        }
    }
}

/// SQLite settings for the loader and aggregate queries
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database path (default: "cp-stats.db")
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Main configuration for cp-stats
///
/// Every field has a default, so an empty TOML file (or no file at all) yields a working
/// configuration. The CLI overrides individual fields after loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Stats API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy for API requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Batch window and pacing
    #[serde(default)]
    pub batch: BatchConfig,

    /// Input and output files
    #[serde(default)]
    pub paths: PathsConfig,

    /// SQLite database
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file
    ///
    /// A missing file is a configuration error naming the path.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the settings that have no meaningful fallback
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::config("api.base_url", "base URL must not be empty"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(100)
}

fn default_throttle() -> Duration {
    Duration::from_millis(100)
}

fn default_input() -> PathBuf {
    PathBuf::from("users.csv")
}

fn default_language_stats() -> PathBuf {
    PathBuf::from("language_stats.csv")
}

fn default_solved_stats() -> PathBuf {
    PathBuf::from("solved_stats.csv")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("cp-stats.db")
}

// Durations are written as (fractional) seconds, e.g. `throttle = 0.1`
mod secs_f64_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
