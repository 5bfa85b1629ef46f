//! Error types for cp-stats
//!
//! Three layers of failure are modelled separately:
//! - [`Error`] for anything that can stop a command (bad configuration, unreadable input,
//!   database failures) or abort a single work item inside the pipeline
//! - [`FetchError`] for one failed attempt against the stats API; these never leave the
//!   retry driver and degrade to [`FetchResult::Absent`](crate::types::FetchResult::Absent)
//! - [`DatabaseError`] for the SQLite loader and aggregate queries

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cp-stats operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cp-stats
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retry.max_attempts")
        key: Option<String>,
    },

    /// The input list of usernames does not exist
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A CSV file lacks a column the command depends on
    #[error("{} has no '{column}' column", path.display())]
    MissingColumn {
        /// The CSV file that was read
        path: PathBuf,
        /// The column that was expected in its header
        column: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network error outside the retry policy
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A username could not be turned into a request URL
    #[error("invalid request URL for '{user}': {reason}")]
    InvalidUrl {
        /// The username being processed
        user: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// Configuration file could not be parsed
    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Table or column name that cannot be used in SQL
    #[error("invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// A single failed request against the stats API
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or any other transport problem
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("{url} returned status {status}")]
    Status {
        /// The requested URL
        url: String,
        /// HTTP status code returned
        status: u16,
    },

    /// A 2xx response whose body is not valid JSON
    #[error("could not decode body from {url}: {message}")]
    Decode {
        /// The requested URL
        url: String,
        /// Decoder message
        message: String,
    },
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Loading a CSV file into a table failed
    #[error("failed to load {} into {table}: {reason}", path.display())]
    LoadFailed {
        /// The CSV file being loaded
        path: PathBuf,
        /// Destination table
        table: String,
        /// What went wrong
        reason: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_keeps_key() {
        let err = Error::config("retry.max_attempts", "must be at least 1");
        match &err {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("retry.max_attempts"));
                assert_eq!(message, "must be at least 1");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.to_string(), "configuration error: must be at least 1");
    }

    #[test]
    fn input_not_found_displays_path() {
        let err = Error::InputNotFound(PathBuf::from("data/users.csv"));
        assert_eq!(err.to_string(), "input file not found: data/users.csv");
    }

    #[test]
    fn status_error_mentions_url_and_code() {
        let err = FetchError::Status {
            url: "http://localhost:3000/alice/solved".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "http://localhost:3000/alice/solved returned status 503"
        );
    }

    #[test]
    fn database_error_converts_into_error() {
        let err: Error = DatabaseError::QueryFailed("no such table: users".to_string()).into();
        assert!(matches!(err, Error::Database(DatabaseError::QueryFailed(_))));
        assert_eq!(
            err.to_string(),
            "database error: query failed: no such table: users"
        );
    }
}
