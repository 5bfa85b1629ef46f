//! Database layer for cp-stats
//!
//! Loads the CSV tables produced by the fetch pipeline (and the scraped user list) into
//! SQLite and runs the aggregate queries the reports are built from.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by concern:
//! - [`connection`]: opening and closing the database
//! - [`load`]: replacing a table with the contents of a CSV file
//! - [`query`]: reading rows back, optionally filtered by username
//! - [`aggregate`]: language popularity and per-country averages

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, sqlite::SqlitePool};

pub mod aggregate;
mod connection;
mod load;
mod query;

pub use aggregate::{AGGREGATE_FILES, write_aggregates};
pub use load::infer_column_type;

/// SQLite affinity chosen for a loaded CSV column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Every non-empty value parses as a 64-bit integer
    Integer,
    /// Every non-empty value parses as a float
    Real,
    /// Anything else
    Text,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Result of a [`Database::fetch_rows`] query
///
/// Values are rendered as text; SQL NULL is `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rows {
    /// Column names, in select order
    pub columns: Vec<String>,
    /// One entry per row, aligned with `columns`
    pub rows: Vec<Vec<Option<String>>>,
}

impl Rows {
    /// Number of rows returned
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Number of distinct users per language
#[derive(Clone, Debug, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PopularLanguage {
    /// Language name
    pub languagename: String,
    /// Distinct users with at least one row for the language
    pub user_count: i64,
}

/// Number of distinct users per (country, language)
#[derive(Clone, Debug, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CountryLanguage {
    /// Country from the users table (None when missing)
    pub country: Option<String>,
    /// Language name
    pub languagename: String,
    /// Distinct users in that country using the language
    pub user_count: i64,
}

/// Average attempted and accepted problem counts per country
#[derive(Clone, Debug, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CountryAverage {
    /// Country from the users table (None when missing)
    pub country: Option<String>,
    /// Mean of `easy + medium + hard`
    pub avg_solved: f64,
    /// Mean of `ac_easy + ac_medium + ac_hard`
    pub avg_ac: f64,
}

/// Database handle for cp-stats
pub struct Database {
    pool: SqlitePool,
}

/// Check that `name` can be spliced into SQL as a table or column name
pub fn validate_identifier(name: &str) -> crate::Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(crate::Error::InvalidIdentifier(name.to_string()))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
