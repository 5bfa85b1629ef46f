//! Aggregate queries over the loaded `language_stats`, `solved_stats` and `users` tables.

use crate::writer::write_csv_table;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

use super::{CountryAverage, CountryLanguage, Database, PopularLanguage};

/// Output file names of [`write_aggregates`], in the order they are written
pub const AGGREGATE_FILES: [&str; 3] = [
    "popular_languages.csv",
    "languages_by_country.csv",
    "avg_solved_by_country.csv",
];

impl Database {
    /// Languages by number of distinct users, most popular first
    pub async fn popular_languages(&self) -> Result<Vec<PopularLanguage>> {
        sqlx::query_as::<_, PopularLanguage>(
            r#"
            SELECT CAST(languageName AS TEXT) AS languagename,
                   COUNT(DISTINCT username) AS user_count
            FROM language_stats
            WHERE languageName IS NOT NULL
            GROUP BY languageName
            ORDER BY user_count DESC, languagename ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }

    /// Distinct users per (country, language), grouped by country
    pub async fn languages_by_country(&self) -> Result<Vec<CountryLanguage>> {
        sqlx::query_as::<_, CountryLanguage>(
            r#"
            SELECT CAST(u.country AS TEXT) AS country,
                   CAST(l.languageName AS TEXT) AS languagename,
                   COUNT(DISTINCT l.username) AS user_count
            FROM language_stats l
            JOIN users u ON l.username = u.username
            WHERE l.languageName IS NOT NULL
            GROUP BY u.country, l.languageName
            ORDER BY country ASC, user_count DESC, languagename ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }

    /// Mean attempted and accepted totals per country, highest attempted first
    ///
    /// Missing counts are treated as 0.
    pub async fn avg_solved_by_country(&self) -> Result<Vec<CountryAverage>> {
        sqlx::query_as::<_, CountryAverage>(
            r#"
            SELECT CAST(u.country AS TEXT) AS country,
                   AVG(COALESCE(CAST(s.easy AS INTEGER), 0)
                     + COALESCE(CAST(s.medium AS INTEGER), 0)
                     + COALESCE(CAST(s.hard AS INTEGER), 0)) * 1.0 AS avg_solved,
                   AVG(COALESCE(CAST(s.ac_easy AS INTEGER), 0)
                     + COALESCE(CAST(s.ac_medium AS INTEGER), 0)
                     + COALESCE(CAST(s.ac_hard AS INTEGER), 0)) * 1.0 AS avg_ac
            FROM solved_stats s
            JOIN users u ON s.username = u.username
            GROUP BY u.country
            ORDER BY avg_solved DESC, country ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }
}

/// Run all three aggregate queries and write each to its CSV under `out_dir`
///
/// Returns the written paths in [`AGGREGATE_FILES`] order.
pub async fn write_aggregates(db: &Database, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = AGGREGATE_FILES.iter().map(|f| out_dir.join(f)).collect();

    let popular = db.popular_languages().await?;
    write_csv_table(&paths[0], &["languagename", "user_count"], &popular)?;

    let by_country = db.languages_by_country().await?;
    write_csv_table(
        &paths[1],
        &["country", "languagename", "user_count"],
        &by_country,
    )?;

    let averages = db.avg_solved_by_country().await?;
    write_csv_table(&paths[2], &["country", "avg_solved", "avg_ac"], &averages)?;

    tracing::info!(
        out_dir = %out_dir.display(),
        languages = popular.len(),
        country_languages = by_country.len(),
        countries = averages.len(),
        "wrote aggregate tables"
    );
    Ok(paths)
}
