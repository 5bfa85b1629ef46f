//! Reading loaded tables back.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::Row;

use super::{Database, Rows, validate_identifier};

impl Database {
    /// Column names of `table`, in declaration order
    ///
    /// Fails with [`DatabaseError::QueryFailed`] when the table does not exist.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        validate_identifier(table)?;

        let rows = sqlx::query(&format!("PRAGMA table_info(\"{}\")", table))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        if rows.is_empty() {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "no such table: {}",
                table
            ))));
        }

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Error::Sqlx))
            .collect()
    }

    /// Select rows from `table`
    ///
    /// `columns` restricts and orders the returned columns; an empty slice selects all of
    /// them. With `username` set, only rows whose `username` column matches are returned.
    /// Rows come back in insertion order.
    pub async fn fetch_rows(
        &self,
        table: &str,
        username: Option<&str>,
        columns: &[&str],
    ) -> Result<Rows> {
        let available = self.table_columns(table).await?;

        if username.is_some() && !available.iter().any(|c| c == "username") {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "table {} has no username column",
                table
            ))));
        }

        let selected: Vec<String> = if columns.is_empty() {
            available
        } else {
            let mut selected = Vec::with_capacity(columns.len());
            for &column in columns {
                validate_identifier(column)?;
                if !available.iter().any(|c| c == column) {
                    return Err(Error::Database(DatabaseError::QueryFailed(format!(
                        "no such column: {}.{}",
                        table, column
                    ))));
                }
                selected.push(column.to_string());
            }
            selected
        };

        let select_list = selected
            .iter()
            .map(|c| format!("CAST(\"{0}\" AS TEXT) AS \"{0}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM \"{}\"", select_list, table);
        if username.is_some() {
            sql.push_str(" WHERE \"username\" = ?");
        }
        sql.push_str(" ORDER BY rowid");

        let mut query = sqlx::query(&sql);
        if let Some(name) = username {
            query = query.bind(name);
        }
        let fetched = query.fetch_all(&self.pool).await.map_err(Error::Sqlx)?;

        let rows = fetched
            .iter()
            .map(|row| {
                (0..selected.len())
                    .map(|i| row.try_get::<Option<String>, _>(i).map_err(Error::Sqlx))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Rows {
            columns: selected,
            rows,
        })
    }
}
