//! Loading CSV files into tables.

use crate::error::DatabaseError;
use crate::input::open_csv;
use crate::{Error, Result};
use std::path::Path;

use super::{ColumnType, Database, validate_identifier};

impl Database {
    /// Replace `table` with the contents of the CSV file at `csv_path`
    ///
    /// The table gets one column per header field, typed by [`infer_column_type`]. Empty
    /// cells are stored as NULL and rows that repeat the header are skipped. The drop, create
    /// and inserts run in one transaction, so a failed load leaves the previous table in
    /// place. Returns the number of rows inserted.
    pub async fn load_csv(&self, csv_path: &Path, table: &str) -> Result<usize> {
        validate_identifier(table)?;

        let (headers, records) = read_csv(csv_path)?;
        for header in &headers {
            validate_identifier(header)?;
        }
        if headers.is_empty() {
            return Err(Error::Database(DatabaseError::LoadFailed {
                path: csv_path.to_path_buf(),
                table: table.to_string(),
                reason: "file has no header row".to_string(),
            }));
        }

        let types: Vec<ColumnType> = (0..headers.len())
            .map(|i| infer_column_type(records.iter().map(|r| r.get(i).unwrap_or_default())))
            .collect();

        let column_defs = headers
            .iter()
            .zip(&types)
            .map(|(name, ty)| format!("\"{}\" {}", name, ty.sql_name()))
            .collect::<Vec<_>>()
            .join(", ");
        let column_list = headers
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; headers.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table, column_list, placeholders
        );

        let mut tx = self.pool.begin().await.map_err(Error::Sqlx)?;

        sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\"", table))
            .execute(&mut *tx)
            .await
            .map_err(Error::Sqlx)?;
        sqlx::query(&format!("CREATE TABLE \"{}\" ({})", table, column_defs))
            .execute(&mut *tx)
            .await
            .map_err(Error::Sqlx)?;

        for record in &records {
            let mut query = sqlx::query(&insert_sql);
            for (i, ty) in types.iter().enumerate() {
                let raw = record.get(i).unwrap_or_default().trim();
                query = match (raw.is_empty(), ty) {
                    (true, _) => query.bind(None::<String>),
                    (false, ColumnType::Integer) => query.bind(raw.parse::<i64>().ok()),
                    (false, ColumnType::Real) => query.bind(raw.parse::<f64>().ok()),
                    (false, ColumnType::Text) => query.bind(raw.to_string()),
                };
            }
            query.execute(&mut *tx).await.map_err(Error::Sqlx)?;
        }

        tx.commit().await.map_err(Error::Sqlx)?;

        tracing::info!(
            path = %csv_path.display(),
            table,
            rows = records.len(),
            columns = headers.len(),
            "loaded CSV into table"
        );
        Ok(records.len())
    }
}

/// Pick the narrowest affinity that fits every non-empty value
///
/// A column with no non-empty values is `Text`.
pub fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut seen = false;
    let mut integer = true;
    let mut real = true;

    for value in values.map(str::trim).filter(|v| !v.is_empty()) {
        seen = true;
        if integer && value.parse::<i64>().is_err() {
            integer = false;
        }
        if real && value.parse::<f64>().is_err() {
            real = false;
        }
        if !integer && !real {
            break;
        }
    }

    match (seen, integer, real) {
        (false, _, _) => ColumnType::Text,
        (true, true, _) => ColumnType::Integer,
        (true, false, true) => ColumnType::Real,
        _ => ColumnType::Text,
    }
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let mut reader = open_csv(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    // Appending runs repeat the header row; those copies are not data
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let repeats_header = record.len() == headers.len()
            && record.iter().zip(&headers).all(|(v, h)| v.trim() == h);
        if !repeats_header {
            records.push(record);
        }
    }
    Ok((headers, records))
}
