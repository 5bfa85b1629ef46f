//! Reading the username list

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;

/// Column holding the usernames
pub const USERNAME_COLUMN: &str = "username";

/// Read every value of the `username` column, trimmed, in file order
///
/// Blank values are kept so that offsets into the list match row numbers in the file; the
/// pipeline skips them.
pub fn read_usernames(path: &Path) -> Result<Vec<String>> {
    let mut reader = open_csv(path)?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == USERNAME_COLUMN)
        .ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: USERNAME_COLUMN.to_string(),
        })?;

    let mut usernames = Vec::new();
    for record in reader.records() {
        let record = record?;
        usernames.push(record.get(column).unwrap_or_default().trim().to_string());
    }

    tracing::debug!(path = %path.display(), count = usernames.len(), "read username list");
    Ok(usernames)
}

/// Open a CSV file with a header row, tolerating rows of uneven length
///
/// A missing file is reported as [`Error::InputNotFound`].
pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| match e.kind() {
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Error::InputNotFound(path.to_path_buf())
            }
            _ => e.into(),
        })
}
