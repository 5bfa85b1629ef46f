//! Incremental output tables
//!
//! Both output files are opened once per run in append mode. A header row is written
//! immediately after opening, once per run, without looking at what the file already
//! contains. Each user's rows are rendered in memory, appended to both files and synced
//! to disk. If any step fails, both files are truncated back to where they were before the
//! user, so a failed user leaves no rows in either table.

use crate::error::{Error, Result};
use crate::types::{LanguageRecord, SolvedRecord};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Append-only storage behind one output table
pub trait TableFile: Write {
    /// Make everything written so far durable
    fn sync(&mut self) -> io::Result<()>;

    /// Current length in bytes
    fn size(&self) -> io::Result<u64>;

    /// Cut the table back to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl TableFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// The two append-only output tables of a fetch run
pub struct StatsWriter<F: TableFile = File> {
    languages: F,
    solved: F,
    rows_written: usize,
}

impl StatsWriter<File> {
    /// Open (creating if needed) both tables for appending and write their header rows
    pub fn open(language_path: &Path, solved_path: &Path) -> Result<Self> {
        let languages = append_file(language_path)?;
        let solved = append_file(solved_path)?;

        tracing::debug!(
            language_stats = %language_path.display(),
            solved_stats = %solved_path.display(),
            "opened output tables"
        );
        Self::from_tables(languages, solved)
    }
}

impl<F: TableFile> StatsWriter<F> {
    /// Wrap two already-open tables and write their header rows
    pub fn from_tables(mut languages: F, mut solved: F) -> Result<Self> {
        languages.write_all(&render_record(&LanguageRecord::HEADERS)?)?;
        solved.write_all(&render_record(&SolvedRecord::HEADERS)?)?;
        languages.flush()?;
        solved.flush()?;

        Ok(Self {
            languages,
            solved,
            rows_written: 0,
        })
    }

    /// Append one user's records to both tables and make them durable
    ///
    /// On error neither table keeps any of this user's rows.
    pub fn write_user(
        &mut self,
        solved: &SolvedRecord,
        languages: &[LanguageRecord],
    ) -> Result<()> {
        let language_rows = render_rows(languages)?;
        let solved_rows = render_rows(std::slice::from_ref(solved))?;

        let language_len = self.languages.size()?;
        let solved_len = self.solved.size()?;

        if let Err(e) = self.append(&language_rows, &solved_rows) {
            self.rollback(language_len, solved_len);
            return Err(e.into());
        }

        self.rows_written += languages.len() + 1;
        Ok(())
    }

    /// Total data rows written to both tables by this writer
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn append(&mut self, language_rows: &[u8], solved_rows: &[u8]) -> io::Result<()> {
        self.languages.write_all(language_rows)?;
        self.solved.write_all(solved_rows)?;
        self.languages.flush()?;
        self.solved.flush()?;
        self.languages.sync()?;
        self.solved.sync()
    }

    fn rollback(&mut self, language_len: u64, solved_len: u64) {
        if let Err(e) = self.languages.truncate(language_len) {
            tracing::error!(error = %e, "cannot roll back language stats table");
        }
        if let Err(e) = self.solved.truncate(solved_len) {
            tracing::error!(error = %e, "cannot roll back solved stats table");
        }
    }
}

fn render_rows<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

fn render_record(fields: &[&str]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Write `rows` to `path` as a fresh CSV table, replacing any existing file
///
/// `headers` is written as the first row and must match the field order of `T`. An empty
/// `rows` produces a header-only file.
pub fn write_csv_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

fn append_file(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn solved(username: &str, ac_easy: i64) -> SolvedRecord {
        SolvedRecord {
            username: username.to_string(),
            easy: 10,
            medium: 5,
            hard: 1,
            ac_easy,
            ac_medium: 3,
            ac_hard: 0,
        }
    }

    fn language(username: &str, name: &str, count: i64) -> LanguageRecord {
        LanguageRecord {
            username: username.to_string(),
            language_name: name.to_string(),
            problems_solved: count,
        }
    }

    #[test]
    fn headers_are_written_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let lang = dir.path().join("language_stats.csv");
        let solved_path = dir.path().join("solved_stats.csv");

        let writer = StatsWriter::open(&lang, &solved_path).unwrap();
        drop(writer);

        assert_eq!(
            std::fs::read_to_string(&lang).unwrap(),
            "username,languageName,problemsSolved\n"
        );
        assert_eq!(
            std::fs::read_to_string(&solved_path).unwrap(),
            "username,easy,medium,hard,ac_easy,ac_medium,ac_hard\n"
        );
    }

    #[test]
    fn rows_are_visible_before_writer_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lang = dir.path().join("language_stats.csv");
        let solved_path = dir.path().join("solved_stats.csv");

        let mut writer = StatsWriter::open(&lang, &solved_path).unwrap();
        writer
            .write_user(
                &solved("alice", 7),
                &[language("alice", "C++", 40), language("alice", "Rust", 2)],
            )
            .unwrap();

        // Still open: the rows must already be on disk
        assert_eq!(
            std::fs::read_to_string(&lang).unwrap(),
            "username,languageName,problemsSolved\nalice,C++,40\nalice,Rust,2\n"
        );
        assert_eq!(
            std::fs::read_to_string(&solved_path).unwrap(),
            "username,easy,medium,hard,ac_easy,ac_medium,ac_hard\nalice,10,5,1,7,3,0\n"
        );
        assert_eq!(writer.rows_written(), 3);
    }

    #[test]
    fn user_without_languages_still_gets_solved_row() {
        let dir = tempfile::tempdir().unwrap();
        let lang = dir.path().join("l.csv");
        let solved_path = dir.path().join("s.csv");

        let mut writer = StatsWriter::open(&lang, &solved_path).unwrap();
        writer.write_user(&SolvedRecord::zeroed("bob"), &[]).unwrap();
        drop(writer);

        assert_eq!(
            std::fs::read_to_string(&lang).unwrap(),
            "username,languageName,problemsSolved\n"
        );
        assert!(
            std::fs::read_to_string(&solved_path)
                .unwrap()
                .ends_with("bob,0,0,0,0,0,0\n")
        );
    }

    #[test]
    fn reopening_appends_with_a_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let lang = dir.path().join("l.csv");
        let solved_path = dir.path().join("s.csv");

        for user in ["alice", "bob"] {
            let mut writer = StatsWriter::open(&lang, &solved_path).unwrap();
            writer.write_user(&solved(user, 1), &[]).unwrap();
        }

        let contents = std::fs::read_to_string(&solved_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "username,easy,medium,hard,ac_easy,ac_medium,ac_hard",
                "alice,10,5,1,1,3,0",
                "username,easy,medium,hard,ac_easy,ac_medium,ac_hard",
                "bob,10,5,1,1,3,0",
            ]
        );
    }

    #[test]
    fn values_needing_quotes_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let lang = dir.path().join("l.csv");
        let solved_path = dir.path().join("s.csv");

        let mut writer = StatsWriter::open(&lang, &solved_path).unwrap();
        writer
            .write_user(&solved("carol", 0), &[language("carol", "C, Objective", 1)])
            .unwrap();
        drop(writer);

        assert!(
            std::fs::read_to_string(&lang)
                .unwrap()
                .ends_with("carol,\"C, Objective\",1\n")
        );
    }

    #[derive(Serialize)]
    struct Share {
        name: String,
        pct: f64,
    }

    #[test]
    fn csv_table_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/share.csv");

        let first = vec![Share {
            name: "C++".to_string(),
            pct: 60.0,
        }];
        write_csv_table(&path, &["name", "pct"], &first).unwrap();

        let second = vec![
            Share {
                name: "Rust".to_string(),
                pct: 75.5,
            },
            Share {
                name: "Other".to_string(),
                pct: 24.5,
            },
        ];
        write_csv_table(&path, &["name", "pct"], &second).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "name,pct\nRust,75.5\nOther,24.5\n"
        );
    }

    #[test]
    fn csv_table_with_no_rows_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv_table::<Share>(&path, &["name", "pct"], &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name,pct\n");
    }

    #[test]
    fn open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir/l.csv");
        assert!(StatsWriter::open(&missing, &dir.path().join("s.csv")).is_err());
    }

    /// In-memory table whose writes or syncs can be made to fail
    #[derive(Clone, Default)]
    struct MemoryTable {
        data: Rc<RefCell<Vec<u8>>>,
        fail_writes: Rc<Cell<bool>>,
        fail_sync: Rc<Cell<bool>>,
    }

    impl MemoryTable {
        fn contents(&self) -> String {
            String::from_utf8(self.data.borrow().clone()).unwrap()
        }
    }

    impl Write for MemoryTable {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes.get() {
                return Err(io::Error::other("no space left on device"));
            }
            self.data.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl TableFile for MemoryTable {
        fn sync(&mut self) -> io::Result<()> {
            if self.fail_sync.get() {
                return Err(io::Error::other("sync failed"));
            }
            Ok(())
        }

        fn size(&self) -> io::Result<u64> {
            Ok(self.data.borrow().len() as u64)
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.data.borrow_mut().truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn failed_solved_write_leaves_no_rows_for_that_user() {
        let lang = MemoryTable::default();
        let solved_table = MemoryTable::default();
        let mut writer = StatsWriter::from_tables(lang.clone(), solved_table.clone()).unwrap();

        solved_table.fail_writes.set(true);
        let result = writer.write_user(&solved("alice", 7), &[language("alice", "C++", 40)]);
        assert!(result.is_err());
        assert_eq!(lang.contents(), "username,languageName,problemsSolved\n");
        assert_eq!(writer.rows_written(), 0);

        // The failed user's rows must not surface with the next user
        solved_table.fail_writes.set(false);
        writer
            .write_user(&solved("bob", 1), &[language("bob", "Rust", 2)])
            .unwrap();
        assert_eq!(
            lang.contents(),
            "username,languageName,problemsSolved\nbob,Rust,2\n"
        );
        assert_eq!(
            solved_table.contents(),
            "username,easy,medium,hard,ac_easy,ac_medium,ac_hard\nbob,10,5,1,1,3,0\n"
        );
    }

    #[test]
    fn failed_sync_rolls_back_both_tables() {
        let lang = MemoryTable::default();
        let solved_table = MemoryTable::default();
        let mut writer = StatsWriter::from_tables(lang.clone(), solved_table.clone()).unwrap();
        let lang_before = lang.contents();
        let solved_before = solved_table.contents();

        solved_table.fail_sync.set(true);
        assert!(
            writer
                .write_user(&solved("alice", 7), &[language("alice", "C++", 40)])
                .is_err()
        );

        assert_eq!(lang.contents(), lang_before);
        assert_eq!(solved_table.contents(), solved_before);
    }
}
