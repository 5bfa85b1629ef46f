use super::*;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};


/// Write `contents` to `name` inside `dir` and return the path
fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

async fn open_db(file: &NamedTempFile) -> Database {
    Database::new(file.path()).await.unwrap()
}

async fn load(db: &Database, dir: &TempDir, table: &str, contents: &str) -> usize {
    let path = write_csv(dir, &format!("{}.csv", table), contents);
    load_path(db, &path, table).await
}

async fn load_path(db: &Database, path: &Path, table: &str) -> usize {
    db.load_csv(path, table).await.unwrap()
}
