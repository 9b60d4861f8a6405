#![allow(dead_code)]

use sql_record::prelude::*;
use tempfile::tempdir;

pub const ITEMS_DDL: &str = "CREATE TABLE items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    qty INTEGER NOT NULL DEFAULT 0,
    note TEXT,
    created_at TEXT NOT NULL DEFAULT '2024-01-01 00:00:00'
);";

pub fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

pub async fn items_db(prefix: &str) -> Result<Database, SqlRecordError> {
    let db = Database::open_sqlite(&unique_db_path(prefix)).await?;
    db.clone().execute_batch(ITEMS_DDL).await?;
    Ok(db)
}

pub async fn count_items(db: &Database) -> Result<usize, SqlRecordError> {
    Ok(db.model("items").find_all().await?.len())
}
