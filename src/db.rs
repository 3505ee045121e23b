//! SQLite Connection
//! Mission: Open the single platform database shared by every store

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex; // Faster than std::sync::Mutex
use rusqlite::{Connection, OpenFlags};
use std::sync::Arc;
use tracing::{debug, info};

/// Connection shared by the user, catalog, negotiation and newsletter stores.
pub type SharedConnection = Arc<Mutex<Connection>>;

const PRAGMAS_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;
PRAGMA temp_store = MEMORY;
"#;

/// Open (or create) the database at `db_path` and apply connection pragmas.
///
/// `":memory:"` is accepted and gives a private in-memory database, which is
/// what the tests use.
pub fn open(db_path: &str) -> Result<SharedConnection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

    let conn = Connection::open_with_flags(db_path, flags)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.execute_batch(PRAGMAS_SQL)
        .context("Failed to apply database pragmas")?;

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap_or_default();
    if !journal_mode.eq_ignore_ascii_case("wal") {
        debug!("WAL mode not active, journal_mode = {}", journal_mode);
    }

    info!("💾 Database opened at: {}", db_path);

    Ok(Arc::new(Mutex::new(conn)))
}

/// Current time as a fixed-width RFC 3339 string.
///
/// Fixed width keeps `ORDER BY` on timestamp columns chronological.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Open a fresh in-memory database.
pub fn open_in_memory() -> Result<SharedConnection> {
    open(":memory:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_in_memory() {
        let conn = open_in_memory().unwrap();
        let one: i64 = conn.lock().query_row("SELECT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        let a = timestamp_now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = timestamp_now();
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn test_open_file_enables_foreign_keys() {
        let temp = NamedTempFile::new().unwrap();
        let conn = open(temp.path().to_str().unwrap()).unwrap();

        let fk: i64 = conn
            .lock()
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
