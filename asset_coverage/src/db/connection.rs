//! SQLite connection helpers.
//!
//! Every connection gets WAL journaling, `foreign_keys=ON` (the cascade and restrict
//! rules in the migrations depend on it), and a `busy_timeout`. The timeout is the
//! fixed ceiling on how long any statement waits for a lock before failing; it does
//! not scale with payload size.
//!
//! Example:
//! ```no_run
//! use asset_coverage::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("asset_coverage_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};

use crate::config::{DEFAULT_BUSY_TIMEOUT_MS, StoreConfig};

/// Open a SQLite connection with the default busy timeout.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    connect_with_timeout(database_url, DEFAULT_BUSY_TIMEOUT_MS)
}

/// Open a SQLite connection using the URL and timeout from `cfg`.
pub fn connect(cfg: &StoreConfig) -> anyhow::Result<SqliteConnection> {
    connect_with_timeout(&cfg.database_url, cfg.busy_timeout_ms)
}

fn connect_with_timeout(database_url: &str, busy_timeout_ms: u32) -> anyhow::Result<SqliteConnection> {
    let path = super::migrate::sqlite_path(database_url)?;
    let mut conn = SqliteConnection::establish(path)?;

    conn.batch_execute(&format!(
        "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout={busy_timeout_ms};"
    ))?;
    tracing::debug!(path, busy_timeout_ms, "opened sqlite connection");
    Ok(conn)
}
