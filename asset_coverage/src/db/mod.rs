//! Database utilities for connections, schema migrations, and write transactions.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON,
//!   and the default 5000ms busy_timeout; [`connection::connect`] takes the timeout from
//!   a [`crate::config::StoreConfig`].
//! - Embedded Diesel migrations and runners: [`migrate::run_all`] for a URL or bare path
//!   and [`migrate::run_on`] for an already open connection (e.g. `:memory:`).
//! - [`write_tx`], the transaction wrapper every write path goes through.
//!
//! Example:
//! ```no_run
//! use asset_coverage::db::{migrate, connection};
//!
//! let db_path = std::env::temp_dir().join("asset_coverage_example.db");
//! migrate::run_all(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;

use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, Connection, TransactionManager};

use crate::error::Result;

/// Run `f` as one atomic write.
///
/// At top level this is `BEGIN IMMEDIATE`, which takes the write lock up front so
/// `busy_timeout` applies instead of failing on a lock upgrade mid-transaction. When
/// the caller already holds a transaction (e.g. delete + reload at the call site) it
/// nests as a savepoint, so the caller's commit or rollback decides the outcome.
pub(crate) fn write_tx<T, F>(conn: &mut SqliteConnection, f: F) -> Result<T>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T>,
{
    let nested = AnsiTransactionManager::transaction_manager_status_mut(conn)
        .transaction_depth()?
        .is_some();
    if nested {
        conn.transaction(f)
    } else {
        conn.immediate_transaction(f)
    }
}
