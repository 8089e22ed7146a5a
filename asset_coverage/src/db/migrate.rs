//! Embedded schema migrations.

use anyhow::{Context, anyhow};
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Strip an optional `sqlite://` / `sqlite:` scheme and reject server URLs.
///
/// Bare paths and `:memory:` pass through unchanged.
pub(crate) fn sqlite_path(database_url: &str) -> anyhow::Result<&str> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        anyhow::bail!("Unsupported DATABASE_URL (only SQLite is built in): {database_url}");
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if path.is_empty() {
        anyhow::bail!("empty DATABASE_URL");
    }
    Ok(path)
}

/// Applies pending migrations on an open connection and returns how many ran.
pub fn run_on(conn: &mut SqliteConnection) -> anyhow::Result<usize> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
    for version in &applied {
        tracing::info!(%version, "applied migration");
    }
    Ok(applied.len())
}

/// Runs pending migrations on the SQLite database at `database_url`.
///
/// Accepts `sqlite://path`, `sqlite:path`, or a bare file path. The file is switched
/// to WAL journaling first; WAL is persistent per database file.
pub fn run_all(database_url: &str) -> anyhow::Result<usize> {
    let path = sqlite_path(database_url)?;
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("open sqlite database {path}"))?;
    conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    run_on(&mut conn)
}
