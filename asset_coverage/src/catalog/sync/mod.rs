//! Catalog synchronization (sources, intervals, per-source identifiers).
//!
//! ## What this does
//! - Normalizes a [`Catalog`] (lowercase codes, trim, dedupe).
//! - Resolves each identifier's asset through the registry. Unregistered assets
//!   are skipped or rejected per [`UnknownAssetPolicy`]. Two entries that reach
//!   the same asset through different keys with different identifiers are an error.
//! - Computes a **diff** between the catalog (desired) and the store (current).
//!   Rows that already match are left alone, so a repeated sync is a no-op.
//! - Applies the diff with UPSERTs and optional **prune** deletes.
//!
//! ## Transactions & consistency
//! Reading, diffing, and applying run inside one **`BEGIN IMMEDIATE`** transaction,
//! so the whole diff lands or none of it does. Afterwards the source-code cache
//! ([`crate::sources::source_id_for`]) is refreshed.
//!
//! ## Dry-run
//! When [`SyncOptions::dry_run`] is `true` the diff is computed and returned and
//! nothing is written.
//!
//! ## Delete order (prune)
//! Identifiers go first, then intervals, then sources. Intervals and sources still
//! referenced by observations are protected by `ON DELETE RESTRICT`; pruning one
//! fails the sync and rolls it back.

mod apply;
mod diff;
mod read;
mod want;

use diesel::SqliteConnection;

use crate::catalog::config::{Catalog, UnknownAssetPolicy, normalize_catalog};
use crate::db::write_tx;
use crate::sources::refresh_sources;

pub use diff::CatalogDiff;
pub use want::IdentifierEntry;

/// Options for catalog synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// If true, compute the diff only.
    pub dry_run: bool,
    /// If true, delete sources, intervals, and identifiers absent from the catalog.
    pub prune: bool,
    /// What to do with identifiers whose asset is not registered.
    pub unknown_assets: UnknownAssetPolicy,
}

fn plan(
    conn: &mut SqliteConnection,
    cat: &Catalog,
    opt: &SyncOptions,
) -> crate::Result<CatalogDiff> {
    let wanted = want::wanted_from_catalog(conn, cat, opt.unknown_assets)?;
    let current = read::read_current(conn)?;
    Ok(diff::make_diff(&wanted, &current, opt.prune))
}

/// Sync the catalog into the store and return what changed (or would change).
pub fn sync_catalog(
    conn: &mut SqliteConnection,
    mut cat: Catalog,
    opt: SyncOptions,
) -> anyhow::Result<CatalogDiff> {
    let report = normalize_catalog(&mut cat)?;
    tracing::debug!(?report, "catalog normalized");

    if opt.dry_run {
        let diff = plan(conn, &cat, &opt)?;
        tracing::info!(changes = diff.change_count(), "catalog dry run");
        return Ok(diff);
    }

    let diff = write_tx(conn, |conn| {
        let diff = plan(conn, &cat, &opt)?;
        apply::apply_diff(conn, &diff)?;
        Ok(diff)
    })
    .inspect_err(|e| tracing::warn!(error = %e, "catalog sync rolled back"))?;
    refresh_sources(conn)?;
    tracing::info!(
        changes = diff.change_count(),
        skipped = diff.skipped.len(),
        prune = opt.prune,
        "catalog synced"
    );
    Ok(diff)
}
