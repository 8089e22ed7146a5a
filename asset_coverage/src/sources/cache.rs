//! Lock-free, read-mostly cache of provider code -> source id.
//!
//! Readers call [`source_id_for`], which loads an `Arc<HashMap<..>>` snapshot
//! without locking. Writers call [`refresh_sources`] after a catalog sync (or at
//! startup) to swap in a new snapshot atomically.
//!
//! Until the first refresh the snapshot is empty and every lookup returns `None`.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use diesel::prelude::*;
use once_cell::sync::Lazy;

use crate::error::Result;
use crate::schema::sources;

type SourceCodes = HashMap<String, i32>;

static SOURCES: Lazy<ArcSwap<SourceCodes>> = Lazy::new(|| ArcSwap::from_pointee(SourceCodes::new()));

/// Source id for a provider code (case-insensitive) from the current snapshot.
pub fn source_id_for(code: &str) -> Option<i32> {
    let snap = SOURCES.load();
    snap.get(code.trim().to_lowercase().as_str()).copied()
}

/// Rebuild the snapshot from `sources` and swap it in. Returns the number of codes.
pub fn refresh_sources(conn: &mut SqliteConnection) -> Result<usize> {
    let rows: Vec<(String, i32)> = sources::table
        .select((sources::code, sources::id))
        .load(conn)?;
    let n = rows.len();
    SOURCES.store(Arc::new(rows.into_iter().collect()));
    tracing::debug!(sources = n, "source cache refreshed");
    Ok(n)
}

/// Reset to an empty snapshot.
pub fn clear_source_cache() {
    SOURCES.store(Arc::new(SourceCodes::new()));
}

/// The current snapshot.
pub fn snapshot() -> Arc<SourceCodes> {
    SOURCES.load_full()
}
