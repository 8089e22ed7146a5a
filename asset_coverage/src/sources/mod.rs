//! Source identifier map: what each provider calls each asset.
//!
//! One row per (asset, source) in `asset_sources`. An asset can have zero or many
//! identifiers, at most one per source. Missing pairs come back as `None` or an
//! empty `Vec`.
//!
//! There are two write paths on purpose:
//! - [`SourceMap::set_identifier`] is the upsert: writing the same pair again
//!   replaces the identifier.
//! - [`SourceMap::add_identifier`] is a strict insert and fails with
//!   [`crate::Error::ConflictingKey`] if the pair already exists.
//!
//! Provider codes resolve to ids through a lock-free snapshot, see
//! [`source_id_for`] and [`refresh_sources`].

mod cache;
mod repo;

use diesel::SqliteConnection;

use crate::error::Result;
use crate::models::{Asset, AssetSource};

pub use cache::{clear_source_cache, refresh_sources, snapshot, source_id_for};

/// Per-source identifier operations.
pub trait SourceMap {
    /// The identifier `source_id` uses for `asset_id`.
    fn identifier_for(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
    ) -> Result<Option<String>>;

    /// Every asset of `asset_type_id` with an identifier at `source_id`, ordered by
    /// asset id. With `exclude_ignored`, assets with market data suppressed are
    /// left out.
    fn assets_for_source_and_type(
        &self,
        conn: &mut SqliteConnection,
        source_id: i32,
        asset_type_id: i32,
        exclude_ignored: bool,
    ) -> Result<Vec<(Asset, String)>>;

    /// Identifiers at `source_id` for `asset_ids`.
    ///
    /// Output follows the first appearance of each id in `asset_ids`; duplicates
    /// collapse and ids without an identifier are omitted.
    fn resolve_many(
        &self,
        conn: &mut SqliteConnection,
        asset_ids: &[i32],
        source_id: i32,
        exclude_ignored: bool,
    ) -> Result<Vec<(Asset, String)>>;

    /// Reverse lookup: the asset `source_id` knows as `identifier`. When several
    /// assets share the identifier the lowest asset id wins.
    fn asset_for_identifier(
        &self,
        conn: &mut SqliteConnection,
        source_id: i32,
        identifier: &str,
    ) -> Result<Option<Asset>>;

    /// Insert or replace the identifier for (asset, source).
    fn set_identifier(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
        identifier: &str,
    ) -> Result<AssetSource>;

    /// Insert the identifier for (asset, source); an existing pair is a conflict.
    fn add_identifier(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
        identifier: &str,
    ) -> Result<AssetSource>;

    /// Delete the pair. Returns rows removed; removing nothing is not an error.
    fn remove_identifier(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
    ) -> Result<usize>;
}
