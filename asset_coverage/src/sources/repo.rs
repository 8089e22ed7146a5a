use std::collections::{HashMap, HashSet};

use chrono::Utc;
use diesel::prelude::*;

use crate::db::write_tx;
use crate::error::{Result, non_empty, positive_id};
use crate::models::{Asset, AssetSource, NewAssetSource};
use crate::repo::SqliteRepo;
use crate::schema::{asset_sources, assets};
use crate::sources::SourceMap;

impl SourceMap for SqliteRepo {
    fn identifier_for(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
    ) -> Result<Option<String>> {
        positive_id("asset_id", asset_id)?;
        positive_id("source_id", source_id)?;
        Ok(asset_sources::table
            .find((asset_id, source_id))
            .select(asset_sources::source_identifier)
            .first(conn)
            .optional()?)
    }

    fn assets_for_source_and_type(
        &self,
        conn: &mut SqliteConnection,
        source_id: i32,
        asset_type_id: i32,
        exclude_ignored: bool,
    ) -> Result<Vec<(Asset, String)>> {
        positive_id("source_id", source_id)?;
        positive_id("asset_type_id", asset_type_id)?;
        let mut q = asset_sources::table
            .inner_join(assets::table)
            .filter(asset_sources::source_id.eq(source_id))
            .filter(assets::asset_type_id.eq(asset_type_id))
            .select((Asset::as_select(), asset_sources::source_identifier))
            .order(assets::id.asc())
            .into_boxed();
        if exclude_ignored {
            q = q.filter(assets::ignore_market_data.eq(false));
        }
        Ok(q.load(conn)?)
    }

    fn resolve_many(
        &self,
        conn: &mut SqliteConnection,
        asset_ids: &[i32],
        source_id: i32,
        exclude_ignored: bool,
    ) -> Result<Vec<(Asset, String)>> {
        positive_id("source_id", source_id)?;
        let mut seen = HashSet::with_capacity(asset_ids.len());
        let mut ordered = Vec::with_capacity(asset_ids.len());
        for &id in asset_ids {
            positive_id("asset_id", id)?;
            if seen.insert(id) {
                ordered.push(id);
            }
        }
        if ordered.is_empty() {
            return Ok(Vec::new());
        }

        let mut q = asset_sources::table
            .inner_join(assets::table)
            .filter(asset_sources::source_id.eq(source_id))
            .filter(asset_sources::asset_id.eq_any(&ordered))
            .select((Asset::as_select(), asset_sources::source_identifier))
            .into_boxed();
        if exclude_ignored {
            q = q.filter(assets::ignore_market_data.eq(false));
        }
        let rows: Vec<(Asset, String)> = q.load(conn)?;

        let mut by_id: HashMap<i32, (Asset, String)> =
            rows.into_iter().map(|(a, s)| (a.id, (a, s))).collect();
        Ok(ordered.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    fn asset_for_identifier(
        &self,
        conn: &mut SqliteConnection,
        source_id: i32,
        identifier: &str,
    ) -> Result<Option<Asset>> {
        positive_id("source_id", source_id)?;
        let identifier = non_empty("source identifier", identifier)?;
        Ok(asset_sources::table
            .inner_join(assets::table)
            .filter(asset_sources::source_id.eq(source_id))
            .filter(asset_sources::source_identifier.eq(identifier))
            .select(Asset::as_select())
            .order(assets::id.asc())
            .first(conn)
            .optional()?)
    }

    fn set_identifier(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
        identifier: &str,
    ) -> Result<AssetSource> {
        positive_id("asset_id", asset_id)?;
        positive_id("source_id", source_id)?;
        let identifier = non_empty("source identifier", identifier)?;
        let now = Utc::now().naive_utc();
        let row = NewAssetSource {
            asset_id,
            source_id,
            source_identifier: identifier,
            updated_at: now,
        };
        let saved = write_tx(conn, |conn| {
            Ok(diesel::insert_into(asset_sources::table)
                .values(&row)
                .on_conflict((asset_sources::asset_id, asset_sources::source_id))
                .do_update()
                .set((
                    asset_sources::source_identifier.eq(identifier),
                    asset_sources::updated_at.eq(now),
                ))
                .returning(AssetSource::as_returning())
                .get_result(conn)?)
        })?;
        tracing::debug!(asset_id, source_id, identifier, "source identifier set");
        Ok(saved)
    }

    fn add_identifier(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
        identifier: &str,
    ) -> Result<AssetSource> {
        positive_id("asset_id", asset_id)?;
        positive_id("source_id", source_id)?;
        let identifier = non_empty("source identifier", identifier)?;
        let row = NewAssetSource {
            asset_id,
            source_id,
            source_identifier: identifier,
            updated_at: Utc::now().naive_utc(),
        };
        let saved = write_tx(conn, |conn| {
            Ok(diesel::insert_into(asset_sources::table)
                .values(&row)
                .returning(AssetSource::as_returning())
                .get_result(conn)?)
        })
        .inspect_err(|e| tracing::warn!(asset_id, source_id, error = %e, "identifier insert rejected"))?;
        tracing::debug!(asset_id, source_id, identifier, "source identifier added");
        Ok(saved)
    }

    fn remove_identifier(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        source_id: i32,
    ) -> Result<usize> {
        positive_id("asset_id", asset_id)?;
        positive_id("source_id", source_id)?;
        let n = write_tx(conn, |conn| {
            Ok(diesel::delete(asset_sources::table.find((asset_id, source_id))).execute(conn)?)
        })?;
        tracing::debug!(asset_id, source_id, rows = n, "source identifier removed");
        Ok(n)
    }
}
