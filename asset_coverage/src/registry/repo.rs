use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};

use crate::db::write_tx;
use crate::error::{Result, non_empty, positive_id};
use crate::models::{Asset, AssetChangeset, NewAssetRow};
use crate::query::AssetQuery;
use crate::registry::{AssetDraft, AssetKey, AssetRegistry};
use crate::repo::SqliteRepo;
use crate::schema::assets;

diesel::define_sql_function! {
    /// SQL `lower()`; the contract-address index is built on it.
    fn lower(x: Nullable<Text>) -> Nullable<Text>;
}

impl AssetDraft {
    fn changeset<'a>(&'a self, actor: &'a str, now: chrono::NaiveDateTime) -> AssetChangeset<'a> {
        let (base, quote) = self.identity.pair().unzip();
        AssetChangeset {
            name: self.name.as_deref(),
            ticker: self.identity.ticker_str(),
            contract_address: self.identity.contract_address(),
            cusip: self.identity.cusip_str(),
            base_asset_id: base,
            quote_asset_id: quote,
            chain_id: self.chain_id,
            asset_type_id: self.asset_type_id,
            decimals: self.decimals,
            is_default_quote: self.is_default_quote,
            ignore_market_data: self.ignore_market_data,
            updated_by: actor,
            updated_at: now,
        }
    }
}

impl AssetRegistry for SqliteRepo {
    fn resolve(&self, conn: &mut SqliteConnection, key: &AssetKey) -> Result<Option<Asset>> {
        let q = assets::table.select(Asset::as_select());
        let found = match key.normalized()? {
            AssetKey::Ticker(t) => q.filter(assets::ticker.eq(t)).first(conn),
            AssetKey::ContractAddress(c) => q
                .filter(lower(assets::contract_address).eq(c))
                .first(conn),
            AssetKey::Cusip(c) => q.filter(assets::cusip.eq(c)).first(conn),
            AssetKey::Pair { base, quote } => q
                .filter(assets::base_asset_id.eq(base))
                .filter(assets::quote_asset_id.eq(quote))
                .first(conn),
        }
        .optional()?;
        if found.is_none() {
            tracing::debug!(?key, "asset not found");
        }
        Ok(found)
    }

    fn get(&self, conn: &mut SqliteConnection, id: i32) -> Result<Option<Asset>> {
        positive_id("asset_id", id)?;
        Ok(assets::table
            .find(id)
            .select(Asset::as_select())
            .first(conn)
            .optional()?)
    }

    fn list_tradable(
        &self,
        conn: &mut SqliteConnection,
        query: &AssetQuery,
    ) -> Result<Vec<Asset>> {
        query.load(conn)
    }

    fn create(
        &self,
        conn: &mut SqliteConnection,
        draft: &AssetDraft,
        actor: &str,
    ) -> Result<Asset> {
        let actor = non_empty("actor", actor)?;
        let uuid = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let (base, quote) = draft.identity.pair().unzip();
        let row = NewAssetRow {
            uuid: &uuid,
            name: draft.name.as_deref(),
            ticker: draft.identity.ticker_str(),
            contract_address: draft.identity.contract_address(),
            cusip: draft.identity.cusip_str(),
            base_asset_id: base,
            quote_asset_id: quote,
            chain_id: draft.chain_id,
            asset_type_id: draft.asset_type_id,
            decimals: draft.decimals,
            is_default_quote: draft.is_default_quote,
            ignore_market_data: draft.ignore_market_data,
            created_by: actor,
            created_at: now,
            updated_by: actor,
            updated_at: now,
        };
        let asset = write_tx(conn, |conn| {
            Ok(diesel::insert_into(assets::table)
                .values(&row)
                .returning(Asset::as_returning())
                .get_result(conn)?)
        })
        .inspect_err(|e| tracing::warn!(error = %e, "asset create rejected"))?;
        tracing::info!(asset_id = asset.id, label = %asset.label(), actor, "asset created");
        Ok(asset)
    }

    fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        draft: &AssetDraft,
        actor: &str,
    ) -> Result<Option<Asset>> {
        positive_id("asset_id", id)?;
        let actor = non_empty("actor", actor)?;
        let now = Utc::now().naive_utc();
        let changes = draft.changeset(actor, now);
        let updated = write_tx(conn, |conn| {
            Ok(diesel::update(assets::table.find(id))
                .set(&changes)
                .returning(Asset::as_returning())
                .get_result(conn)
                .optional()?)
        })?;
        match &updated {
            Some(a) => tracing::info!(asset_id = id, label = %a.label(), actor, "asset updated"),
            None => tracing::debug!(asset_id = id, "update: asset not found"),
        }
        Ok(updated)
    }

    fn set_ignore_market_data(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        ignore: bool,
        actor: &str,
    ) -> Result<Option<Asset>> {
        positive_id("asset_id", id)?;
        let actor = non_empty("actor", actor)?;
        let now = Utc::now().naive_utc();
        let updated = write_tx(conn, |conn| {
            Ok(diesel::update(assets::table.find(id))
                .set((
                    assets::ignore_market_data.eq(ignore),
                    assets::updated_by.eq(actor),
                    assets::updated_at.eq(now),
                ))
                .returning(Asset::as_returning())
                .get_result(conn)
                .optional()?)
        })?;
        if updated.is_some() {
            tracing::info!(asset_id = id, ignore, actor, "market data flag set");
        }
        Ok(updated)
    }

    fn purge(&self, conn: &mut SqliteConnection, id: i32) -> Result<usize> {
        positive_id("asset_id", id)?;
        let n = write_tx(conn, |conn| {
            Ok(diesel::delete(assets::table.find(id)).execute(conn)?)
        })?;
        if n > 0 {
            tracing::info!(asset_id = id, "asset purged");
        }
        Ok(n)
    }
}
