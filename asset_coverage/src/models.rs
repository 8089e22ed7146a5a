//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::sources`] — external market-data providers
//! - [`crate::schema::market_data_intervals`] — interval codes and their expected day span
//! - [`crate::schema::assets`] — canonical asset identity
//! - [`crate::schema::asset_sources`] — the asset ↔ source edge carrying the provider symbol
//! - [`crate::schema::market_observations`] — see [`observation`]
//!
//! Rows here are storage shapes. Validated construction lives next to the
//! component that writes them ([`crate::registry::AssetDraft`],
//! [`observation::MarketObservation::builder`]).

pub mod observation;

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::*;

// ----------------------- sources ------------------------

/// A row in [`crate::schema::sources`]: one external provider.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = sources, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Source {
    /// Externally assigned provider id.
    pub id: i32,
    /// Normalized lowercase code, e.g. "coingecko".
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

/// Insertable/changeset form of [`Source`].
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = sources)]
pub struct NewSource<'a> {
    /// Provider id.
    pub id: i32,
    /// Lowercase code.
    pub code: &'a str,
    /// Human-readable name.
    pub name: &'a str,
}

// ------------------ market_data_intervals ---------------

/// A row in [`crate::schema::market_data_intervals`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = market_data_intervals, check_for_backend(diesel::sqlite::Sqlite))]
pub struct IntervalRow {
    /// Interval id referenced by observations.
    pub id: i32,
    /// Interval code, e.g. "1D" (see [`crate::interval::Interval`]).
    pub code: String,
    /// Expected `end_date - start_date` of one observation.
    pub span_days: i32,
}

// ------------------------ assets ------------------------

/// A row in [`crate::schema::assets`].
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = assets, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Asset {
    /// Stable surrogate key.
    pub id: i32,
    /// Stable external handle.
    pub uuid: String,
    /// Display name.
    pub name: Option<String>,
    /// Ticker, unique when set.
    pub ticker: Option<String>,
    /// Contract address, stored lower-cased and unique when set.
    pub contract_address: Option<String>,
    /// CUSIP, unique when set.
    pub cusip: Option<String>,
    /// Base leg when this asset is a trading pair.
    pub base_asset_id: Option<i32>,
    /// Quote leg when this asset is a trading pair.
    pub quote_asset_id: Option<i32>,
    /// Chain the contract lives on.
    pub chain_id: Option<i32>,
    /// Asset type (crypto, equity, pair, ...), owned by the surrounding CRUD layer.
    pub asset_type_id: i32,
    /// Token decimals.
    pub decimals: Option<i32>,
    /// Default quote currency for its type.
    pub is_default_quote: bool,
    /// Suppresses the asset from the market-data pipeline.
    pub ignore_market_data: bool,
    /// Who created the row.
    pub created_by: String,
    /// When the row was created (UTC).
    pub created_at: NaiveDateTime,
    /// Who last changed the row.
    pub updated_by: String,
    /// When the row was last changed (UTC).
    pub updated_at: NaiveDateTime,
}

impl Asset {
    /// Short label for logs and diffs: ticker, then contract, then CUSIP, then `#id`.
    pub fn label(&self) -> String {
        self.ticker
            .as_deref()
            .or(self.contract_address.as_deref())
            .or(self.cusip.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// Insertable form of [`Asset`].
#[derive(Debug, Insertable)]
#[diesel(table_name = assets, treat_none_as_default_value = false)]
pub(crate) struct NewAssetRow<'a> {
    pub(crate) uuid: &'a str,
    pub(crate) name: Option<&'a str>,
    pub(crate) ticker: Option<&'a str>,
    pub(crate) contract_address: Option<&'a str>,
    pub(crate) cusip: Option<&'a str>,
    pub(crate) base_asset_id: Option<i32>,
    pub(crate) quote_asset_id: Option<i32>,
    pub(crate) chain_id: Option<i32>,
    pub(crate) asset_type_id: i32,
    pub(crate) decimals: Option<i32>,
    pub(crate) is_default_quote: bool,
    pub(crate) ignore_market_data: bool,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) updated_by: &'a str,
    pub(crate) updated_at: NaiveDateTime,
}

/// Full-replacement changeset: `None` writes NULL rather than leaving the old value.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = assets, treat_none_as_null = true)]
pub(crate) struct AssetChangeset<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) ticker: Option<&'a str>,
    pub(crate) contract_address: Option<&'a str>,
    pub(crate) cusip: Option<&'a str>,
    pub(crate) base_asset_id: Option<i32>,
    pub(crate) quote_asset_id: Option<i32>,
    pub(crate) chain_id: Option<i32>,
    pub(crate) asset_type_id: i32,
    pub(crate) decimals: Option<i32>,
    pub(crate) is_default_quote: bool,
    pub(crate) ignore_market_data: bool,
    pub(crate) updated_by: &'a str,
    pub(crate) updated_at: NaiveDateTime,
}

// -------------------- asset_sources ---------------------
// Composite PK (asset_id, source_id) => declare both columns.

/// The asset ↔ source edge in [`crate::schema::asset_sources`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = asset_sources, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(asset_id, source_id))]
pub struct AssetSource {
    /// FK to [`Asset::id`].
    pub asset_id: i32,
    /// FK to [`Source::id`].
    pub source_id: i32,
    /// Provider-specific symbol.
    pub source_identifier: String,
    /// Last write (UTC).
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`AssetSource`].
#[derive(Debug, Insertable)]
#[diesel(table_name = asset_sources)]
pub(crate) struct NewAssetSource<'a> {
    pub(crate) asset_id: i32,
    pub(crate) source_id: i32,
    pub(crate) source_identifier: &'a str,
    pub(crate) updated_at: NaiveDateTime,
}
