//! Asset registry: canonical asset records and identity resolution.
//!
//! An asset is known by at least one of three namespaced keys (ticker, contract
//! address, CUSIP) or, for trading pairs, by its (base, quote) legs. [`AssetKey`]
//! names exactly one of those per lookup.
//!
//! Writes go through [`AssetDraft`], which validates and normalizes before any
//! statement runs: keys are trimmed, contract addresses lower-cased, and a pair
//! must have two distinct legs.
//!
//! ```
//! use asset_coverage::registry::{AssetDraft, AssetIdentity};
//!
//! let draft = AssetDraft::new(AssetIdentity::contract("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2"), 1)
//!     .unwrap()
//!     .name("Wrapped Ether")
//!     .decimals(18);
//! assert_eq!(
//!     draft.identity().contract_address(),
//!     Some("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")
//! );
//! ```

mod repo;

use diesel::SqliteConnection;

use crate::error::{Error, Result, non_empty, positive_id};
use crate::models::Asset;
use crate::query::AssetQuery;

/// One identity key for a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    /// Exchange ticker, exact match.
    Ticker(String),
    /// On-chain contract address, matched case-insensitively.
    ContractAddress(String),
    /// CUSIP, exact match.
    Cusip(String),
    /// Trading pair by its legs.
    Pair {
        /// Base asset id.
        base: i32,
        /// Quote asset id.
        quote: i32,
    },
}

impl AssetKey {
    /// Trimmed, lower-cased where applicable, and checked for emptiness / positive ids.
    pub(crate) fn normalized(&self) -> Result<AssetKey> {
        Ok(match self {
            AssetKey::Ticker(t) => AssetKey::Ticker(non_empty("ticker", t)?.to_string()),
            AssetKey::ContractAddress(c) => {
                AssetKey::ContractAddress(non_empty("contract address", c)?.to_lowercase())
            }
            AssetKey::Cusip(c) => AssetKey::Cusip(non_empty("cusip", c)?.to_string()),
            AssetKey::Pair { base, quote } => {
                let (base, quote) = check_pair(*base, *quote)?;
                AssetKey::Pair { base, quote }
            }
        })
    }
}

fn check_pair(base: i32, quote: i32) -> Result<(i32, i32)> {
    positive_id("base_asset_id", base)?;
    positive_id("quote_asset_id", quote)?;
    if base == quote {
        return Err(Error::InvalidArgument(format!(
            "pair legs must differ, got {base}/{quote}"
        )));
    }
    Ok((base, quote))
}

/// The identity keys of an asset. Start from one key and add the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIdentity {
    ticker: Option<String>,
    contract_address: Option<String>,
    cusip: Option<String>,
    pair: Option<(i32, i32)>,
}

impl AssetIdentity {
    /// Identity keyed by ticker.
    pub fn ticker(t: impl Into<String>) -> Self {
        Self::default().with_ticker(t)
    }

    /// Identity keyed by contract address.
    pub fn contract(c: impl Into<String>) -> Self {
        Self::default().with_contract(c)
    }

    /// Identity keyed by CUSIP.
    pub fn cusip(c: impl Into<String>) -> Self {
        Self::default().with_cusip(c)
    }

    /// Add or replace the ticker.
    pub fn with_ticker(mut self, t: impl Into<String>) -> Self {
        self.ticker = Some(t.into());
        self
    }

    /// Add or replace the contract address.
    pub fn with_contract(mut self, c: impl Into<String>) -> Self {
        self.contract_address = Some(c.into());
        self
    }

    /// Add or replace the CUSIP.
    pub fn with_cusip(mut self, c: impl Into<String>) -> Self {
        self.cusip = Some(c.into());
        self
    }

    /// Mark the asset as the (base, quote) trading pair.
    pub fn with_pair(mut self, base: i32, quote: i32) -> Self {
        self.pair = Some((base, quote));
        self
    }

    /// Ticker, if any.
    pub fn ticker_str(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    /// Contract address, if any.
    pub fn contract_address(&self) -> Option<&str> {
        self.contract_address.as_deref()
    }

    /// CUSIP, if any.
    pub fn cusip_str(&self) -> Option<&str> {
        self.cusip.as_deref()
    }

    /// Pair legs, if any.
    pub fn pair(&self) -> Option<(i32, i32)> {
        self.pair
    }

    fn normalized(self) -> Result<Self> {
        let ticker = self
            .ticker
            .as_deref()
            .map(|t| non_empty("ticker", t).map(str::to_string))
            .transpose()?;
        let contract_address = self
            .contract_address
            .as_deref()
            .map(|c| non_empty("contract address", c).map(str::to_lowercase))
            .transpose()?;
        let cusip = self
            .cusip
            .as_deref()
            .map(|c| non_empty("cusip", c).map(str::to_string))
            .transpose()?;
        if ticker.is_none() && contract_address.is_none() && cusip.is_none() {
            return Err(Error::InvalidArgument(
                "an asset needs a ticker, contract address, or cusip".into(),
            ));
        }
        let pair = self.pair.map(|(b, q)| check_pair(b, q)).transpose()?;
        Ok(Self {
            ticker,
            contract_address,
            cusip,
            pair,
        })
    }
}

/// Validated input for [`AssetRegistry::create`] and [`AssetRegistry::update`].
///
/// An update is a full replacement: fields left unset here are cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDraft {
    identity: AssetIdentity,
    asset_type_id: i32,
    name: Option<String>,
    chain_id: Option<i32>,
    decimals: Option<i32>,
    is_default_quote: bool,
    ignore_market_data: bool,
}

impl AssetDraft {
    /// Validate `identity` and `asset_type_id`.
    pub fn new(identity: AssetIdentity, asset_type_id: i32) -> Result<Self> {
        positive_id("asset_type_id", asset_type_id)?;
        Ok(Self {
            identity: identity.normalized()?,
            asset_type_id,
            name: None,
            chain_id: None,
            decimals: None,
            is_default_quote: false,
            ignore_market_data: false,
        })
    }

    /// Display name. Blank names are dropped.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.trim().is_empty()).then(|| name.trim().to_string());
        self
    }

    /// Chain the contract lives on.
    pub fn chain(mut self, chain_id: i32) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Token decimals.
    pub fn decimals(mut self, decimals: i32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Mark as the default quote currency for its type.
    pub fn default_quote(mut self, yes: bool) -> Self {
        self.is_default_quote = yes;
        self
    }

    /// Start with market data suppressed.
    pub fn ignore_market_data(mut self, yes: bool) -> Self {
        self.ignore_market_data = yes;
        self
    }

    /// Normalized identity keys.
    pub fn identity(&self) -> &AssetIdentity {
        &self.identity
    }

    /// Asset type.
    pub fn asset_type_id(&self) -> i32 {
        self.asset_type_id
    }
}

/// Registry operations.
///
/// Lookups return `None` / empty for unknown keys. `id` arguments must be positive.
pub trait AssetRegistry {
    /// Find the asset identified by `key`.
    fn resolve(&self, conn: &mut SqliteConnection, key: &AssetKey) -> Result<Option<Asset>>;

    /// Fetch by surrogate id.
    fn get(&self, conn: &mut SqliteConnection, id: i32) -> Result<Option<Asset>>;

    /// Assets matching `query`, in the query's order and page.
    fn list_tradable(&self, conn: &mut SqliteConnection, query: &AssetQuery)
    -> Result<Vec<Asset>>;

    /// Insert a new asset. Any key already taken yields [`Error::ConflictingKey`].
    fn create(&self, conn: &mut SqliteConnection, draft: &AssetDraft, actor: &str)
    -> Result<Asset>;

    /// Replace every mutable field of `id` with `draft`.
    fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        draft: &AssetDraft,
        actor: &str,
    ) -> Result<Option<Asset>>;

    /// Suppress market data for `id`. The row is kept.
    fn retire(&self, conn: &mut SqliteConnection, id: i32, actor: &str) -> Result<Option<Asset>> {
        self.set_ignore_market_data(conn, id, true, actor)
    }

    /// Set or clear the market-data suppression flag.
    fn set_ignore_market_data(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        ignore: bool,
        actor: &str,
    ) -> Result<Option<Asset>>;

    /// Administrative hard delete; cascades to identifiers and observations.
    /// Returns the number of assets removed (0 or 1).
    fn purge(&self, conn: &mut SqliteConnection, id: i32) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_needs_a_key() {
        let err = AssetDraft::new(AssetIdentity::default(), 1).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = AssetDraft::new(AssetIdentity::ticker("   "), 1).unwrap_err();
        assert!(err.to_string().contains("ticker"));
    }

    #[test]
    fn pair_legs_must_differ() {
        let id = AssetIdentity::ticker("ETH/USD").with_pair(4, 4);
        assert!(AssetDraft::new(id, 3).is_err());
        let id = AssetIdentity::ticker("ETH/USD").with_pair(4, 0);
        assert!(AssetDraft::new(id, 3).is_err());
    }

    #[test]
    fn keys_are_normalized() {
        let d = AssetDraft::new(AssetIdentity::ticker(" ETH ").with_contract(" 0xABcd "), 1).unwrap();
        assert_eq!(d.identity().ticker_str(), Some("ETH"));
        assert_eq!(d.identity().contract_address(), Some("0xabcd"));
        assert_eq!(
            AssetKey::ContractAddress("0xABCD".into()).normalized().unwrap(),
            AssetKey::ContractAddress("0xabcd".into())
        );
        assert!(AssetKey::Cusip(String::new()).normalized().is_err());
    }

    #[test]
    fn non_positive_type_is_rejected() {
        assert!(AssetDraft::new(AssetIdentity::ticker("BTC"), 0).is_err());
    }
}
