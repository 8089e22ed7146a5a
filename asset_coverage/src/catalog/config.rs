//! Catalog configuration: parsing, normalization, and loading.
//!
//! The catalog is a TOML file declaring:
//! - Sources (provider code, externally assigned id, human-readable name)
//! - The identifier each source uses for an asset, keyed by exactly one of the
//!   asset's ticker, contract address, or CUSIP
//! - Market-data intervals (id + code such as `"1D"` or `"7D"`)
//!
//! ```toml
//! [sources.coingecko]
//! id = 3
//! name = "CoinGecko"
//!
//! [[sources.coingecko.identifiers]]
//! ticker = "ETH"
//! identifier = "ethereum"
//!
//! [[sources.coingecko.identifiers]]
//! contract = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
//! identifier = "usd-coin"
//!
//! [[intervals]]
//! id = 1
//! code = "1D"
//! ```
//!
//! Key behaviors:
//! - Normalization lowercases and trims source codes, trims names and identifiers,
//!   lowercases contract addresses, and canonicalizes interval codes.
//! - Identifiers are de-duplicated per (source, asset key); the first entry wins.
//! - Duplicate source codes or ids, and duplicate interval ids or codes, are errors.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_catalog_str`]
//! - Parse + normalize from a file path: [`load_catalog_path`]
//! - Normalize an in-memory catalog: [`normalize_catalog`]

use std::collections::HashSet;

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::interval::Interval;
use crate::registry::AssetKey;

/// Top-level catalog: sources by code, plus intervals.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Map of source code -> configuration.
    ///
    /// Codes are normalized (trimmed, lowercase) by [`normalize_catalog`].
    #[serde(default)]
    pub sources: IndexMap<String, SourceCfg>,
    /// Interval definitions.
    #[serde(default)]
    pub intervals: Vec<IntervalCfg>,
}

/// One source's configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceCfg {
    /// Externally assigned source id; positive and unique.
    pub id: i32,
    /// Human-readable name.
    pub name: String,
    /// What this source calls each asset.
    #[serde(default)]
    pub identifiers: Vec<IdentifierCfg>,
}

/// One asset's identifier at a source. Exactly one of `ticker`, `contract`, `cusip`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentifierCfg {
    /// Asset ticker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// Asset contract address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Asset CUSIP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cusip: Option<String>,
    /// Provider-specific identifier.
    pub identifier: String,
}

impl IdentifierCfg {
    /// The registry key this entry names.
    pub fn asset_key(&self) -> anyhow::Result<AssetKey> {
        match (&self.ticker, &self.contract, &self.cusip) {
            (Some(t), None, None) => Ok(AssetKey::Ticker(t.clone())),
            (None, Some(c), None) => Ok(AssetKey::ContractAddress(c.clone())),
            (None, None, Some(c)) => Ok(AssetKey::Cusip(c.clone())),
            _ => bail!(
                "identifier {:?} must name exactly one of ticker, contract, cusip",
                self.identifier
            ),
        }
    }
}

/// Interval definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalCfg {
    /// Interval id referenced by observations.
    pub id: i32,
    /// Interval code, parsed by [`Interval`].
    pub code: String,
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Source keys changed by lowercasing/trimming.
    pub sources_renamed: usize,
    /// Identifier entries dropped as duplicates of an earlier (source, asset key).
    pub identifiers_deduped: usize,
    /// Interval entries dropped as exact repeats.
    pub intervals_deduped: usize,
}

/// What a sync does with an identifier whose asset is not in the registry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UnknownAssetPolicy {
    /// Skip the entry and list it in the diff.
    #[default]
    Drop,
    /// Fail the sync.
    Error,
}

fn normalized_key(key: &AssetKey) -> anyhow::Result<AssetKey> {
    key.normalized().map_err(anyhow::Error::from)
}

/// Normalize a catalog in place.
///
/// Errors:
/// - Empty or duplicate source codes after normalization; non-positive or repeated ids
/// - Identifier entries without exactly one key, or with empty fields after trimming
/// - Unparseable interval codes; one id or code declared twice with different values
pub fn normalize_catalog(cat: &mut Catalog) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let mut rebuilt: IndexMap<String, SourceCfg> = IndexMap::new();
    let mut seen_ids = HashSet::new();
    for (raw_code, mut cfg) in std::mem::take(&mut cat.sources) {
        let code = raw_code.trim().to_lowercase();
        if code.is_empty() {
            bail!("source code cannot be empty after trimming");
        }
        if code != raw_code {
            report.sources_renamed += 1;
        }
        if rebuilt.contains_key(&code) {
            bail!("duplicate source code after normalization: {code}");
        }
        if cfg.id <= 0 {
            bail!("source {code}: id must be > 0, got {}", cfg.id);
        }
        if !seen_ids.insert(cfg.id) {
            bail!("source {code}: id {} is used by another source", cfg.id);
        }
        cfg.name = cfg.name.trim().to_string();

        let mut seen_keys = HashSet::new();
        let mut identifiers = Vec::with_capacity(cfg.identifiers.len());
        for mut ident in std::mem::take(&mut cfg.identifiers) {
            let key = normalized_key(&ident.asset_key()?)
                .with_context(|| format!("source {code}: identifier {:?}", ident.identifier))?;
            ident.identifier = ident.identifier.trim().to_string();
            if ident.identifier.is_empty() {
                bail!("source {code}: identifier cannot be empty after trimming");
            }
            match &key {
                AssetKey::Ticker(t) => ident.ticker = Some(t.clone()),
                AssetKey::ContractAddress(c) => ident.contract = Some(c.clone()),
                AssetKey::Cusip(c) => ident.cusip = Some(c.clone()),
                AssetKey::Pair { .. } => {}
            }
            if seen_keys.insert(key) {
                identifiers.push(ident);
            } else {
                report.identifiers_deduped += 1;
            }
        }
        cfg.identifiers = identifiers;
        rebuilt.insert(code, cfg);
    }
    cat.sources = rebuilt;

    let mut intervals: Vec<IntervalCfg> = Vec::with_capacity(cat.intervals.len());
    for mut iv in std::mem::take(&mut cat.intervals) {
        if iv.id <= 0 {
            bail!("interval {}: id must be > 0", iv.code);
        }
        let parsed: Interval = iv
            .code
            .parse()
            .with_context(|| format!("interval {}: bad code {:?}", iv.id, iv.code))?;
        iv.code = parsed.to_string();
        if intervals.contains(&iv) {
            report.intervals_deduped += 1;
            continue;
        }
        if let Some(other) = intervals.iter().find(|o| o.id == iv.id || o.code == iv.code) {
            bail!(
                "interval {} ({}) conflicts with interval {} ({})",
                iv.id,
                iv.code,
                other.id,
                other.code
            );
        }
        intervals.push(iv);
    }
    cat.intervals = intervals;

    Ok(report)
}

/// Parse and normalize a catalog from a TOML string.
pub fn load_catalog_str(toml_str: &str) -> anyhow::Result<Catalog> {
    let mut cat: Catalog = from_str(toml_str).context("failed to parse catalog TOML")?;
    let report = normalize_catalog(&mut cat).context("normalize_catalog failed")?;
    tracing::debug!(?report, "catalog normalized");
    Ok(cat)
}

/// Read a catalog TOML file from disk, parse, and normalize it.
pub fn load_catalog_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Catalog> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read catalog file {}", path.as_ref().display()))?;
    load_catalog_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"
        [sources." CoinGecko "]
        id = 3
        name = " CoinGecko "

        [[sources." CoinGecko ".identifiers]]
        ticker = " ETH "
        identifier = " ethereum "

        [[sources." CoinGecko ".identifiers]]
        ticker = "ETH"
        identifier = "weth"

        [[sources." CoinGecko ".identifiers]]
        contract = "0xA0B8"
        identifier = "usd-coin"

        [[intervals]]
        id = 1
        code = "1d"

        [[intervals]]
        id = 1
        code = "1D"

        [[intervals]]
        id = 2
        code = "7D"
    "#;

    #[test]
    fn normalizes_codes_keys_and_intervals() {
        let mut cat: Catalog = toml::from_str(RAW).unwrap();
        let report = normalize_catalog(&mut cat).unwrap();
        assert_eq!(
            report,
            NormalizationReport {
                sources_renamed: 1,
                identifiers_deduped: 1,
                intervals_deduped: 1,
            }
        );

        let (code, cfg) = cat.sources.first().unwrap();
        assert_eq!(code, "coingecko");
        assert_eq!(cfg.name, "CoinGecko");
        assert_eq!(cfg.identifiers.len(), 2);
        assert_eq!(cfg.identifiers[0].ticker.as_deref(), Some("ETH"));
        assert_eq!(cfg.identifiers[0].identifier, "ethereum"); // first wins
        assert_eq!(cfg.identifiers[1].contract.as_deref(), Some("0xa0b8"));
        assert_eq!(
            cat.intervals,
            vec![
                IntervalCfg { id: 1, code: "1D".into() },
                IntervalCfg { id: 2, code: "7D".into() },
            ]
        );
    }

    #[test]
    fn identifier_needs_exactly_one_key() {
        let toml_str = r#"
            [sources.kaiko]
            id = 7
            name = "Kaiko"
            [[sources.kaiko.identifiers]]
            ticker = "BTC"
            cusip = "123456789"
            identifier = "btc"
        "#;
        let mut cat: Catalog = toml::from_str(toml_str).unwrap();
        let err = normalize_catalog(&mut cat).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn duplicate_source_collision_errors() {
        let mut cat: Catalog = toml::from_str(RAW).unwrap();
        let cfg = cat.sources.get_index(0).unwrap().1.clone();
        cat.sources.insert("coingecko".into(), SourceCfg { id: 9, ..cfg });
        let err = normalize_catalog(&mut cat).unwrap_err();
        assert!(err.to_string().contains("duplicate source code"));
    }

    #[test]
    fn conflicting_interval_errors() {
        let mut cat = Catalog {
            intervals: vec![
                IntervalCfg { id: 1, code: "1D".into() },
                IntervalCfg { id: 1, code: "7D".into() },
            ],
            ..Catalog::default()
        };
        let err = normalize_catalog(&mut cat).unwrap_err();
        assert!(err.to_string().contains("conflicts"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_catalog_str("[sources.a]\nid = 1\nname = \"A\"\nurl = \"x\"").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sources_lowercased_and_unique(
            names in proptest::collection::vec("[a-zA-Z]{1,8}", 1..5),
        ) {
            let mut cat = Catalog::default();
            for (i, n) in names.iter().enumerate() {
                let key = if i % 2 == 0 { n.to_uppercase() } else { format!("  {n} ") };
                cat.sources.insert(key, SourceCfg {
                    id: i as i32 + 1,
                    name: "X".into(),
                    identifiers: vec![],
                });
            }

            if normalize_catalog(&mut cat).is_ok() {
                prop_assert!(cat.sources.keys().all(|k| k.chars().all(|c| !c.is_uppercase())));
                prop_assert!(cat.sources.keys().all(|k| k.trim() == k));
            }
        }
    }
}
