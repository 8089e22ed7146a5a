use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use diesel::SqliteConnection;

use crate::catalog::config::{Catalog, UnknownAssetPolicy};
use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::registry::{AssetKey, AssetRegistry};
use crate::repo::SqliteRepo;

/// One identifier row with the labels used for display.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdentifierEntry {
    /// Source code.
    pub source_code: String,
    /// [`crate::models::Asset::label`] of the asset.
    pub asset_label: String,
    /// Provider-specific identifier.
    pub identifier: String,
}

/// Desired state built from a normalized catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wanted {
    /// source id -> (code, name)
    pub sources: BTreeMap<i32, (String, String)>,
    /// interval id -> (code, span_days)
    pub intervals: BTreeMap<i32, (String, i32)>,
    /// (asset id, source id) -> identifier
    pub identifiers: BTreeMap<(i32, i32), IdentifierEntry>,
    /// (source code, key) entries whose asset is not registered
    pub unresolved: BTreeSet<(String, String)>,
}

fn key_label(key: &AssetKey) -> String {
    match key {
        AssetKey::Ticker(t) => format!("ticker {t}"),
        AssetKey::ContractAddress(c) => format!("contract {c}"),
        AssetKey::Cusip(c) => format!("cusip {c}"),
        AssetKey::Pair { base, quote } => format!("pair {base}/{quote}"),
    }
}

/// Resolve every identifier's asset through the registry.
///
/// Two entries of one source that resolve to the same asset must agree on the
/// identifier. Otherwise the catalog is ambiguous and this returns
/// [`Error::InvalidArgument`] under either policy.
pub fn wanted_from_catalog(
    conn: &mut SqliteConnection,
    cat: &Catalog,
    policy: UnknownAssetPolicy,
) -> Result<Wanted> {
    let repo = SqliteRepo::new();
    let mut w = Wanted::default();
    // (asset id, source id) -> key label of the catalog entry that claimed it
    let mut named_by: BTreeMap<(i32, i32), String> = BTreeMap::new();

    for iv in &cat.intervals {
        let parsed: Interval = iv
            .code
            .parse()
            .map_err(|e| Error::InvalidArgument(format!("interval {}: {e}", iv.id)))?;
        w.intervals.insert(iv.id, (iv.code.clone(), parsed.span_days()));
    }

    for (code, cfg) in &cat.sources {
        w.sources.insert(cfg.id, (code.clone(), cfg.name.clone()));
        for ident in &cfg.identifiers {
            let key = ident
                .asset_key()
                .map_err(|e| Error::InvalidArgument(format!("source {code}: {e}")))?;
            match repo.resolve(conn, &key)? {
                Some(asset) => {
                    let entry = IdentifierEntry {
                        source_code: code.clone(),
                        asset_label: asset.label(),
                        identifier: ident.identifier.clone(),
                    };
                    match w.identifiers.entry((asset.id, cfg.id)) {
                        Entry::Vacant(slot) => {
                            named_by.insert((asset.id, cfg.id), key_label(&key));
                            slot.insert(entry);
                        }
                        // repeats that agree collapse into one row
                        Entry::Occupied(slot) if slot.get().identifier == entry.identifier => {}
                        Entry::Occupied(slot) => {
                            let first = named_by.get(&(asset.id, cfg.id)).map_or("", String::as_str);
                            return Err(Error::InvalidArgument(format!(
                                "source {code}: {} and {} both name asset {} with identifiers {:?} and {:?}",
                                first,
                                key_label(&key),
                                entry.asset_label,
                                slot.get().identifier,
                                entry.identifier
                            )));
                        }
                    }
                }
                None => match policy {
                    UnknownAssetPolicy::Drop => {
                        tracing::warn!(source = %code, key = %key_label(&key), "catalog asset not registered, skipped");
                        w.unresolved.insert((code.clone(), key_label(&key)));
                    }
                    UnknownAssetPolicy::Error => {
                        return Err(Error::InvalidArgument(format!(
                            "source {code}: no registered asset for {}",
                            key_label(&key)
                        )));
                    }
                },
            }
        }
    }

    Ok(w)
}
