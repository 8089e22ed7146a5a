use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::catalog::sync::{
    read::Current,
    want::{IdentifierEntry, Wanted},
};

/// What needs to change to make the store match the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    /// Sources to insert or rename: id -> (code, name).
    pub sources_upsert: BTreeMap<i32, (String, String)>,
    /// Intervals to insert or change: id -> (code, span_days).
    pub intervals_upsert: BTreeMap<i32, (String, i32)>,
    /// Identifiers to insert or change, keyed by (asset id, source id).
    pub identifiers_upsert: BTreeMap<(i32, i32), IdentifierEntry>,

    /// Sources to delete (prune only): id -> code.
    pub sources_delete: BTreeMap<i32, String>,
    /// Intervals to delete (prune only): id -> code.
    pub intervals_delete: BTreeMap<i32, String>,
    /// Identifiers to delete (prune only).
    pub identifiers_delete: BTreeMap<(i32, i32), IdentifierEntry>,

    /// Catalog entries skipped because their asset is not registered.
    pub skipped: BTreeSet<(String, String)>,
}

impl CatalogDiff {
    /// True if there is nothing to upsert or delete.
    pub fn is_noop(&self) -> bool {
        self.sources_upsert.is_empty()
            && self.intervals_upsert.is_empty()
            && self.identifiers_upsert.is_empty()
            && self.sources_delete.is_empty()
            && self.intervals_delete.is_empty()
            && self.identifiers_delete.is_empty()
    }

    /// Number of rows the diff writes or deletes.
    pub fn change_count(&self) -> usize {
        self.sources_upsert.len()
            + self.intervals_upsert.len()
            + self.identifiers_upsert.len()
            + self.sources_delete.len()
            + self.intervals_delete.len()
            + self.identifiers_delete.len()
    }
}

impl fmt::Display for CatalogDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // helper: section header with underline
        let mut wrote_any = false;
        let mut section = |title: &str,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))?;
            body(f)?;
            wrote_any = true;
            Ok(())
        };

        // UPSERTS
        if !self.sources_upsert.is_empty() {
            section("Sources (UPSERT)", &mut |f| {
                for (id, (code, name)) in &self.sources_upsert {
                    writeln!(f, "+ {id} {code}  \"{name}\"")?;
                }
                Ok(())
            })?;
        }
        if !self.intervals_upsert.is_empty() {
            section("Intervals (UPSERT)", &mut |f| {
                for (id, (code, span)) in &self.intervals_upsert {
                    writeln!(f, "+ {id} {code}  ({span}d)")?;
                }
                Ok(())
            })?;
        }
        if !self.identifiers_upsert.is_empty() {
            section("Identifiers (UPSERT)", &mut |f| {
                for e in self.identifiers_upsert.values() {
                    writeln!(f, "+ {}  {} → {}", e.source_code, e.asset_label, e.identifier)?;
                }
                Ok(())
            })?;
        }

        // DELETES, in apply order
        if !self.identifiers_delete.is_empty() {
            section("Identifiers (DELETE)", &mut |f| {
                for e in self.identifiers_delete.values() {
                    writeln!(f, "- {}  {} ({})", e.source_code, e.asset_label, e.identifier)?;
                }
                Ok(())
            })?;
        }
        if !self.intervals_delete.is_empty() {
            section("Intervals (DELETE)", &mut |f| {
                for (id, code) in &self.intervals_delete {
                    writeln!(f, "- {id} {code}")?;
                }
                Ok(())
            })?;
        }
        if !self.sources_delete.is_empty() {
            section("Sources (DELETE)", &mut |f| {
                for (id, code) in &self.sources_delete {
                    writeln!(f, "- {id} {code}")?;
                }
                Ok(())
            })?;
        }

        if !self.skipped.is_empty() {
            section("Unregistered assets (SKIPPED)", &mut |f| {
                for (code, key) in &self.skipped {
                    writeln!(f, "? {code}  {key}")?;
                }
                Ok(())
            })?;
        }

        if !wrote_any {
            write!(f, "No changes")
        } else {
            Ok(())
        }
    }
}

fn changed<K: Ord + Clone, V: PartialEq + Clone>(
    want: &BTreeMap<K, V>,
    have: &BTreeMap<K, V>,
) -> BTreeMap<K, V> {
    want.iter()
        .filter(|(k, v)| have.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn stale<K: Ord + Clone, V, W: Clone>(
    want: &BTreeMap<K, V>,
    have: &BTreeMap<K, W>,
) -> BTreeMap<K, W> {
    have.iter()
        .filter(|(k, _)| !want.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub fn make_diff(w: &Wanted, c: &Current, prune: bool) -> CatalogDiff {
    let mut d = CatalogDiff {
        sources_upsert: changed(&w.sources, &c.sources),
        intervals_upsert: changed(&w.intervals, &c.intervals),
        identifiers_upsert: changed(&w.identifiers, &c.identifiers),
        skipped: w.unresolved.clone(),
        ..Default::default()
    };

    // prunes (only when requested)
    if prune {
        d.sources_delete = stale(&w.sources, &c.sources)
            .into_iter()
            .map(|(id, (code, _))| (id, code))
            .collect();
        d.intervals_delete = stale(&w.intervals, &c.intervals)
            .into_iter()
            .map(|(id, (code, _))| (id, code))
            .collect();
        d.identifiers_delete = stale(&w.identifiers, &c.identifiers);
    }

    d
}
