use diesel::prelude::*;

use crate::catalog::repo::*;
use crate::catalog::sync::diff::CatalogDiff;
use crate::error::Result;
use crate::models::IntervalRow;

/// Apply the diff inside the current transaction.
/// Note: delete order honors FKs: identifiers -> intervals -> sources.
pub fn apply_diff(conn: &mut SqliteConnection, diff: &CatalogDiff) -> Result<()> {
    // Upserts
    for (id, (code, name)) in &diff.sources_upsert {
        upsert_source(conn, *id, code, name)?;
    }
    for (id, (code, span_days)) in &diff.intervals_upsert {
        upsert_interval(
            conn,
            &IntervalRow {
                id: *id,
                code: code.clone(),
                span_days: *span_days,
            },
        )?;
    }
    for ((asset_id, source_id), e) in &diff.identifiers_upsert {
        upsert_identifier(conn, *asset_id, *source_id, &e.identifier)?;
    }

    // Prunes
    for (asset_id, source_id) in diff.identifiers_delete.keys() {
        delete_identifier(conn, *asset_id, *source_id)?;
    }
    for id in diff.intervals_delete.keys() {
        delete_interval(conn, *id)?;
    }
    for id in diff.sources_delete.keys() {
        delete_source(conn, *id)?;
    }
    Ok(())
}
