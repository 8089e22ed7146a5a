//! upsert / delete statements for catalog-owned rows
use chrono::Utc;
use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};

use crate::error::{Result, non_empty, positive_id};
use crate::models::{IntervalRow, NewAssetSource, NewSource, Source};
use crate::schema::{asset_sources, market_data_intervals, sources};

/// upsert a source by id; code and name follow the latest write
pub fn upsert_source(conn: &mut SqliteConnection, id: i32, code: &str, name: &str) -> Result<usize> {
    positive_id("source_id", id)?;
    let code = non_empty("source code", code)?.to_lowercase();
    let row = NewSource {
        id,
        code: &code,
        name: name.trim(),
    };
    Ok(insert_into(sources::table)
        .values(&row)
        .on_conflict(sources::id)
        .do_update()
        .set(&row)
        .execute(conn)?)
}

/// upsert an interval by id
pub fn upsert_interval(conn: &mut SqliteConnection, row: &IntervalRow) -> Result<usize> {
    positive_id("interval_id", row.id)?;
    Ok(insert_into(market_data_intervals::table)
        .values(row)
        .on_conflict(market_data_intervals::id)
        .do_update()
        .set(row)
        .execute(conn)?)
}

/// identifier upsert, same statement as `SourceMap::set_identifier` minus the transaction
pub fn upsert_identifier(
    conn: &mut SqliteConnection,
    asset_id: i32,
    source_id: i32,
    identifier: &str,
) -> Result<usize> {
    let now = Utc::now().naive_utc();
    let row = NewAssetSource {
        asset_id,
        source_id,
        source_identifier: identifier,
        updated_at: now,
    };
    Ok(insert_into(asset_sources::table)
        .values(&row)
        .on_conflict((asset_sources::asset_id, asset_sources::source_id))
        .do_update()
        .set((
            asset_sources::source_identifier.eq(identifier),
            asset_sources::updated_at.eq(now),
        ))
        .execute(conn)?)
}

/// delete one identifier
pub fn delete_identifier(conn: &mut SqliteConnection, asset_id: i32, source_id: i32) -> Result<usize> {
    Ok(diesel::delete(asset_sources::table.find((asset_id, source_id))).execute(conn)?)
}

/// delete an interval; observations still pointing at it block this
pub fn delete_interval(conn: &mut SqliteConnection, id: i32) -> Result<usize> {
    Ok(diesel::delete(market_data_intervals::table.find(id)).execute(conn)?)
}

/// delete a source; its identifiers cascade, its observations block this
pub fn delete_source(conn: &mut SqliteConnection, id: i32) -> Result<usize> {
    Ok(diesel::delete(sources::table.find(id)).execute(conn)?)
}

/// all sources, by id
pub fn list_sources(conn: &mut SqliteConnection) -> Result<Vec<Source>> {
    Ok(sources::table
        .select(Source::as_select())
        .order(sources::id.asc())
        .load(conn)?)
}

/// all intervals, by id
pub fn list_intervals(conn: &mut SqliteConnection) -> Result<Vec<IntervalRow>> {
    Ok(market_data_intervals::table
        .select(IntervalRow::as_select())
        .order(market_data_intervals::id.asc())
        .load(conn)?)
}
