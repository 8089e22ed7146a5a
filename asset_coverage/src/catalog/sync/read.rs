use std::collections::BTreeMap;

use diesel::prelude::*;

use crate::catalog::sync::want::IdentifierEntry;
use crate::error::Result;
use crate::models::Asset;
use crate::schema::{asset_sources, assets, market_data_intervals, sources};

/// Store state in the same shape as [`super::want::Wanted`].
pub struct Current {
    pub sources: BTreeMap<i32, (String, String)>,
    pub intervals: BTreeMap<i32, (String, i32)>,
    pub identifiers: BTreeMap<(i32, i32), IdentifierEntry>,
}

pub fn read_current(conn: &mut SqliteConnection) -> Result<Current> {
    let sources = sources::table
        .select((sources::id, sources::code, sources::name))
        .load::<(i32, String, String)>(conn)?
        .into_iter()
        .map(|(id, code, name)| (id, (code, name)))
        .collect();

    let intervals = market_data_intervals::table
        .select((
            market_data_intervals::id,
            market_data_intervals::code,
            market_data_intervals::span_days,
        ))
        .load::<(i32, String, i32)>(conn)?
        .into_iter()
        .map(|(id, code, span)| (id, (code, span)))
        .collect();

    let identifiers = asset_sources::table
        .inner_join(assets::table)
        .inner_join(sources::table)
        .select((
            asset_sources::source_id,
            asset_sources::source_identifier,
            sources::code,
            Asset::as_select(),
        ))
        .load::<(i32, String, String, Asset)>(conn)?
        .into_iter()
        .map(|(source_id, identifier, source_code, asset)| {
            (
                (asset.id, source_id),
                IdentifierEntry {
                    source_code,
                    asset_label: asset.label(),
                    identifier,
                },
            )
        })
        .collect();

    Ok(Current {
        sources,
        intervals,
        identifiers,
    })
}
