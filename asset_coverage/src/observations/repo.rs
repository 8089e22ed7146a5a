use chrono::NaiveDate;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Double;

use crate::dates::DateSpan;
use crate::db::write_tx;
use crate::error::{Error, Result, positive_id};
use crate::models::observation::{MarketObservation, ObservationRow};
use crate::observations::{ObservationStore, ReplaceOutcome};
use crate::repo::SqliteRepo;
use crate::schema::market_observations as mo;

fn validated_rows(observations: &[MarketObservation]) -> Result<Vec<ObservationRow>> {
    observations
        .iter()
        .map(|o| {
            o.validate()?;
            Ok(ObservationRow::from(o))
        })
        .collect()
}

// No transaction here; callers wrap it.
fn insert_chunked(conn: &mut SqliteConnection, rows: &[ObservationRow], chunk: usize) -> Result<usize> {
    let mut inserted = 0;
    for part in rows.chunks(chunk.max(1)) {
        inserted += diesel::insert_into(mo::table).values(part).execute(conn)?;
    }
    if inserted != rows.len() {
        return Err(Error::BulkLoadMismatch {
            expected: rows.len(),
            inserted,
        });
    }
    Ok(inserted)
}

fn delete_window(
    conn: &mut SqliteConnection,
    asset_id: i32,
    market_data_type_id: i32,
    span: DateSpan,
) -> Result<usize> {
    Ok(diesel::delete(
        mo::table
            .filter(mo::asset_id.eq(asset_id))
            .filter(mo::market_data_type_id.eq(market_data_type_id))
            .filter(mo::start_date.between(span.start(), span.end())),
    )
    .execute(conn)?)
}

fn to_observations(rows: Vec<ObservationRow>) -> Result<Vec<MarketObservation>> {
    rows.into_iter().map(MarketObservation::try_from).collect()
}

impl ObservationStore for SqliteRepo {
    fn upsert_batch(
        &self,
        conn: &mut SqliteConnection,
        observations: &[MarketObservation],
    ) -> Result<usize> {
        if observations.is_empty() {
            return Ok(0);
        }
        let rows = validated_rows(observations)?;
        let n = write_tx(conn, |conn| insert_chunked(conn, &rows, self.bulk_chunk_size))
            .inspect_err(|e| tracing::warn!(rows = rows.len(), error = %e, "bulk load rolled back"))?;
        tracing::info!(rows = n, chunk = self.bulk_chunk_size, "observations loaded");
        Ok(n)
    }

    fn upsert(&self, conn: &mut SqliteConnection, observation: &MarketObservation) -> Result<()> {
        observation.validate()?;
        let row = ObservationRow::from(observation);
        write_tx(conn, |conn| {
            diesel::insert_into(mo::table)
                .values(&row)
                .on_conflict((mo::asset_id, mo::market_data_type_id, mo::start_date))
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(())
        })?;
        tracing::debug!(
            asset_id = row.asset_id,
            market_data_type_id = row.market_data_type_id,
            start_date = %row.start_date,
            "observation upserted"
        );
        Ok(())
    }

    fn replace_window(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        span: DateSpan,
        observations: &[MarketObservation],
    ) -> Result<ReplaceOutcome> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        for o in observations {
            if o.key.asset_id != asset_id || o.key.market_data_type_id != market_data_type_id {
                return Err(Error::InvalidArgument(format!(
                    "observation for ({}, {}) in a window for ({asset_id}, {market_data_type_id})",
                    o.key.asset_id, o.key.market_data_type_id
                )));
            }
            if !span.contains(o.key.start_date) {
                return Err(Error::InvalidArgument(format!(
                    "observation starting {} is outside {}..={}",
                    o.key.start_date,
                    span.start(),
                    span.end()
                )));
            }
        }
        let rows = validated_rows(observations)?;

        let outcome = write_tx(conn, |conn| {
            let deleted = delete_window(conn, asset_id, market_data_type_id, span)?;
            let inserted = insert_chunked(conn, &rows, self.bulk_chunk_size)?;
            Ok(ReplaceOutcome { deleted, inserted })
        })
        .inspect_err(|e| tracing::warn!(asset_id, market_data_type_id, error = %e, "window replace rolled back"))?;
        tracing::info!(
            asset_id,
            market_data_type_id,
            deleted = outcome.deleted,
            inserted = outcome.inserted,
            "window replaced"
        );
        Ok(outcome)
    }

    fn delete_range(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        span: DateSpan,
    ) -> Result<usize> {
        positive_id("asset_id", asset_id)?;
        let n = write_tx(conn, |conn| {
            Ok(diesel::delete(
                mo::table
                    .filter(mo::asset_id.eq(asset_id))
                    .filter(mo::start_date.between(span.start(), span.end())),
            )
            .execute(conn)?)
        })?;
        tracing::debug!(asset_id, from = %span.start(), to = %span.end(), rows = n, "range deleted");
        Ok(n)
    }

    fn delete_range_for_type(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        span: DateSpan,
    ) -> Result<usize> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        let n = write_tx(conn, |conn| delete_window(conn, asset_id, market_data_type_id, span))?;
        tracing::debug!(
            asset_id,
            market_data_type_id,
            from = %span.start(),
            to = %span.end(),
            rows = n,
            "range deleted"
        );
        Ok(n)
    }

    fn delete_as_of(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        date: NaiveDate,
    ) -> Result<usize> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        let n = write_tx(conn, |conn| {
            Ok(diesel::delete(mo::table.find((asset_id, market_data_type_id, date))).execute(conn)?)
        })?;
        tracing::debug!(asset_id, market_data_type_id, %date, rows = n, "as-of row deleted");
        Ok(n)
    }

    fn diff_by_interval_skew(
        &self,
        conn: &mut SqliteConnection,
        expected_days: i32,
    ) -> Result<Vec<MarketObservation>> {
        if expected_days < 0 {
            return Err(Error::InvalidArgument(format!(
                "expected_days must be >= 0, got {expected_days}"
            )));
        }
        let rows: Vec<ObservationRow> = mo::table
            .filter(sql::<Double>("julianday(end_date) - julianday(start_date)").ne(f64::from(expected_days)))
            .select(ObservationRow::as_select())
            .order((mo::asset_id.asc(), mo::market_data_type_id.asc(), mo::start_date.asc()))
            .load(conn)?;
        to_observations(rows)
    }

    fn observations(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        span: DateSpan,
    ) -> Result<Vec<MarketObservation>> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        let rows: Vec<ObservationRow> = mo::table
            .filter(mo::asset_id.eq(asset_id))
            .filter(mo::market_data_type_id.eq(market_data_type_id))
            .filter(mo::start_date.between(span.start(), span.end()))
            .select(ObservationRow::as_select())
            .order(mo::start_date.asc())
            .load(conn)?;
        to_observations(rows)
    }
}
