use chrono::NaiveDate;
use diesel::dsl::{max, min, sql};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Integer};

use crate::coverage::{CoverageTracker, CoverageWindow, gaps};
use crate::dates::DateSpan;
use crate::error::{Error, Result, positive_id};
use crate::models::observation::ObservationKey;
use crate::repo::SqliteRepo;
use crate::schema::{market_data_intervals, market_observations as mo};

impl CoverageTracker for SqliteRepo {
    fn coverage_window(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
    ) -> Result<Option<CoverageWindow>> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        let (lo, hi): (Option<NaiveDate>, Option<NaiveDate>) = mo::table
            .filter(mo::asset_id.eq(asset_id))
            .filter(mo::market_data_type_id.eq(market_data_type_id))
            .select((min(mo::start_date), max(mo::start_date)))
            .first(conn)?;
        let window = lo.zip(hi).map(|(min_date, max_date)| CoverageWindow {
            asset_id,
            market_data_type_id,
            min_date,
            max_date,
        });
        if window.is_none() {
            tracing::debug!(asset_id, market_data_type_id, "series never ingested");
        }
        Ok(window)
    }

    fn find_gap_days(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        threshold_days: i32,
    ) -> Result<Vec<ObservationKey>> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        if threshold_days < 0 {
            return Err(Error::InvalidArgument(format!(
                "threshold_days must be >= 0, got {threshold_days}"
            )));
        }
        let keys = mo::table
            .inner_join(market_data_intervals::table)
            .filter(mo::asset_id.eq(asset_id))
            .filter(mo::market_data_type_id.eq(market_data_type_id))
            .filter(
                sql::<Bool>(
                    "abs((julianday(market_observations.end_date) \
                     - julianday(market_observations.start_date)) \
                     - market_data_intervals.span_days) > ",
                )
                .bind::<Integer, _>(threshold_days),
            )
            .select(ObservationKey::as_select())
            .order(mo::start_date.asc())
            .load(conn)?;
        Ok(keys)
    }

    fn missing_spans(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        desired: DateSpan,
    ) -> Result<Vec<DateSpan>> {
        positive_id("asset_id", asset_id)?;
        positive_id("market_data_type_id", market_data_type_id)?;
        let rows: Vec<(NaiveDate, NaiveDate)> = mo::table
            .filter(mo::asset_id.eq(asset_id))
            .filter(mo::market_data_type_id.eq(market_data_type_id))
            .filter(mo::start_date.le(desired.end()))
            .filter(mo::end_date.ge(desired.start()))
            .select((mo::start_date, mo::end_date))
            .load(conn)?;
        let covered = gaps::covered_days(&rows, desired);
        Ok(gaps::missing_spans(&covered, desired))
    }
}
