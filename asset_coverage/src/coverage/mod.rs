//! Coverage tracking for (asset, market-data type) series.
//!
//! Two kinds of gap are surfaced:
//! - **Skew** ([`CoverageTracker::find_gap_days`]): a row whose stored
//!   `end_date - start_date` differs from its interval's span by more than a
//!   threshold, i.e. a stitched or malformed ingestion window that should be
//!   re-fetched. This is the store-side gap signal.
//! - **Missing days** ([`CoverageTracker::missing_spans`]): days of a desired range
//!   that no row covers. Computed client-side from the rows in range (see
//!   [`gaps`]), for ingestion jobs planning a backfill.
//!
//! A series that was never ingested has no [`CoverageWindow`] (`None`), which is
//! distinct from a failed query.

pub mod gaps;
mod repo;

use chrono::NaiveDate;
use diesel::SqliteConnection;

use crate::dates::DateSpan;
use crate::error::Result;
use crate::models::observation::ObservationKey;

/// The ingested span of one series: min and max `start_date` over its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageWindow {
    /// Asset.
    pub asset_id: i32,
    /// Market-data type.
    pub market_data_type_id: i32,
    /// Earliest start date.
    pub min_date: NaiveDate,
    /// Latest start date.
    pub max_date: NaiveDate,
}

impl CoverageWindow {
    /// First date an incremental backfill should request: the day after `max_date`.
    pub fn next_start(&self) -> Option<NaiveDate> {
        self.max_date.succ_opt()
    }

    /// `[min_date, max_date]` as a span.
    pub fn span(&self) -> DateSpan {
        // min <= max holds for any aggregate over at least one row
        DateSpan::new(self.min_date, self.max_date).unwrap_or(DateSpan::day(self.min_date))
    }
}

/// Coverage queries.
pub trait CoverageTracker {
    /// Covered span of (asset, type), or `None` if it has no rows.
    fn coverage_window(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
    ) -> Result<Option<CoverageWindow>>;

    /// Keys of rows whose span is off its interval's expected span by more than
    /// `threshold_days`, ordered by start date.
    fn find_gap_days(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        threshold_days: i32,
    ) -> Result<Vec<ObservationKey>>;

    /// Uncovered sub-spans of `desired`, coalesced and in date order.
    fn missing_spans(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        desired: DateSpan,
    ) -> Result<Vec<DateSpan>>;
}
