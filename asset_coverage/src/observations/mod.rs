//! Market observation store.
//!
//! Rows are keyed by (asset, market-data type, start date). Each key moves through
//! `Absent -> Ingested`, and back to `Absent` only through an explicit delete;
//! re-ingesting a key replaces the whole row.
//!
//! ## Write paths
//! - [`ObservationStore::upsert_batch`]: chunked bulk append for throughput. It does
//!   not resolve conflicts. **Precondition:** the caller has already deleted any
//!   overlapping rows. A duplicate key fails the whole batch with
//!   [`crate::Error::ConflictingKey`].
//! - [`ObservationStore::upsert`]: single-row overwrite. Absent measures become NULL.
//! - [`ObservationStore::replace_window`]: delete a window and bulk-load its
//!   replacement atomically. Prefer this to a hand-rolled delete + load.
//!
//! ## Transactions
//! Every write is one transaction (`BEGIN IMMEDIATE`). If the caller already opened
//! one, the write nests as a savepoint and the caller's transaction decides the
//! outcome, so delete + reload can also be composed at the call site:
//!
//! ```no_run
//! use asset_coverage::dates::DateSpan;
//! use asset_coverage::observations::ObservationStore;
//! use asset_coverage::repo::SqliteRepo;
//! use chrono::NaiveDate;
//! use diesel::Connection;
//! # fn rows() -> Vec<asset_coverage::models::observation::MarketObservation> { vec![] }
//!
//! let mut conn = asset_coverage::db::connection::connect_sqlite("coverage.db").unwrap();
//! let repo = SqliteRepo::new();
//! let jan = DateSpan::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//! )
//! .unwrap();
//! conn.immediate_transaction::<_, asset_coverage::Error, _>(|conn| {
//!     repo.delete_range_for_type(conn, 1, 8, jan)?;
//!     repo.upsert_batch(conn, &rows())?;
//!     Ok(())
//! })
//! .unwrap();
//! ```

mod repo;

use chrono::NaiveDate;
use diesel::SqliteConnection;

use crate::dates::DateSpan;
use crate::error::Result;
use crate::models::observation::MarketObservation;

/// What [`ObservationStore::replace_window`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOutcome {
    /// Rows removed from the window.
    pub deleted: usize,
    /// Rows loaded into it.
    pub inserted: usize,
}

/// Observation writes, deletes, and reads.
pub trait ObservationStore {
    /// Bulk-append `observations`. Returns rows written.
    ///
    /// Overlapping keys must already be deleted. A count mismatch yields
    /// [`crate::Error::BulkLoadMismatch`]; any failure rolls back the whole batch.
    fn upsert_batch(
        &self,
        conn: &mut SqliteConnection,
        observations: &[MarketObservation],
    ) -> Result<usize>;

    /// Insert or fully replace one observation.
    fn upsert(&self, conn: &mut SqliteConnection, observation: &MarketObservation) -> Result<()>;

    /// Atomically delete every (asset, type) row starting inside `span` and load
    /// `observations`, each of which must be for that asset and type and start
    /// inside `span`.
    fn replace_window(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        span: DateSpan,
        observations: &[MarketObservation],
    ) -> Result<ReplaceOutcome>;

    /// Delete every row of `asset_id` whose start date falls in `span`, across types.
    fn delete_range(&self, conn: &mut SqliteConnection, asset_id: i32, span: DateSpan)
    -> Result<usize>;

    /// Delete rows of one (asset, type) whose start date falls in `span`.
    fn delete_range_for_type(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        span: DateSpan,
    ) -> Result<usize>;

    /// Delete the (asset, type) row whose start date is exactly `date`.
    fn delete_as_of(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        date: NaiveDate,
    ) -> Result<usize>;

    /// Rows whose `end_date - start_date` is not `expected_days`, ordered by key.
    fn diff_by_interval_skew(
        &self,
        conn: &mut SqliteConnection,
        expected_days: i32,
    ) -> Result<Vec<MarketObservation>>;

    /// (asset, type) rows starting inside `span`, ordered by start date.
    fn observations(
        &self,
        conn: &mut SqliteConnection,
        asset_id: i32,
        market_data_type_id: i32,
        span: DateSpan,
    ) -> Result<Vec<MarketObservation>>;
}
