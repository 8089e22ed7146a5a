//! Inclusive date spans and day-index mapping.
//!
//! - One stable epoch: `NaiveDate::MIN` is day 0, so every representable date has an id.
//! - Day ids are `u32` so covered-day sets fit in a `RoaringBitmap`.
//! - Spans are inclusive on both bounds, matching every range operation in the store.

use chrono::{Duration, NaiveDate};

use crate::error::{Error, Result};

/// Day 0 of the day-index space.
pub const EPOCH_DAY: NaiveDate = NaiveDate::MIN;

/// Inclusive `[start, end]` date range with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Build a span, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidArgument(format!(
                "end date {end} is before start date {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Single-day span.
    pub const fn day(d: NaiveDate) -> Self {
        Self { start: d, end: d }
    }

    /// Inclusive start.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Inclusive end.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// True if `d` falls inside the span.
    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }

    /// Number of days in the span (at least 1).
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Day id for `d`.
pub fn day_id(d: NaiveDate) -> u32 {
    // MIN..=MAX spans fewer than 200M days, well inside u32
    u32::try_from((d - EPOCH_DAY).num_days()).unwrap_or(u32::MAX)
}

/// Inverse of [`day_id`].
pub fn day_from_id(id: u32) -> NaiveDate {
    EPOCH_DAY + Duration::days(i64::from(id))
}
