//! Observation intervals.
//!
//! An [`Interval`] pairs a non-zero amount with an [`IntervalUnit`] and knows the
//! day span a single observation at that granularity should cover. The span is what
//! the skew detectors compare a row's `end_date - start_date` against.
//!
//! ```
//! use asset_coverage::interval::{Interval, IntervalUnit};
//!
//! let weekly: Interval = "1W".parse().unwrap();
//! assert_eq!(weekly.unit(), IntervalUnit::Week);
//! assert_eq!(weekly.span_days(), 7);
//! assert_eq!(weekly.to_string(), "1W");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use anyhow::{anyhow, bail};

/// Interval granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// UTC hour
    Hour,
    /// UTC day
    Day,
    /// seven days
    Week,
}

/// An interval = amount × unit (e.g., 4-Hour, 1-Day, 2-Week).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    amount: NonZeroU32,
    unit: IntervalUnit,
}

impl Interval {
    /// Create a new Interval
    pub const fn new(amount: NonZeroU32, unit: IntervalUnit) -> Self {
        Self { amount, unit }
    }
    /// Amount component (the 4 in "4h").
    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }
    /// Unit component.
    pub const fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// Expected `end_date - start_date` for one observation, in whole days.
    ///
    /// Sub-day intervals start and end on the same date, so they span 0 days.
    pub fn span_days(&self) -> i32 {
        let a = self.amount.get();
        let days = match self.unit {
            IntervalUnit::Hour => a / 24,
            IntervalUnit::Day => a,
            IntervalUnit::Week => a.saturating_mul(7),
        };
        i32::try_from(days).unwrap_or(i32::MAX)
    }
}

/// Display/parse for catalog and CLI ergonomics (`"4h"`, `"1D"`, `"2W"`)
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            IntervalUnit::Hour => "h",
            IntervalUnit::Day => "D",
            IntervalUnit::Week => "W",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            bail!("empty interval");
        }
        let split = s.len() - s.chars().last().map_or(0, char::len_utf8);
        let (digits, unit) = s.split_at(split);
        let amount_num: u32 = digits
            .parse()
            .map_err(|_| anyhow!("bad interval amount in {s:?}"))?;
        let amount = NonZeroU32::new(amount_num).ok_or_else(|| anyhow!("amount must be > 0"))?;
        let unit = match unit {
            "h" => IntervalUnit::Hour,
            "D" | "d" => IntervalUnit::Day,
            "W" | "w" => IntervalUnit::Week,
            _ => bail!("unknown interval unit: {unit}"),
        };
        Ok(Interval::new(amount, unit))
    }
}
