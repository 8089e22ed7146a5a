//! Market observations: one time-windowed price/volume/supply record per
//! (asset, market-data type, start date).
//!
//! [`MarketObservation`] is the validated domain value; [`ObservationRow`] is its
//! storage shape in [`crate::schema::market_observations`]. The sparkline is kept
//! as a JSON array in a TEXT column.
//!
//! ```
//! use asset_coverage::models::observation::{MarketObservation, ObservationKey, Sparkline};
//! use chrono::NaiveDate;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let obs = MarketObservation::builder(ObservationKey::new(1, 8, day), day.succ_opt().unwrap(), 3, 1)
//!     .ohlc(2280.0, 2390.5, 2260.1, 2352.7)
//!     .volume(9.1e9)
//!     .sparkline(Sparkline::new(vec![2280.0, 2301.2, 2352.7]).unwrap())
//!     .build()
//!     .unwrap();
//! assert_eq!(obs.span_days(), 1);
//! ```

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, positive_id};
use crate::schema::market_observations;

/// Unique key of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Queryable, Selectable)]
#[diesel(table_name = market_observations, check_for_backend(diesel::sqlite::Sqlite))]
pub struct ObservationKey {
    /// FK to [`crate::models::Asset::id`].
    pub asset_id: i32,
    /// Market-data type (daily OHLC, weekly sparkline, ...).
    pub market_data_type_id: i32,
    /// Inclusive start of the observation window.
    pub start_date: NaiveDate,
}

impl ObservationKey {
    /// Key for (asset, type, start date).
    pub const fn new(asset_id: i32, market_data_type_id: i32, start_date: NaiveDate) -> Self {
        Self {
            asset_id,
            market_data_type_id,
            start_date,
        }
    }
}

/// Time-ordered sequence of finite values, optionally of a fixed length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sparkline(Vec<f64>);

impl Sparkline {
    /// Accept `values` if every point is finite.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "sparkline point {i} is not finite"
            )));
        }
        Ok(Self(values))
    }

    /// Like [`Sparkline::new`], also requiring exactly `len` points (e.g. 7 for a
    /// seven-day window).
    pub fn with_len(values: Vec<f64>, len: usize) -> Result<Self> {
        if values.len() != len {
            return Err(Error::InvalidArgument(format!(
                "sparkline has {} points, expected {len}",
                values.len()
            )));
        }
        Self::new(values)
    }

    /// Points, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no points.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn to_json(&self) -> String {
        // a Vec<f64> of finite values always serializes
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    fn from_json(s: &str) -> Result<Self> {
        let values: Vec<f64> = serde_json::from_str(s).map_err(|e| {
            Error::StoreFailure(diesel::result::Error::DeserializationError(Box::new(e)))
        })?;
        Self::new(values)
    }
}

/// One ingested observation. Build through [`MarketObservation::builder`]; the store
/// re-validates before writing.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketObservation {
    /// Unique key.
    pub key: ObservationKey,
    /// Inclusive end of the window; never before `key.start_date`.
    pub end_date: NaiveDate,
    /// Provider the data came from.
    pub source_id: i32,
    /// Interval granularity (see [`crate::models::IntervalRow`]).
    pub interval_id: i32,
    /// Opening price.
    pub open: Option<f64>,
    /// High price.
    pub high: Option<f64>,
    /// Low price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume.
    pub volume: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Circulating supply.
    pub circulating_supply: Option<f64>,
    /// Total supply.
    pub total_supply: Option<f64>,
    /// Max supply.
    pub max_supply: Option<f64>,
    /// Intra-window price path.
    pub sparkline: Option<Sparkline>,
}

impl MarketObservation {
    /// Start a builder with the required fields; every optional measure starts empty.
    pub fn builder(
        key: ObservationKey,
        end_date: NaiveDate,
        source_id: i32,
        interval_id: i32,
    ) -> ObservationBuilder {
        ObservationBuilder {
            obs: MarketObservation {
                key,
                end_date,
                source_id,
                interval_id,
                open: None,
                high: None,
                low: None,
                close: None,
                volume: None,
                market_cap: None,
                circulating_supply: None,
                total_supply: None,
                max_supply: None,
                sparkline: None,
            },
        }
    }

    /// `end_date - start_date` in days.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.key.start_date).num_days()
    }

    /// Check ids, date order, and that every present measure is finite.
    pub fn validate(&self) -> Result<()> {
        positive_id("asset_id", self.key.asset_id)?;
        positive_id("market_data_type_id", self.key.market_data_type_id)?;
        positive_id("source_id", self.source_id)?;
        positive_id("interval_id", self.interval_id)?;
        if self.end_date < self.key.start_date {
            return Err(Error::InvalidArgument(format!(
                "end date {} is before start date {}",
                self.end_date, self.key.start_date
            )));
        }
        let measures = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
            ("market_cap", self.market_cap),
            ("circulating_supply", self.circulating_supply),
            ("total_supply", self.total_supply),
            ("max_supply", self.max_supply),
        ];
        for (name, v) in measures {
            if v.is_some_and(|x| !x.is_finite()) {
                return Err(Error::InvalidArgument(format!("{name} is not finite")));
            }
        }
        Ok(())
    }
}

/// Builder for [`MarketObservation`].
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    obs: MarketObservation,
}

impl ObservationBuilder {
    /// Set open/high/low/close together.
    pub fn ohlc(mut self, open: f64, high: f64, low: f64, close: f64) -> Self {
        self.obs.open = Some(open);
        self.obs.high = Some(high);
        self.obs.low = Some(low);
        self.obs.close = Some(close);
        self
    }

    /// Set only the close.
    pub fn close(mut self, close: f64) -> Self {
        self.obs.close = Some(close);
        self
    }

    /// Set volume.
    pub fn volume(mut self, volume: f64) -> Self {
        self.obs.volume = Some(volume);
        self
    }

    /// Set market cap.
    pub fn market_cap(mut self, market_cap: f64) -> Self {
        self.obs.market_cap = Some(market_cap);
        self
    }

    /// Set the supply figures; `None` leaves a figure empty.
    pub fn supply(mut self, circulating: Option<f64>, total: Option<f64>, max: Option<f64>) -> Self {
        self.obs.circulating_supply = circulating;
        self.obs.total_supply = total;
        self.obs.max_supply = max;
        self
    }

    /// Attach a sparkline.
    pub fn sparkline(mut self, sparkline: Sparkline) -> Self {
        self.obs.sparkline = Some(sparkline);
        self
    }

    /// Validate and finish.
    pub fn build(self) -> Result<MarketObservation> {
        self.obs.validate()?;
        Ok(self.obs)
    }
}

/// Storage shape of [`MarketObservation`].
///
/// The changeset treats `None` as NULL so an overwrite never keeps a stale field.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = market_observations, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(asset_id, market_data_type_id, start_date))]
#[diesel(treat_none_as_null = true, treat_none_as_default_value = false)]
pub struct ObservationRow {
    /// FK to assets.
    pub asset_id: i32,
    /// Market-data type.
    pub market_data_type_id: i32,
    /// Inclusive start.
    pub start_date: NaiveDate,
    /// Inclusive end.
    pub end_date: NaiveDate,
    /// FK to sources.
    pub source_id: i32,
    /// FK to market_data_intervals.
    pub interval_id: i32,
    /// Opening price.
    pub open: Option<f64>,
    /// High price.
    pub high: Option<f64>,
    /// Low price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume.
    pub volume: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Circulating supply.
    pub circulating_supply: Option<f64>,
    /// Total supply.
    pub total_supply: Option<f64>,
    /// Max supply.
    pub max_supply: Option<f64>,
    /// JSON array of points.
    pub sparkline: Option<String>,
}

impl From<&MarketObservation> for ObservationRow {
    fn from(o: &MarketObservation) -> Self {
        Self {
            asset_id: o.key.asset_id,
            market_data_type_id: o.key.market_data_type_id,
            start_date: o.key.start_date,
            end_date: o.end_date,
            source_id: o.source_id,
            interval_id: o.interval_id,
            open: o.open,
            high: o.high,
            low: o.low,
            close: o.close,
            volume: o.volume,
            market_cap: o.market_cap,
            circulating_supply: o.circulating_supply,
            total_supply: o.total_supply,
            max_supply: o.max_supply,
            sparkline: o.sparkline.as_ref().map(Sparkline::to_json),
        }
    }
}

impl TryFrom<ObservationRow> for MarketObservation {
    type Error = Error;

    fn try_from(r: ObservationRow) -> Result<Self> {
        let sparkline = r.sparkline.as_deref().map(Sparkline::from_json).transpose()?;
        Ok(Self {
            key: ObservationKey::new(r.asset_id, r.market_data_type_id, r.start_date),
            end_date: r.end_date,
            source_id: r.source_id,
            interval_id: r.interval_id,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
            market_cap: r.market_cap,
            circulating_supply: r.circulating_supply,
            total_supply: r.total_supply,
            max_supply: r.max_supply,
            sparkline,
        })
    }
}
