//! Market-data coverage and multi-source identifier resolution.
//!
//! Four components over one SQLite store, leaves first:
//! - [`registry`]: canonical assets and their identity keys.
//! - [`sources`]: the identifier each external source uses for each asset.
//! - [`coverage`]: ingested date span and gaps per (asset, market-data type).
//! - [`observations`]: the observation time series, with overwrite semantics and
//!   bulk load.
//!
//! All four are traits implemented by [`repo::SqliteRepo`]; every call takes the
//! connection so callers control transaction scope. The [`catalog`] seeds
//! sources, intervals, and identifiers from TOML.
//!
//! ```no_run
//! use asset_coverage::coverage::CoverageTracker;
//! use asset_coverage::registry::{AssetKey, AssetRegistry};
//! use asset_coverage::repo::SqliteRepo;
//! use asset_coverage::sources::SourceMap;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut conn = asset_coverage::db::connection::connect_sqlite("coverage.db")?;
//! let repo = SqliteRepo::new();
//! if let Some(eth) = repo.resolve(&mut conn, &AssetKey::Ticker("ETH".into()))? {
//!     let symbol = repo.identifier_for(&mut conn, eth.id, 3)?;
//!     let next = repo
//!         .coverage_window(&mut conn, eth.id, 8)?
//!         .and_then(|w| w.next_start());
//!     println!("fetch {symbol:?} from {next:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod coverage;
pub mod dates;
pub mod db;
pub mod error;
pub mod interval;
pub mod models;
pub mod observations;
pub mod query;
pub mod registry;
pub mod repo;
pub mod schema;
pub mod sources;

pub use error::{Error, Result};
