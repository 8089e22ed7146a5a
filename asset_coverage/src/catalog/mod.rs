//! Catalog subsystem.
//!
//! The catalog is the operator-maintained description of sources, market-data
//! intervals, and the identifier each source uses for each asset. See
//! [`config`] for the TOML model and [`sync`] for reconciling it with the store.

pub mod config;
pub mod repo;
pub mod sync;
