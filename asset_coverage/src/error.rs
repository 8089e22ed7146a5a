//! Error taxonomy shared by the registry, source map, coverage tracker, and
//! observation store.
//!
//! Lookups that find nothing are not errors: they return `None` or an empty
//! `Vec`. Everything here is either a caller mistake caught before a query is
//! issued ([`Error::InvalidArgument`]), a uniqueness violation outside an upsert
//! path ([`Error::ConflictingKey`]), or a store-level failure that has already
//! rolled back its transaction.

use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Errors returned by the data-access core.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed identifier, empty key, inverted date range, or a write that
    /// lacks a required key. Raised before any statement runs, except when the
    /// store's own CHECK or foreign-key constraints catch it.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The write would duplicate a unique key outside the designated upsert path.
    #[error("conflicting key: {0}")]
    ConflictingKey(String),

    /// Statement, transaction, or driver failure. The enclosing transaction
    /// has been rolled back.
    #[error("store failure: {0}")]
    StoreFailure(#[source] DieselError),

    /// A bulk load wrote a different number of rows than it was handed.
    #[error("bulk load wrote {inserted} of {expected} rows")]
    BulkLoadMismatch {
        /// Rows handed to the load.
        expected: usize,
        /// Rows the store reported as written.
        inserted: usize,
    },

    /// Opening the connection failed.
    #[error("connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),
}

impl Error {
    /// True for failures of the store itself, as opposed to caller mistakes or
    /// key conflicts. Orchestrators retry these with backoff.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Error::StoreFailure(_) | Error::BulkLoadMismatch { .. } | Error::Connection(_)
        )
    }
}

impl From<DieselError> for Error {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Error::ConflictingKey(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                Error::InvalidArgument(info.message().to_string())
            }
            // unknown source/interval/pair leg, or purge of an asset still used as a pair leg
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Error::InvalidArgument(format!("reference check failed: {}", info.message()))
            }
            other => Error::StoreFailure(other),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject non-positive surrogate ids before they reach a query.
pub(crate) fn positive_id(what: &str, v: i32) -> Result<i32> {
    if v <= 0 {
        return Err(Error::InvalidArgument(format!("{what} must be > 0, got {v}")));
    }
    Ok(v)
}

/// Trim `s` and reject it when nothing is left.
pub(crate) fn non_empty<'a>(what: &str, s: &'a str) -> Result<&'a str> {
    let t = s.trim();
    if t.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} cannot be empty")));
    }
    Ok(t)
}
