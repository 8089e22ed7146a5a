//! The SQLite-backed implementation shared by every component trait.
//!
//! [`SqliteRepo`] is stateless apart from its bulk-load chunk size; the connection
//! is passed to each call so callers own transaction scope.

use crate::config::{DEFAULT_BULK_CHUNK_SIZE, StoreConfig};

/// SQLite implementation of [`crate::registry::AssetRegistry`],
/// [`crate::sources::SourceMap`], [`crate::coverage::CoverageTracker`] and
/// [`crate::observations::ObservationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteRepo {
    pub(crate) bulk_chunk_size: usize,
}

impl SqliteRepo {
    /// Repo with default settings.
    pub fn new() -> Self {
        Self {
            bulk_chunk_size: DEFAULT_BULK_CHUNK_SIZE,
        }
    }

    /// Repo using the chunk size from `cfg` (zero falls back to the default).
    pub fn with_config(cfg: &StoreConfig) -> Self {
        Self {
            bulk_chunk_size: if cfg.bulk_chunk_size == 0 {
                DEFAULT_BULK_CHUNK_SIZE
            } else {
                cfg.bulk_chunk_size
            },
        }
    }

    /// Rows per INSERT statement during bulk loads.
    pub fn bulk_chunk_size(&self) -> usize {
        self.bulk_chunk_size
    }
}

impl Default for SqliteRepo {
    fn default() -> Self {
        Self::new()
    }
}
