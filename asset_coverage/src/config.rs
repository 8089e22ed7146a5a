//! Store configuration: TOML file plus environment override.
//!
//! ```toml
//! database_url = "sqlite://var/coverage.db"
//! busy_timeout_ms = 5000
//! bulk_chunk_size = 500
//! ```
//!
//! `DATABASE_URL`, when set, wins over the file.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// Default lock wait ceiling for every statement.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;
/// Default rows per INSERT statement during bulk loads.
pub const DEFAULT_BULK_CHUNK_SIZE: usize = 500;
/// Environment variable that overrides `database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// An environment variable required by the application is not set.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Connection and bulk-load settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite URL or path (`sqlite://file.db`, `file.db`, `:memory:`).
    #[serde(default)]
    pub database_url: String,
    /// `PRAGMA busy_timeout` applied to every connection.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
    /// Rows per INSERT statement in [`crate::observations::ObservationStore::upsert_batch`].
    #[serde(default = "default_bulk_chunk_size")]
    pub bulk_chunk_size: usize,
}

fn default_busy_timeout_ms() -> u32 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_bulk_chunk_size() -> usize {
    DEFAULT_BULK_CHUNK_SIZE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            bulk_chunk_size: DEFAULT_BULK_CHUNK_SIZE,
        }
    }
}

impl StoreConfig {
    /// Configuration for `database_url` with every other field defaulted.
    pub fn for_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Reject values the store cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            bail!("database_url is not set (config file or {DATABASE_URL_ENV})");
        }
        if self.busy_timeout_ms == 0 {
            bail!("busy_timeout_ms must be > 0");
        }
        if self.bulk_chunk_size == 0 {
            bail!("bulk_chunk_size must be > 0");
        }
        Ok(())
    }
}

/// Parse a config from TOML, apply the `DATABASE_URL` override, and validate.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<StoreConfig> {
    let mut cfg: StoreConfig = toml::from_str(toml_str).context("failed to parse store config TOML")?;
    if let Ok(url) = get_env_var(DATABASE_URL_ENV) {
        cfg.database_url = url;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Read a config file from disk, or fall back to environment-only configuration
/// when `path` is `None`.
pub fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<StoreConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("read store config {}", p.display()))?;
            load_config_str(&text)
        }
        None => {
            let cfg = StoreConfig::for_url(get_env_var(DATABASE_URL_ENV)?);
            cfg.validate()?;
            Ok(cfg)
        }
    }
}
