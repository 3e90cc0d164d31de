//! Cache configuration
//!
//! Runtime configuration for a cache partition. Defaults come from
//! `core::constants`; each value can be overridden through `HOTSPAN_*`
//! environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use super::constants::{
    DEFAULT_MAX_BYTES, DEFAULT_MAX_ITEMS, DEFAULT_TTL_SECS, ENV_MAX_BYTES, ENV_MAX_ITEMS,
    ENV_TTL_SECS,
};

/// Retention configuration for a cache partition
///
/// The TTL is sliding: every successful write to a record pushes its expiry
/// out by the full TTL again. The item and byte caps bound the partition
/// after expired records have been removed.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Sliding TTL applied on every record write
    pub ttl: Duration,
    /// Cap on cached record count
    pub max_items: usize,
    /// Cap on total serialized span bytes
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_items: DEFAULT_MAX_ITEMS,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl CacheConfig {
    /// Load configuration with environment variable overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(ttl_secs) = parse_env::<u64>(ENV_TTL_SECS)? {
            config.ttl = Duration::from_secs(ttl_secs);
        }
        if let Some(max_items) = parse_env::<usize>(ENV_MAX_ITEMS)? {
            config.max_items = max_items;
        }
        if let Some(max_bytes) = parse_env::<u64>(ENV_MAX_BYTES)? {
            config.max_bytes = max_bytes;
        }

        Ok(config)
    }

    /// TTL as a chrono duration for expiry arithmetic
    pub(crate) fn ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_TTL_SECS as i64))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => {
            let value = raw
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {}", name, raw))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
