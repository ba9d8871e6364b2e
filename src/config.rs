//! Configuration Module
//!
//! Handles loading the memcached backend configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::Expiration;

/// Memcached backend configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcachedConfig {
    /// Server address as `host:port`
    pub addr: String,
    /// Expiration applied to every write, in memcached exptime form
    /// (0 = never, up to 30 days = relative seconds, otherwise Unix time)
    pub expiration_secs: u32,
    /// Upper bound on a single request/response exchange, in milliseconds
    pub io_timeout_ms: u64,
}

impl MemcachedConfig {
    /// Creates a new MemcachedConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMCACHED_ADDR` - Server address (default: 127.0.0.1:11211)
    /// - `CACHE_EXPIRATION` - Exptime for stored items (default: 0, never)
    /// - `MEMCACHED_TIMEOUT_MS` - Per-exchange I/O timeout (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: env::var("MEMCACHED_ADDR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.addr),
            expiration_secs: env::var("CACHE_EXPIRATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.expiration_secs),
            io_timeout_ms: env::var("MEMCACHED_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.io_timeout_ms),
        }
    }

    pub fn expiration(&self) -> Expiration {
        Expiration::from_exptime(self.expiration_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:11211".to_string(),
            expiration_secs: 0,
            io_timeout_ms: 1000,
        }
    }
}
