//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default TTL in milliseconds for entries fetched without an explicit TTL
    pub default_ttl_ms: u64,
    /// Background expired-entry sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Default page size for paginated queries without an explicit page_size
    pub default_page_size: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FETCH_CACHE_DEFAULT_TTL_MS` - Default entry TTL in milliseconds (default: 300000, i.e. 5 minutes)
    /// - `FETCH_CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    /// - `FETCH_CACHE_DEFAULT_PAGE_SIZE` - Default page size (default: 10)
    pub fn from_env() -> Self {
        Self {
            default_ttl_ms: env::var("FETCH_CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300_000),
            sweep_interval_secs: env::var("FETCH_CACHE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            default_page_size: env::var("FETCH_CACHE_DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            sweep_interval_secs: 60,
            default_page_size: 10,
        }
    }
}
