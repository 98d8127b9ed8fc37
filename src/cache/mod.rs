//! Cache Module
//!
//! Provides the in-memory TTL cache store behind the cache-aware fetcher.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{CacheKey, KeyPattern};
pub use stats::CacheStats;
pub use store::MemoryCache;

// == Public Constants ==
/// Maximum allowed rendered key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;
