//! Cache-Aware Fetcher
//!
//! Get-or-populate-on-miss over the memory cache store, with per-call TTL,
//! forced refresh, and single-flight collapsing of concurrent misses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheStats, KeyPattern, MemoryCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Fetch Options ==
/// Per-call options for [`CacheContext::fetch_with_cache`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// TTL for the entry written on a miss; the context default when None
    pub ttl: Option<Duration>,
    /// Skip the cache read and always invoke the producer
    pub force_refresh: bool,
}

impl FetchOptions {
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

// == Cache Context ==
/// One cache instance: the entry store, the in-flight fetch registry, and the
/// configured defaults.
///
/// Constructed once per application and passed by reference (or cheaply
/// cloned; all state is behind Arcs) to every consumer. There is no
/// module-level singleton: lifetime and test isolation are explicit.
#[derive(Clone)]
pub struct CacheContext {
    store: Arc<RwLock<MemoryCache>>,
    /// Rendered-key -> in-flight guard; concurrent misses on one key queue
    /// on the same guard instead of issuing duplicate fetches
    flights: Arc<StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    config: CacheConfig,
}

impl CacheContext {
    /// Creates a context with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryCache::new())),
            flights: Arc::new(StdMutex::new(HashMap::new())),
            config,
        }
    }

    /// Creates a context configured from environment variables.
    pub fn from_env() -> Self {
        Self::new(CacheConfig::from_env())
    }

    // == Fetch With Cache ==
    /// Returns the cached value for `key`, or runs `producer` to populate it.
    ///
    /// - `force_refresh` skips the read, runs the producer, and overwrites
    ///   the entry.
    /// - A hit returns the cached value without invoking the producer.
    /// - A miss runs the producer and stores the result with expiry
    ///   `now + ttl`.
    /// - A failed producer propagates its error and leaves the cache
    ///   unmodified: failures are not cached and not retried here.
    /// - A produced value whose key the store rejects (oversized) is still
    ///   returned; only the cache write is skipped.
    ///
    /// Concurrent misses on the same key collapse to one producer run; late
    /// arrivals wait for the first flight and then read the populated entry.
    /// No timeout is applied: a hung producer hangs its caller.
    pub async fn fetch_with_cache<T, F, Fut>(
        &self,
        key: &CacheKey,
        producer: F,
        opts: &FetchOptions,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let rendered = key.render();
        let ttl_ms = self.effective_ttl_ms(opts);

        if !opts.force_refresh {
            if let Some(value) = self.store.write().await.get(&rendered) {
                return Ok(serde_json::from_value(value)?);
            }
        }

        let flight = self.flight_guard(&rendered);
        let guard = flight.lock().await;

        // An earlier flight may have populated the entry while we queued.
        // The pre-guard read already counted this fetch, so the re-check
        // stays out of the statistics.
        if !opts.force_refresh {
            if let Some(value) = self.store.write().await.peek(&rendered) {
                drop(guard);
                self.release_flight(&rendered, &flight);
                return Ok(serde_json::from_value(value)?);
            }
        }

        debug!(
            "Fetching '{}' (ttl {} ms, force_refresh: {})",
            rendered, ttl_ms, opts.force_refresh
        );
        let outcome = match producer().await {
            Ok(value) => match serde_json::to_value(&value) {
                Ok(encoded) => {
                    // A successful fetch is never discarded over a cache
                    // write failure; an unstorable key just skips caching
                    if let Err(err) = self
                        .store
                        .write()
                        .await
                        .set(rendered.clone(), encoded, ttl_ms)
                    {
                        warn!("Skipping cache write for '{}': {}", rendered, err);
                    }
                    Ok(value)
                }
                Err(err) => Err(CacheError::from(err)),
            },
            Err(err) => Err(err),
        };

        drop(guard);
        self.release_flight(&rendered, &flight);
        outcome
    }

    // == Invalidation ==
    /// Removes exactly one entry. Returns whether an entry was present.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.store.write().await.delete(&key.render())
    }

    /// Removes every entry matching `pattern`. Returns how many were removed.
    pub async fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        self.store.write().await.delete_matching(pattern)
    }

    /// Removes every entry belonging to `resource`.
    pub async fn invalidate_resource(&self, resource: &str) -> usize {
        self.store.write().await.invalidate_resource(resource)
    }

    /// Removes all entries.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Default page size for paginated queries through this context.
    pub fn default_page_size(&self) -> usize {
        self.config.default_page_size
    }

    /// Shared handle to the underlying store, for the sweep task and the
    /// subscription listener.
    pub(crate) fn store_handle(&self) -> Arc<RwLock<MemoryCache>> {
        self.store.clone()
    }

    fn effective_ttl_ms(&self, opts: &FetchOptions) -> u64 {
        opts.ttl
            .map(|ttl| ttl.as_millis() as u64)
            .unwrap_or(self.config.default_ttl_ms)
    }

    fn flight_guard(&self, rendered: &str) -> Arc<AsyncMutex<()>> {
        let mut flights = self.flights.lock().expect("flight registry lock poisoned");
        flights
            .entry(rendered.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Removes the registry entry only if it still points at our guard, so a
    /// late waiter cannot evict a newer flight.
    fn release_flight(&self, rendered: &str, flight: &Arc<AsyncMutex<()>>) {
        let mut flights = self.flights.lock().expect("flight registry lock poisoned");
        if flights
            .get(rendered)
            .is_some_and(|current| Arc::ptr_eq(current, flight))
        {
            flights.remove(rendered);
        }
    }
}

impl Default for CacheContext {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
