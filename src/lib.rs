//! fetch-cache - A cache-aware data-fetch layer
//!
//! TTL memoization over an opaque backing store, with a paginated query
//! builder and change-notification-driven invalidation.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod query;
pub mod subscribe;
pub mod tasks;

pub use backend::{
    BackingStore, ChangeEvent, ChangeKind, EventFilter, MemoryBackend, QueryResult, RowRange,
    TableQuery,
};
pub use cache::{CacheEntry, CacheKey, CacheStats, KeyPattern, MemoryCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use fetch::{CacheContext, FetchOptions};
pub use query::{
    fetch_paginated, CmpOp, FilterOp, FilterValue, OrderBy, PageRequest, PaginatedResponse,
    Predicate, SortDirection,
};
pub use subscribe::{subscribe_to_changes, Subscription};
pub use tasks::spawn_sweep_task;
