//! Paginated Query Builder
//!
//! Translates a declarative query specification into a backing-store request,
//! executes it through the cache-aware fetcher, and shapes the result into a
//! paginated response.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::{BackingStore, RowRange, TableQuery};
use crate::cache::CacheKey;
use crate::error::{CacheError, Result};
use crate::fetch::{CacheContext, FetchOptions};
use crate::query::{translate_filters, FilterValue, OrderBy, SortDirection};

// == Page Request ==
/// Declarative specification for one page of a resource.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// 1-indexed page to fetch (default 1)
    pub page: Option<usize>,
    /// Rows per page (context default when None)
    pub page_size: Option<usize>,
    /// Column filters, conjunctive
    pub filters: BTreeMap<String, FilterValue>,
    /// Sort specification (record identifier descending when None)
    pub order_by: Option<OrderBy>,
    /// Overrides the derived cache key's parameter part
    pub cache_key: Option<String>,
    /// Overrides the context's default TTL for this entry
    pub cache_ttl: Option<Duration>,
    /// Bypass the cache read and overwrite the entry
    pub force_refresh: bool,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn filter(mut self, column: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(column.into(), value);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn cache_key(mut self, params: impl Into<String>) -> Self {
        self.cache_key = Some(params.into());
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

// == Paginated Response ==
/// One page of rows plus the pagination envelope.
///
/// Invariants: `page_count == ceil(count / page_size)` and
/// `data.len() <= page_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Rows for the requested page
    pub data: Vec<T>,
    /// Total matching rows across all pages
    pub count: usize,
    /// Derived page count
    pub page_count: usize,
    /// Echoed requested page
    pub page: usize,
    /// Echoed requested page size
    pub page_size: usize,
}

// == Fetch Paginated ==
/// Fetches one page of `resource` through the cache.
///
/// The cache key is derived deterministically from resource, page, page size,
/// serialized filters, and ordering, so identical calls share one entry and
/// any parameter change is a miss. A backing-store error surfaces to the
/// caller unchanged; there is no fallback.
pub async fn fetch_paginated<T>(
    ctx: &CacheContext,
    backend: &dyn BackingStore,
    resource: &str,
    request: &PageRequest,
) -> Result<PaginatedResponse<T>>
where
    T: Serialize + DeserializeOwned,
{
    let page = request.page.unwrap_or(1);
    let page_size = request.page_size.unwrap_or_else(|| ctx.default_page_size());
    if page == 0 {
        return Err(CacheError::InvalidQuery(
            "page is 1-indexed; page 0 does not exist".to_string(),
        ));
    }
    if page_size == 0 {
        return Err(CacheError::InvalidQuery(
            "page_size must be at least 1".to_string(),
        ));
    }

    let predicates = translate_filters(&request.filters)?;
    let order = request.order_by.clone().unwrap_or_default();

    let key = match &request.cache_key {
        // Caller-supplied params still sit under the resource prefix, so
        // resource-level invalidation keeps reaching this entry
        Some(params) => CacheKey::new(resource, params.clone()),
        None => derive_key(resource, page, page_size, &request.filters, &order)?,
    };

    let query = TableQuery {
        resource: resource.to_string(),
        predicates,
        order,
        range: RowRange {
            start: (page - 1) * page_size,
            end: page * page_size - 1,
        },
    };

    let opts = FetchOptions {
        ttl: request.cache_ttl,
        force_refresh: request.force_refresh,
    };

    ctx.fetch_with_cache(
        &key,
        || async move {
            let result = backend.select(&query).await?;
            let data = result
                .rows
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<Vec<T>, _>>()?;
            Ok(PaginatedResponse {
                data,
                count: result.total,
                page_count: result.total.div_ceil(page_size),
                page,
                page_size,
            })
        },
        &opts,
    )
    .await
}

/// Derives the deterministic cache key for a page request.
///
/// The filter map is serialized and hashed into a fixed-width digest, so the
/// key stays bounded no matter how large the filter set is. Filters live in a
/// BTreeMap, so the serialization (and therefore the digest) is order-stable:
/// identical parameters always produce the same key.
fn derive_key(
    resource: &str,
    page: usize,
    page_size: usize,
    filters: &BTreeMap<String, FilterValue>,
    order: &OrderBy,
) -> Result<CacheKey> {
    let direction = match order.direction {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    };
    let mut hasher = DefaultHasher::new();
    serde_json::to_string(filters)?.hash(&mut hasher);
    let params = format!(
        "p{}:s{}:f{:016x}:o{}.{}",
        page,
        page_size,
        hasher.finish(),
        order.column,
        direction,
    );
    Ok(CacheKey::new(resource, params))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters_amount_gte(operand: i64) -> BTreeMap<String, FilterValue> {
        let mut ops = BTreeMap::new();
        ops.insert(crate::query::FilterOp::Gte, json!(operand));
        let mut filters = BTreeMap::new();
        filters.insert("amount".to_string(), FilterValue::Ops(ops));
        filters
    }

    #[test]
    fn test_derive_key_deterministic() {
        let filters = filters_amount_gte(100);
        let order = OrderBy::default();

        let a = derive_key("orders", 2, 10, &filters, &order).unwrap();
        let b = derive_key("orders", 2, 10, &filters, &order).unwrap();
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_derive_key_changes_with_any_parameter() {
        let filters = filters_amount_gte(100);
        let order = OrderBy::default();
        let base = derive_key("orders", 2, 10, &filters, &order).unwrap();

        let other_page = derive_key("orders", 3, 10, &filters, &order).unwrap();
        let other_size = derive_key("orders", 2, 25, &filters, &order).unwrap();
        let other_filter = derive_key("orders", 2, 10, &filters_amount_gte(200), &order).unwrap();
        let other_order =
            derive_key("orders", 2, 10, &filters, &OrderBy::ascending("amount")).unwrap();

        for other in [other_page, other_size, other_filter, other_order] {
            assert_ne!(base.render(), other.render());
        }
    }

    #[test]
    fn test_derive_key_prefixed_by_resource() {
        let key = derive_key("orders", 1, 10, &BTreeMap::new(), &OrderBy::default()).unwrap();
        assert!(key.render().starts_with("orders:"));
    }

    #[test]
    fn test_derive_key_stays_bounded_for_large_filter_sets() {
        let values: Vec<_> = (0..500).map(|i| json!(format!("supplier-{}", i))).collect();
        let mut filters = BTreeMap::new();
        filters.insert("supplier_id".to_string(), FilterValue::Many(values));

        let key = derive_key("orders", 1, 10, &filters, &OrderBy::default()).unwrap();
        assert!(key.render().len() <= crate::cache::MAX_KEY_LENGTH);

        // The digest still distinguishes filter sets
        let mut other = BTreeMap::new();
        other.insert("supplier_id".to_string(), FilterValue::Many(vec![json!("supplier-0")]));
        let other_key = derive_key("orders", 1, 10, &other, &OrderBy::default()).unwrap();
        assert_ne!(key.render(), other_key.render());
    }

    #[tokio::test]
    async fn test_page_zero_rejected() {
        let ctx = CacheContext::default();
        let backend = crate::backend::MemoryBackend::new();
        let request = PageRequest::new().page(0);

        let result =
            fetch_paginated::<serde_json::Value>(&ctx, &backend, "orders", &request).await;
        assert!(matches!(result, Err(CacheError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_page_size_zero_rejected() {
        let ctx = CacheContext::default();
        let backend = crate::backend::MemoryBackend::new();
        let request = PageRequest::new().page_size(0);

        let result =
            fetch_paginated::<serde_json::Value>(&ctx, &backend, "orders", &request).await;
        assert!(matches!(result, Err(CacheError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let ctx = CacheContext::default();
        let backend = crate::backend::MemoryBackend::new();
        backend
            .seed("orders", vec![json!({"id": 1}), json!({"id": 2})])
            .await;

        let response =
            fetch_paginated::<serde_json::Value>(&ctx, &backend, "orders", &PageRequest::new())
                .await
                .unwrap();

        assert_eq!(response.page, 1);
        assert_eq!(response.page_size, ctx.default_page_size());
        // Default ordering is id descending
        assert_eq!(response.data[0]["id"], json!(2));
    }
}
