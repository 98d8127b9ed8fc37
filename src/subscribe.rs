//! Change Subscription
//!
//! Listens to a backing store's change notifications for one resource and,
//! on every matching insert/update/delete, invalidates all cache entries for
//! that resource before invoking the caller's callback.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{BackingStore, ChangeEvent, EventFilter};
use crate::fetch::CacheContext;

// == Subscription ==
/// Handle for a live change subscription.
///
/// Callers own the teardown: call [`Subscription::unsubscribe`] (or drop the
/// handle) when the consuming component goes away. Nothing reclaims a
/// subscription automatically.
#[derive(Debug)]
pub struct Subscription {
    resource: String,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// The resource this subscription listens on.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Tears down the underlying listener.
    pub fn unsubscribe(self) {
        // Drop impl aborts the task
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Subscription for '{}' torn down", self.resource);
    }
}

// == Subscribe To Changes ==
/// Subscribes to change notifications for `resource`.
///
/// Every event passing `filter` first invalidates the cache entries prefixed
/// by the resource name, then invokes `on_change`. Delivery is best-effort in
/// receive order; if the listener lags behind the transport it skips the
/// missed events and logs a warning.
pub fn subscribe_to_changes<F>(
    ctx: &CacheContext,
    backend: &dyn BackingStore,
    resource: &str,
    filter: EventFilter,
    on_change: F,
) -> Subscription
where
    F: Fn(ChangeEvent) + Send + 'static,
{
    let mut rx = backend.changes(resource);
    let store = ctx.store_handle();
    let resource = resource.to_string();
    let task_resource = resource.clone();

    let handle = tokio::spawn(async move {
        info!("Change subscription started for '{}'", task_resource);
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !filter.matches(event.kind) {
                        continue;
                    }
                    let removed = store.write().await.invalidate_resource(&task_resource);
                    debug!(
                        "{:?} event on '{}' invalidated {} cache entries",
                        event.kind, task_resource, removed
                    );
                    on_change(event);
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscription on '{}' lagged, skipping {} missed events",
                        task_resource, skipped
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    info!(
                        "Change channel for '{}' closed, subscription ending",
                        task_resource
                    );
                    break;
                }
            }
        }
    });

    Subscription { resource, handle }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChangeKind, MemoryBackend};
    use crate::cache::CacheKey;
    use crate::fetch::FetchOptions;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    async fn prime(ctx: &CacheContext, resource: &str) {
        ctx.fetch_with_cache(
            &CacheKey::new(resource, "p1"),
            || async { Ok(json!([1, 2])) },
            &FetchOptions::default(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_insert_invalidates_and_notifies() {
        let ctx = CacheContext::default();
        let backend = MemoryBackend::new();
        let notified = Arc::new(AtomicUsize::new(0));

        prime(&ctx, "orders").await;
        prime(&ctx, "suppliers").await;

        let notified_in_cb = notified.clone();
        let sub = subscribe_to_changes(&ctx, &backend, "orders", EventFilter::All, move |_| {
            notified_in_cb.fetch_add(1, Ordering::SeqCst);
        });

        backend.insert("orders", json!({"id": 1})).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(notified.load(Ordering::SeqCst), 1);
        // Orders entries invalidated, suppliers untouched
        let stats = ctx.stats().await;
        assert_eq!(stats.total_entries, 1);

        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_event_filter_skips_other_kinds() {
        let ctx = CacheContext::default();
        let backend = MemoryBackend::new();
        backend.seed("orders", vec![json!({"id": 1})]).await;
        let notified = Arc::new(AtomicUsize::new(0));

        let notified_in_cb = notified.clone();
        let _sub = subscribe_to_changes(
            &ctx,
            &backend,
            "orders",
            EventFilter::Only(ChangeKind::Delete),
            move |_| {
                notified_in_cb.fetch_add(1, Ordering::SeqCst);
            },
        );

        backend.insert("orders", json!({"id": 2})).await.unwrap();
        backend.delete("orders", &json!(1)).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let ctx = CacheContext::default();
        let backend = MemoryBackend::new();
        let notified = Arc::new(AtomicUsize::new(0));

        let notified_in_cb = notified.clone();
        let sub = subscribe_to_changes(&ctx, &backend, "orders", EventFilter::All, move |_| {
            notified_in_cb.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        sleep(Duration::from_millis(20)).await;

        backend.insert("orders", json!({"id": 1})).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }
}
