//! In-Memory Backing Store
//!
//! A [`BackingStore`] over per-resource row vectors, with mutations that
//! broadcast change events. Backs the integration tests and embedded usage
//! where no external store is available.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::backend::{BackingStore, ChangeEvent, ChangeKind, QueryResult, TableQuery};
use crate::error::{CacheError, Result};
use crate::query::{compare_values, SortDirection};

/// Broadcast channel capacity per resource; slow receivers past this lag.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

// == Memory Backend ==
/// In-memory backing store keyed by resource name.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Resource name -> row records
    tables: RwLock<HashMap<String, Vec<Value>>>,
    /// Resource name -> change broadcast channel
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl MemoryBackend {
    /// Creates a new empty MemoryBackend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rows of `resource` wholesale, without emitting events.
    pub async fn seed(&self, resource: &str, rows: Vec<Value>) {
        let mut tables = self.tables.write().await;
        tables.insert(resource.to_string(), rows);
    }

    /// Appends a row to `resource` and broadcasts an insert event.
    pub async fn insert(&self, resource: &str, row: Value) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            tables.entry(resource.to_string()).or_default().push(row.clone());
        }
        self.emit(resource, ChangeKind::Insert, Some(row));
        Ok(())
    }

    /// Replaces the row of `resource` whose `id` column equals `id`, then
    /// broadcasts an update event.
    pub async fn update(&self, resource: &str, id: &Value, row: Value) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            let rows = tables
                .get_mut(resource)
                .ok_or_else(|| CacheError::Backend(format!("unknown resource '{}'", resource)))?;
            let slot = rows
                .iter_mut()
                .find(|r| r.get("id") == Some(id))
                .ok_or_else(|| {
                    CacheError::Backend(format!("no row in '{}' with id {}", resource, id))
                })?;
            *slot = row.clone();
        }
        self.emit(resource, ChangeKind::Update, Some(row));
        Ok(())
    }

    /// Removes the row of `resource` whose `id` column equals `id`, then
    /// broadcasts a delete event.
    pub async fn delete(&self, resource: &str, id: &Value) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            let rows = tables
                .get_mut(resource)
                .ok_or_else(|| CacheError::Backend(format!("unknown resource '{}'", resource)))?;
            let before = rows.len();
            rows.retain(|r| r.get("id") != Some(id));
            if rows.len() == before {
                return Err(CacheError::Backend(format!(
                    "no row in '{}' with id {}",
                    resource, id
                )));
            }
        }
        self.emit(resource, ChangeKind::Delete, None);
        Ok(())
    }

    fn sender(&self, resource: &str) -> broadcast::Sender<ChangeEvent> {
        let mut channels = self.channels.lock().expect("change channel lock poisoned");
        channels
            .entry(resource.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .clone()
    }

    fn emit(&self, resource: &str, kind: ChangeKind, row: Option<Value>) {
        let event = ChangeEvent {
            resource: resource.to_string(),
            kind,
            row,
        };
        debug!("Broadcasting {:?} event on '{}'", kind, resource);
        // Send fails only when no receiver is subscribed
        let _ = self.sender(resource).send(event);
    }
}

#[async_trait]
impl BackingStore for MemoryBackend {
    async fn select(&self, query: &TableQuery) -> Result<QueryResult> {
        let tables = self.tables.read().await;
        let rows = tables.get(&query.resource).map(Vec::as_slice).unwrap_or(&[]);

        let mut matching: Vec<Value> = rows
            .iter()
            .filter(|row| query.predicates.iter().all(|p| p.matches(row)))
            .cloned()
            .collect();

        let column = query.order.column.as_str();
        matching.sort_by(|a, b| {
            let ordering = match (a.get(column), b.get(column)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            match query.order.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        let total = matching.len();
        let window = if query.range.start >= total {
            Vec::new()
        } else {
            let end = query.range.end.min(total - 1);
            matching[query.range.start..=end].to_vec()
        };

        Ok(QueryResult {
            rows: window,
            total,
        })
    }

    fn changes(&self, resource: &str) -> broadcast::Receiver<ChangeEvent> {
        self.sender(resource).subscribe()
    }
}
