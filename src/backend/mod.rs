//! Backing Store Module
//!
//! The boundary between the cache layer and the service that owns the durable
//! data. The cache treats row payloads as opaque JSON and only asks the store
//! for two things: a windowed, counted table select and a change-notification
//! channel per resource.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::query::{OrderBy, Predicate};

// == Table Query ==
/// A single windowed select against one resource.
#[derive(Debug, Clone)]
pub struct TableQuery {
    /// Resource (table) name
    pub resource: String,
    /// Conjunctive filter predicates
    pub predicates: Vec<Predicate>,
    /// Sort specification
    pub order: OrderBy,
    /// Zero-indexed inclusive row range to return
    pub range: RowRange,
}

/// Zero-indexed inclusive row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

// == Query Result ==
/// Rows for the requested window plus the exact total count of matching rows
/// across all windows, returned from a single round trip.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: Vec<Value>,
    pub total: usize,
}

// == Change Events ==
/// Kind of mutation a change notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change notification for one resource.
///
/// Delivery is best-effort in receive order; this layer adds no replay or
/// ordering guarantee beyond what the transport provides.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Resource the change occurred on
    pub resource: String,
    /// Kind of mutation
    pub kind: ChangeKind,
    /// The row after the change (None for deletes)
    pub row: Option<Value>,
}

/// Which change kinds a subscription wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// All insert/update/delete events
    #[default]
    All,
    /// Only one kind of event
    Only(ChangeKind),
}

impl EventFilter {
    /// Checks whether an event of `kind` passes this filter.
    pub fn matches(&self, kind: ChangeKind) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Only(wanted) => *wanted == kind,
        }
    }
}

// == Backing Store Trait ==
/// The external service that owns all durable business data.
///
/// Implementations must return the row window and the exact total count in
/// the same `select` call, and must broadcast a [`ChangeEvent`] for every
/// mutation on a resource something has subscribed to.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Executes a windowed, counted select.
    async fn select(&self, query: &TableQuery) -> Result<QueryResult>;

    /// Returns a receiver for change notifications on `resource`.
    fn changes(&self, resource: &str) -> broadcast::Receiver<ChangeEvent>;
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_filter_all() {
        let filter = EventFilter::All;
        assert!(filter.matches(ChangeKind::Insert));
        assert!(filter.matches(ChangeKind::Update));
        assert!(filter.matches(ChangeKind::Delete));
    }

    #[test]
    fn test_event_filter_only() {
        let filter = EventFilter::Only(ChangeKind::Delete);
        assert!(filter.matches(ChangeKind::Delete));
        assert!(!filter.matches(ChangeKind::Insert));
    }
}
