// crates/fold-track-core/src/runtime/store.rs
// ============================================================================
// Module: Fold Track In-Memory Store
// Description: Simple in-memory visit store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of [`VisitStore`]
//! for tests and local demos, plus the shared Arc-backed wrapper injected into
//! every component that needs persistence. It mirrors the SQLite store's
//! filter and sort semantics, including substring matching against the
//! serialized links, and is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::report::SortKey;
use crate::core::report::SortOrder;
use crate::core::visit::NewVisit;
use crate::core::visit::VisitRecord;
use crate::core::visit::serialize_links;
use crate::interfaces::StoreError;
use crate::interfaces::VisitQuery;
use crate::interfaces::VisitStore;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state behind the in-memory store mutex.
#[derive(Debug, Default)]
struct InMemoryState {
    /// Next identifier to assign.
    next_id: i64,
    /// Stored records in insertion order.
    rows: Vec<VisitRecord>,
}

/// In-memory visit store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVisitStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryVisitStore {
    /// Creates a new empty in-memory visit store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisitStore for InMemoryVisitStore {
    fn insert(&self, visit: &NewVisit, timestamp_ms: i64) -> Result<VisitRecord, StoreError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("visit store mutex poisoned".to_string()))?;
        guard.next_id += 1;
        let record = VisitRecord {
            id: guard.next_id,
            timestamp: timestamp_ms,
            screen_width: visit.screen_width,
            screen_height: visit.screen_height,
            links: visit.links.clone(),
        };
        guard.rows.push(record.clone());
        Ok(record)
    }

    fn query(&self, query: &VisitQuery) -> Result<Vec<VisitRecord>, StoreError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("visit store mutex poisoned".to_string()))?;
        let mut matches = Vec::new();
        for row in &guard.rows {
            if matches_query(row, query)? {
                matches.push(row.clone());
            }
        }
        drop(guard);
        sort_rows(&mut matches, query.orderby, query.order);
        matches.truncate(query.limit);
        Ok(matches)
    }

    fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("visit store mutex poisoned".to_string()))?;
        let before = guard.rows.len();
        guard.rows.retain(|row| row.timestamp >= cutoff_ms);
        let deleted = before - guard.rows.len();
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.state
            .lock()
            .map(|_| ())
            .map_err(|_| StoreError::Store("visit store mutex poisoned".to_string()))
    }
}

/// Returns true when the row satisfies every filter in the query.
fn matches_query(row: &VisitRecord, query: &VisitQuery) -> Result<bool, StoreError> {
    if row.timestamp < query.since_ms {
        return Ok(false);
    }
    if let Some(width) = query.screen_width
        && row.screen_width != width
    {
        return Ok(false);
    }
    if let Some(needle) = &query.link_contains {
        let serialized =
            serialize_links(&row.links).map_err(|err| StoreError::Invalid(err.to_string()))?;
        if !serialized.contains(needle.as_str()) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Sorts rows by the allow-listed key and direction.
///
/// `sort_by` is stable, so equal keys keep insertion order.
fn sort_rows(rows: &mut [VisitRecord], key: SortKey, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortKey::ScreenWidth => a.screen_width.cmp(&b.screen_width),
            SortKey::ScreenHeight => a.screen_height.cmp(&b.screen_height),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared visit store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedVisitStore {
    /// Inner store implementation.
    inner: Arc<dyn VisitStore + Send + Sync>,
}

impl SharedVisitStore {
    /// Wraps a visit store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl VisitStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn VisitStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl VisitStore for SharedVisitStore {
    fn insert(&self, visit: &NewVisit, timestamp_ms: i64) -> Result<VisitRecord, StoreError> {
        self.inner.insert(visit, timestamp_ms)
    }

    fn query(&self, query: &VisitQuery) -> Result<Vec<VisitRecord>, StoreError> {
        self.inner.query(query)
    }

    fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        self.inner.delete_older_than(cutoff_ms)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
