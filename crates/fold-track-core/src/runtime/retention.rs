// crates/fold-track-core/src/runtime/retention.rs
// ============================================================================
// Module: Fold Track Retention Manager
// Description: Deletes visit records older than the retention window.
// Purpose: Enforce the cleanup policy against any injected visit store.
// Dependencies: crate::core::time, crate::interfaces, crate::runtime::store
// ============================================================================

//! ## Overview
//! The retention manager deletes visits whose timestamp falls outside the
//! retention window (default 7 days). Cleanup is idempotent: running it twice
//! with no intervening inserts deletes once, then zero. Invocation policy
//! lives with the callers — the server runs it on a schedule and the CLI
//! exposes a one-shot `cleanup` command.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::time::days_to_millis;
use crate::interfaces::StoreError;
use crate::interfaces::VisitStore;
use crate::runtime::store::SharedVisitStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

// ============================================================================
// SECTION: Retention Manager
// ============================================================================

/// Deletes visit records older than a fixed window.
#[derive(Clone)]
pub struct RetentionManager {
    /// Injected visit store.
    store: SharedVisitStore,
    /// Retention window in milliseconds.
    window_ms: i64,
}

impl RetentionManager {
    /// Creates a retention manager with a whole-day window.
    #[must_use]
    pub fn new(store: SharedVisitStore, window_days: u32) -> Self {
        Self {
            store,
            window_ms: days_to_millis(window_days),
        }
    }

    /// Deletes records older than `now_ms - window`, returning the count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the underlying delete fails.
    pub fn cleanup_old_records(&self, now_ms: i64) -> Result<u64, StoreError> {
        self.store.delete_older_than(now_ms.saturating_sub(self.window_ms))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::RetentionManager;
    use crate::core::time::MILLIS_PER_DAY;
    use crate::core::visit::NewVisit;
    use crate::interfaces::VisitStore;
    use crate::runtime::store::InMemoryVisitStore;
    use crate::runtime::store::SharedVisitStore;

    fn sample_visit() -> NewVisit {
        NewVisit {
            screen_width: 1024,
            screen_height: 768,
            links: vec!["https://a.test/x".to_string()],
        }
    }

    #[test]
    fn cleanup_removes_only_expired_records() {
        let store = SharedVisitStore::from_store(InMemoryVisitStore::new());
        let now = 100 * MILLIS_PER_DAY;
        store.insert(&sample_visit(), now - 8 * MILLIS_PER_DAY).unwrap();
        store.insert(&sample_visit(), now - 6 * MILLIS_PER_DAY).unwrap();
        let manager = RetentionManager::new(store, 7);
        assert_eq!(manager.cleanup_old_records(now).unwrap(), 1);
    }

    #[test]
    fn cleanup_is_idempotent() {
        let store = SharedVisitStore::from_store(InMemoryVisitStore::new());
        let now = 100 * MILLIS_PER_DAY;
        store.insert(&sample_visit(), now - 8 * MILLIS_PER_DAY).unwrap();
        let manager = RetentionManager::new(store, 7);
        assert_eq!(manager.cleanup_old_records(now).unwrap(), 1);
        assert_eq!(manager.cleanup_old_records(now).unwrap(), 0);
    }

    #[test]
    fn cleanup_with_no_rows_is_safe() {
        let store = SharedVisitStore::from_store(InMemoryVisitStore::new());
        let manager = RetentionManager::new(store, 7);
        assert_eq!(manager.cleanup_old_records(10 * MILLIS_PER_DAY).unwrap(), 0);
    }

    #[test]
    fn boundary_record_is_kept() {
        let store = SharedVisitStore::from_store(InMemoryVisitStore::new());
        let now = 100 * MILLIS_PER_DAY;
        store.insert(&sample_visit(), now - 7 * MILLIS_PER_DAY).unwrap();
        let manager = RetentionManager::new(store, 7);
        // timestamp == cutoff stays: only strictly older rows are deleted.
        assert_eq!(manager.cleanup_old_records(now).unwrap(), 0);
    }
}
