// crates/fold-track-core/src/interfaces/mod.rs
// ============================================================================
// Module: Fold Track Interfaces
// Description: Persistence contract for visit records.
// Purpose: Decouple the pipeline from storage so tests inject an in-memory
//          store and production injects SQLite.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`VisitStore`] is the only path to persisted visit records: insert, bounded
//! filtered/sorted query, and retention delete. Every component receives a
//! store by injection; nothing reaches storage internals directly. Filter
//! values travel as typed fields so implementations can bind them as
//! parameters — never interpolate them into SQL text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::report::SortKey;
use crate::core::report::SortOrder;
use crate::core::visit::NewVisit;
use crate::core::visit::VisitRecord;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Visit store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("visit store io error: {0}")]
    Io(String),
    /// Stored data is corrupted or fails to decode.
    #[error("visit store corruption: {0}")]
    Corrupt(String),
    /// Invalid data handed to the store.
    #[error("visit store invalid data: {0}")]
    Invalid(String),
    /// Storage engine reported an error.
    #[error("visit store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Bounded filter/sort query over visit records.
///
/// # Invariants
/// - `orderby` is the only value that may select a sort column.
/// - `link_contains` is a raw substring; implementations escape pattern
///   metacharacters before embedding it in a pattern-match operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitQuery {
    /// Inclusive lower bound on `timestamp` in unix milliseconds.
    pub since_ms: i64,
    /// Optional exact-match viewport width filter.
    pub screen_width: Option<u32>,
    /// Optional substring filter against the serialized links.
    pub link_contains: Option<String>,
    /// Sort column from the fixed allow-list.
    pub orderby: SortKey,
    /// Sort direction.
    pub order: SortOrder,
    /// Maximum number of rows returned.
    pub limit: usize,
}

// ============================================================================
// SECTION: Visit Store
// ============================================================================

/// Persistence contract for visit records.
pub trait VisitStore {
    /// Appends a validated visit, assigning its identifier.
    ///
    /// `timestamp_ms` is the server-assigned ingestion time; clients never
    /// supply it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert(&self, visit: &NewVisit, timestamp_ms: i64) -> Result<VisitRecord, StoreError>;

    /// Returns records matching the query, sorted and bounded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query(&self, query: &VisitQuery) -> Result<Vec<VisitRecord>, StoreError>;

    /// Deletes records with `timestamp < cutoff_ms`, returning the count.
    ///
    /// Safe to call with zero matching rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, StoreError>;

    /// Verifies the store can answer a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError>;
}
