// crates/fold-track-store-sqlite/src/lib.rs
// ============================================================================
// Module: Fold Track SQLite Store Library
// Description: Public API surface for the SQLite visit store.
// Purpose: Expose the durable VisitStore implementation and its config.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Durable [`fold_track_core::VisitStore`] backed by `SQLite` WAL. Schema
//! creation is idempotent, all filter values are bound as parameters, and the
//! substring link filter escapes pattern metacharacters before reaching
//! `LIKE`.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteVisitStore;
pub use store::escape_like;
