// crates/fold-track-core/src/runtime/mod.rs
// ============================================================================
// Module: Fold Track Runtime Helpers
// Description: In-memory store and retention manager.
// Purpose: Provide the test-grade store and the retention policy runtime.
// Dependencies: crate::runtime::{retention, store}
// ============================================================================

//! ## Overview
//! Runtime helpers built on the [`crate::interfaces::VisitStore`] contract:
//! the in-memory store used by tests and local demos, the shared store
//! wrapper, and the retention manager that enforces the cleanup window.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod retention;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use retention::DEFAULT_RETENTION_DAYS;
pub use retention::RetentionManager;
pub use store::InMemoryVisitStore;
pub use store::SharedVisitStore;
