// crates/fold-track-core/src/lib.rs
// ============================================================================
// Module: Fold Track Core Library
// Description: Public API surface for the Fold Track core.
// Purpose: Expose visit domain types, store interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Fold Track core models above-the-fold link tracking: the visit record, the
//! viewport collector that decides which links are fully visible, the report
//! query model, and the `VisitStore` persistence interface. It is
//! backend-agnostic; durable storage lives in `fold-track-store-sqlite`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::StoreError;
pub use interfaces::VisitQuery;
pub use interfaces::VisitStore;
pub use runtime::DEFAULT_RETENTION_DAYS;
pub use runtime::InMemoryVisitStore;
pub use runtime::RetentionManager;
pub use runtime::SharedVisitStore;
