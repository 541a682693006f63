// crates/fold-track-core/src/core/mod.rs
// ============================================================================
// Module: Fold Track Core Types
// Description: Visit records, payload validation, collector, and report model.
// Purpose: Group the domain-level building blocks of the tracking pipeline.
// Dependencies: crate::core::{collector, report, time, visit}
// ============================================================================

//! ## Overview
//! Domain types for the tracking pipeline: the persisted [`VisitRecord`], the
//! wire-level [`TrackPayload`] with its validation rules, the pure viewport
//! collector, report query parameters, and time helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod collector;
pub mod report;
pub mod time;
pub mod visit;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use collector::AnchorSnapshot;
pub use collector::BoundingRect;
pub use collector::PageSnapshot;
pub use collector::Viewport;
pub use collector::collect_above_fold;
pub use report::ReportParams;
pub use report::SortKey;
pub use report::SortOrder;
pub use time::MILLIS_PER_DAY;
pub use time::days_to_millis;
pub use time::unix_millis_now;
pub use visit::NewVisit;
pub use visit::PayloadError;
pub use visit::ScreenDimensions;
pub use visit::TrackPayload;
pub use visit::VisitRecord;
pub use visit::dedup_links;
pub use visit::serialize_links;
