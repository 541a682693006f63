// crates/fold-track-server/src/lib.rs
// ============================================================================
// Module: Fold Track Server Library
// Description: HTTP surface for visit ingestion, reporting, and health.
// Purpose: Expose the tracker service built on axum and the visit store.
// Dependencies: fold-track-core, fold-track-config, axum, tokio
// ============================================================================

//! ## Overview
//! The tracker server accepts beacon payloads on `POST /track`, serves the
//! filtered and sorted visit report on `GET /report`, and reports store
//! readiness on `GET /healthz`. Request inputs are untrusted: payloads are
//! validated fail-closed and report parameters recover to safe defaults. A
//! scheduled retention sweep deletes visits older than the configured window.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod report;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::TrackAuditEvent;
pub use audit::TrackAuditSink;
pub use report::render_report;
pub use server::TrackerServer;
pub use server::TrackerServerError;
