// crates/fold-track-server/src/audit.rs
// ============================================================================
// Module: Audit Sink
// Description: Structured audit events for tracker operations.
// Purpose: Emit JSON-line audit records for ingestion, report, and retention.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are JSON lines written to stderr, one per operation outcome.
//! Payload contents are never logged: events carry screen dimensions, link
//! counts, and failure reasons, not raw link URLs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::IpAddr;

use fold_track_core::NewVisit;
use serde::Serialize;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Tracker audit event payload.
#[derive(Debug, Serialize)]
pub struct TrackAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Outcome label.
    outcome: &'static str,
    /// Caller IP address (if available).
    #[serde(skip_serializing_if = "Option::is_none")]
    peer_ip: Option<String>,
    /// Reported viewport width.
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_width: Option<u32>,
    /// Reported viewport height.
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_height: Option<u32>,
    /// Number of links in the payload or report.
    #[serde(skip_serializing_if = "Option::is_none")]
    link_count: Option<usize>,
    /// Rows affected by a retention sweep or served by a report.
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<u64>,
    /// Failure reason (for reject and failure events).
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl TrackAuditEvent {
    /// Builds an event for an accepted visit.
    #[must_use]
    pub fn visit_recorded(peer: Option<IpAddr>, visit: &NewVisit) -> Self {
        Self {
            event: "track_ingest",
            outcome: "recorded",
            peer_ip: peer.map(|ip| ip.to_string()),
            screen_width: Some(visit.screen_width),
            screen_height: Some(visit.screen_height),
            link_count: Some(visit.links.len()),
            rows: None,
            reason: None,
        }
    }

    /// Builds an event for a rejected payload.
    #[must_use]
    pub fn visit_rejected(peer: Option<IpAddr>, reason: &str) -> Self {
        Self {
            event: "track_ingest",
            outcome: "rejected",
            peer_ip: peer.map(|ip| ip.to_string()),
            screen_width: None,
            screen_height: None,
            link_count: None,
            rows: None,
            reason: Some(reason.to_string()),
        }
    }

    /// Builds an event for a served report.
    #[must_use]
    pub fn report_served(peer: Option<IpAddr>, rows: u64) -> Self {
        Self {
            event: "report_query",
            outcome: "served",
            peer_ip: peer.map(|ip| ip.to_string()),
            screen_width: None,
            screen_height: None,
            link_count: None,
            rows: Some(rows),
            reason: None,
        }
    }

    /// Builds an event for a denied report request.
    #[must_use]
    pub fn report_denied(peer: Option<IpAddr>) -> Self {
        Self {
            event: "report_query",
            outcome: "denied",
            peer_ip: peer.map(|ip| ip.to_string()),
            screen_width: None,
            screen_height: None,
            link_count: None,
            rows: None,
            reason: Some("missing or invalid admin token".to_string()),
        }
    }

    /// Builds an event for a completed retention sweep.
    #[must_use]
    pub const fn retention_sweep(deleted: u64) -> Self {
        Self {
            event: "retention_sweep",
            outcome: "completed",
            peer_ip: None,
            screen_width: None,
            screen_height: None,
            link_count: None,
            rows: Some(deleted),
            reason: None,
        }
    }

    /// Builds an event for a store failure.
    #[must_use]
    pub fn store_failure(operation: &'static str, reason: &str) -> Self {
        Self {
            event: operation,
            outcome: "store_failure",
            peer_ip: None,
            screen_width: None,
            screen_height: None,
            link_count: None,
            rows: None,
            reason: Some(reason.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Receives tracker audit events.
pub trait TrackAuditSink: Send + Sync {
    /// Records a single audit event.
    fn record(&self, event: &TrackAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl TrackAuditSink for StderrAuditSink {
    fn record(&self, event: &TrackAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let mut stderr = std::io::stderr();
            let _ = writeln!(&mut stderr, "{payload}");
        }
    }
}

/// No-op audit sink for tests and disabled audit config.
pub struct NoopAuditSink;

impl TrackAuditSink for NoopAuditSink {
    fn record(&self, _event: &TrackAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
