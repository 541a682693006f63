// crates/fold-track-core/src/core/collector.rs
// ============================================================================
// Module: Fold Track Viewport Collector
// Description: Pure above-the-fold detection over a rendered-page snapshot.
// Purpose: Decide which anchors lie fully inside the viewport and build the
//          tracking payload sent to the ingestion endpoint.
// Dependencies: crate::core::visit, serde
// ============================================================================

//! ## Overview
//! The collector is a pure function over a [`PageSnapshot`]: the viewport
//! dimensions plus every anchor's bounding rectangle in viewport coordinates.
//! An anchor counts as above the fold only when its rectangle lies entirely
//! within `[0, width] x [0, height]`; partially visible anchors are excluded.
//! The resulting payload deduplicates by resolved absolute URL. Delivery is
//! the caller's concern (see the `beacon` CLI command) and is best-effort,
//! at-most-once per successful page load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::visit::ScreenDimensions;
use crate::core::visit::TrackPayload;
use crate::core::visit::dedup_links;

// ============================================================================
// SECTION: Snapshot Types
// ============================================================================

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
}

/// Anchor bounding rectangle in viewport coordinates.
///
/// Coordinates follow the DOM `getBoundingClientRect` convention: the origin
/// is the viewport's top-left corner and values may be negative for elements
/// scrolled out of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    /// Distance from the viewport top to the rectangle top.
    pub top: f64,
    /// Distance from the viewport left to the rectangle left.
    pub left: f64,
    /// Distance from the viewport top to the rectangle bottom.
    pub bottom: f64,
    /// Distance from the viewport left to the rectangle right.
    pub right: f64,
}

/// One rendered anchor: resolved absolute URL plus bounding rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSnapshot {
    /// Resolved absolute URL of the anchor.
    pub href: String,
    /// Bounding rectangle in viewport coordinates.
    pub rect: BoundingRect,
}

/// Snapshot of a fully loaded page: viewport plus every anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Viewport dimensions at load time.
    pub viewport: Viewport,
    /// Every hyperlink element in the document.
    pub anchors: Vec<AnchorSnapshot>,
}

// ============================================================================
// SECTION: Collection
// ============================================================================

/// Returns true when the rectangle lies entirely inside the viewport.
fn is_above_fold(rect: &BoundingRect, viewport: Viewport) -> bool {
    rect.top >= 0.0
        && rect.left >= 0.0
        && rect.bottom <= f64::from(viewport.height)
        && rect.right <= f64::from(viewport.width)
}

/// Computes the tracking payload for a page snapshot.
///
/// Anchors only partially inside the viewport are excluded; the remaining
/// URLs are deduplicated. The payload is built even when no anchor qualifies
/// so the server's empty-links rejection stays the single source of truth.
#[must_use]
pub fn collect_above_fold(snapshot: &PageSnapshot) -> TrackPayload {
    let above_fold: Vec<String> = snapshot
        .anchors
        .iter()
        .filter(|anchor| is_above_fold(&anchor.rect, snapshot.viewport))
        .map(|anchor| anchor.href.clone())
        .collect();
    TrackPayload {
        screen: Some(ScreenDimensions {
            width: i64::from(snapshot.viewport.width),
            height: i64::from(snapshot.viewport.height),
        }),
        links: Some(dedup_links(&above_fold)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
