// crates/fold-track-core/src/core/time.rs
// ============================================================================
// Module: Fold Track Time Helpers
// Description: Unix-millisecond helpers for ingestion timestamps and windows.
// Purpose: Keep timestamp assignment and window arithmetic in one place.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Visit timestamps are server-assigned unix epoch milliseconds. Report and
//! retention windows are expressed in whole days and converted to millisecond
//! offsets here. Callers that need determinism (tests, retention) pass an
//! explicit `now_ms` instead of reading the clock themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current wall-clock time as unix epoch milliseconds.
///
/// A clock before the unix epoch saturates to zero rather than panicking.
#[must_use]
pub fn unix_millis_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

/// Converts a whole-day window into a millisecond offset.
#[must_use]
pub const fn days_to_millis(days: u32) -> i64 {
    days as i64 * MILLIS_PER_DAY
}

// ============================================================================
// SECTION: Tests
// ============================================================================
