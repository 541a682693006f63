// crates/fold-track-core/src/core/visit.rs
// ============================================================================
// Module: Fold Track Visit Model
// Description: Visit records and ingestion payload validation.
// Purpose: Define the persisted record shape and reject invalid payloads.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`VisitRecord`] captures one tracked page load: server-assigned id and
//! timestamp, the visitor's viewport dimensions, and the deduplicated set of
//! links that were fully above the fold. The wire-level [`TrackPayload`] is
//! untrusted client input and must pass [`TrackPayload::validate`] before
//! anything is persisted. Links are persisted as a JSON array so round-trips
//! are lossless for arbitrary URL strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Records
// ============================================================================

/// One persisted tracking record per page load.
///
/// # Invariants
/// - `screen_width > 0` and `screen_height > 0`.
/// - `links` is non-empty and contains each URL at most once.
/// - `timestamp` is unix epoch milliseconds assigned by the server at
///   ingestion, never client-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Store-assigned unique identifier.
    pub id: i64,
    /// Visit time in unix epoch milliseconds, server-assigned.
    pub timestamp: i64,
    /// Viewport width in pixels at load time.
    pub screen_width: u32,
    /// Viewport height in pixels at load time.
    pub screen_height: u32,
    /// Deduplicated absolute URLs fully inside the viewport at load time.
    pub links: Vec<String>,
}

/// Validated ingestion input ready for persistence.
///
/// # Invariants
/// - Produced only by [`TrackPayload::validate`]; carries the same dimension
///   and link invariants as [`VisitRecord`] minus the store-assigned fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    /// Viewport width in pixels.
    pub screen_width: u32,
    /// Viewport height in pixels.
    pub screen_height: u32,
    /// Deduplicated link URLs.
    pub links: Vec<String>,
}

// ============================================================================
// SECTION: Wire Payload
// ============================================================================

/// Viewport dimensions as submitted by the client.
///
/// Dimensions arrive as signed integers so that invalid client input can be
/// rejected explicitly instead of being coerced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDimensions {
    /// Submitted viewport width in pixels.
    pub width: i64,
    /// Submitted viewport height in pixels.
    pub height: i64,
}

/// Untrusted ingestion payload: `{"screen": {...}, "links": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPayload {
    /// Submitted viewport dimensions, absent when the client omitted them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenDimensions>,
    /// Submitted link URLs, absent when the client omitted them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
}

/// Ingestion payload validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The `screen` field is missing.
    #[error("payload missing screen dimensions")]
    MissingScreen,
    /// The `links` field is missing.
    #[error("payload missing links")]
    MissingLinks,
    /// The `links` field is present but empty.
    #[error("payload links are empty")]
    EmptyLinks,
    /// Width or height is zero, negative, or out of range.
    #[error("invalid screen dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Submitted width.
        width: i64,
        /// Submitted height.
        height: i64,
    },
}

impl TrackPayload {
    /// Validates the payload and produces a [`NewVisit`].
    ///
    /// Duplicate URLs are accepted and collapsed here so that clients without
    /// their own dedup step still produce exactly one record with set
    /// semantics.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when `screen` or `links` is absent, `links` is
    /// empty, or either dimension is non-positive.
    pub fn validate(&self) -> Result<NewVisit, PayloadError> {
        let screen = self.screen.ok_or(PayloadError::MissingScreen)?;
        let links = self.links.as_ref().ok_or(PayloadError::MissingLinks)?;
        if links.is_empty() {
            return Err(PayloadError::EmptyLinks);
        }
        let dimension_error = PayloadError::InvalidDimensions {
            width: screen.width,
            height: screen.height,
        };
        if screen.width <= 0 || screen.height <= 0 {
            return Err(dimension_error);
        }
        let screen_width = u32::try_from(screen.width).map_err(|_| dimension_error.clone())?;
        let screen_height = u32::try_from(screen.height).map_err(|_| dimension_error)?;
        Ok(NewVisit {
            screen_width,
            screen_height,
            links: dedup_links(links),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Deduplicates links preserving first-seen order.
#[must_use]
pub fn dedup_links(links: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(links.len());
    let mut unique = Vec::with_capacity(links.len());
    for link in links {
        if seen.insert(link.as_str()) {
            unique.push(link.clone());
        }
    }
    unique
}

/// Serializes links to the canonical JSON array stored in the links column.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when serialization fails.
pub fn serialize_links(links: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(links)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::PayloadError;
    use super::ScreenDimensions;
    use super::TrackPayload;
    use super::dedup_links;
    use super::serialize_links;

    fn payload(width: i64, height: i64, links: &[&str]) -> TrackPayload {
        TrackPayload {
            screen: Some(ScreenDimensions {
                width,
                height,
            }),
            links: Some(links.iter().map(ToString::to_string).collect()),
        }
    }

    #[test]
    fn valid_payload_produces_visit() {
        let visit = payload(1024, 768, &["https://a.test/x"]).validate().unwrap();
        assert_eq!(visit.screen_width, 1024);
        assert_eq!(visit.screen_height, 768);
        assert_eq!(visit.links, vec!["https://a.test/x".to_string()]);
    }

    #[test]
    fn duplicate_links_collapse_to_one() {
        let visit =
            payload(1024, 768, &["https://a.test/x", "https://a.test/x"]).validate().unwrap();
        assert_eq!(visit.links, vec!["https://a.test/x".to_string()]);
    }

    #[test]
    fn missing_screen_is_rejected() {
        let payload = TrackPayload {
            screen: None,
            links: Some(vec!["https://a.test/x".to_string()]),
        };
        assert_eq!(payload.validate().unwrap_err(), PayloadError::MissingScreen);
    }

    #[test]
    fn missing_links_is_rejected() {
        let payload = TrackPayload {
            screen: Some(ScreenDimensions {
                width: 1024,
                height: 768,
            }),
            links: None,
        };
        assert_eq!(payload.validate().unwrap_err(), PayloadError::MissingLinks);
    }

    #[test]
    fn empty_links_are_rejected() {
        assert_eq!(payload(1024, 768, &[]).validate().unwrap_err(), PayloadError::EmptyLinks);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        assert!(matches!(
            payload(0, 768, &["https://a.test/x"]).validate(),
            Err(PayloadError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            payload(1024, -1, &["https://a.test/x"]).validate(),
            Err(PayloadError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let links = vec!["b".to_string(), "a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(dedup_links(&links), vec!["b", "a", "c"]);
    }

    #[test]
    fn links_round_trip_through_json() {
        let links = vec![
            "https://a.test/x?q=1&r=%20".to_string(),
            "https://a.test/\"quote\"/päge".to_string(),
        ];
        let json = serialize_links(&links).unwrap();
        let restored: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, links);
    }

    #[test]
    fn payload_deserializes_from_wire_shape() {
        let payload: TrackPayload = serde_json::from_str(
            r#"{"screen":{"width":1024,"height":768},"links":["https://a.test/x"]}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    proptest::proptest! {
        #[test]
        fn dedup_output_is_unique_and_order_preserving(
            links in proptest::collection::vec("[a-z]{1,4}", 0..16)
        ) {
            let unique = dedup_links(&links);
            let mut seen = std::collections::HashSet::new();
            for link in &unique {
                assert!(seen.insert(link.clone()));
            }
            // Every survivor appears in the input, in the same relative order.
            let mut cursor = links.iter();
            for link in &unique {
                assert!(cursor.any(|candidate| candidate == link));
            }
        }
    }
}
