// crates/fold-track-core/tests/visit_query_unit.rs
// ============================================================================
// Module: Visit Query Unit Tests
// Description: Filter, sort, and window behavior of the in-memory store.
// Purpose: Validate the VisitStore contract the SQLite backend must mirror.
// ============================================================================

//! ## Overview
//! Unit-level tests for the in-memory [`fold_track_core::VisitStore`]
//! implementation:
//! - Report-window base filter and limit bounds
//! - Exact-match width filter and substring link filter
//! - Allow-listed sorting in both directions

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use fold_track_core::InMemoryVisitStore;
use fold_track_core::NewVisit;
use fold_track_core::SortKey;
use fold_track_core::SortOrder;
use fold_track_core::VisitQuery;
use fold_track_core::VisitStore;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn visit(width: u32, height: u32, links: &[&str]) -> NewVisit {
    NewVisit {
        screen_width: width,
        screen_height: height,
        links: links.iter().map(ToString::to_string).collect(),
    }
}

fn base_query() -> VisitQuery {
    VisitQuery {
        since_ms: 0,
        screen_width: None,
        link_contains: None,
        orderby: SortKey::Timestamp,
        order: SortOrder::Desc,
        limit: 100,
    }
}

fn seeded_store() -> InMemoryVisitStore {
    let store = InMemoryVisitStore::new();
    store.insert(&visit(800, 600, &["https://a.test/foo"]), 1_000).unwrap();
    store.insert(&visit(1024, 768, &["https://a.test/bar"]), 2_000).unwrap();
    store.insert(&visit(640, 480, &["https://b.test/foo", "https://b.test/baz"]), 3_000).unwrap();
    store
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn window_filter_excludes_older_rows() {
    let store = seeded_store();
    let mut query = base_query();
    query.since_ms = 2_000;
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.timestamp >= 2_000));
}

#[test]
fn width_filter_matches_exactly() {
    let store = seeded_store();
    let mut query = base_query();
    query.screen_width = Some(1024);
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].screen_width, 1024);
}

#[test]
fn link_contains_matches_serialized_links() {
    let store = seeded_store();
    let mut query = base_query();
    query.link_contains = Some("foo".to_string());
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert!(row.links.iter().any(|link| link.contains("foo")));
    }
}

#[test]
fn width_sort_ascending_is_non_decreasing() {
    let store = seeded_store();
    let mut query = base_query();
    query.orderby = SortKey::ScreenWidth;
    query.order = SortOrder::Asc;
    let rows = store.query(&query).unwrap();
    let widths: Vec<u32> = rows.iter().map(|row| row.screen_width).collect();
    assert_eq!(widths, vec![640, 800, 1024]);
}

#[test]
fn timestamp_sort_descending_is_default_shape() {
    let store = seeded_store();
    let rows = store.query(&base_query()).unwrap();
    let stamps: Vec<i64> = rows.iter().map(|row| row.timestamp).collect();
    assert_eq!(stamps, vec![3_000, 2_000, 1_000]);
}

#[test]
fn limit_bounds_result_size() {
    let store = seeded_store();
    let mut query = base_query();
    query.limit = 2;
    assert_eq!(store.query(&query).unwrap().len(), 2);
}

#[test]
fn insert_assigns_monotonic_ids() {
    let store = InMemoryVisitStore::new();
    let first = store.insert(&visit(800, 600, &["https://a.test/x"]), 1_000).unwrap();
    let second = store.insert(&visit(800, 600, &["https://a.test/y"]), 2_000).unwrap();
    assert!(second.id > first.id);
}
