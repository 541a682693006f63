// crates/fold-track-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Persistence, filtering, sorting, and retention deletes.
// Purpose: Validate the durable VisitStore against the shared contract.
// ============================================================================

//! ## Overview
//! Unit-level tests for [`fold_track_store_sqlite::SqliteVisitStore`]:
//! - Idempotent schema creation and reopen across connections
//! - Window, width, and substring link filters with bound parameters
//! - Allow-listed sorting and LIKE metacharacter escaping
//! - Strictly-older retention deletes

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

use fold_track_core::NewVisit;
use fold_track_core::SortKey;
use fold_track_core::SortOrder;
use fold_track_core::VisitQuery;
use fold_track_core::VisitStore;
use fold_track_store_sqlite::SqliteStoreConfig;
use fold_track_store_sqlite::SqliteVisitStore;
use fold_track_store_sqlite::escape_like;
use proptest::prelude::proptest;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(dir: &TempDir) -> SqliteVisitStore {
    let config = SqliteStoreConfig {
        path: dir.path().join("visits.db"),
        busy_timeout_ms: 5_000,
        journal_mode: fold_track_store_sqlite::SqliteStoreMode::Wal,
        sync_mode: fold_track_store_sqlite::SqliteSyncMode::Normal,
    };
    SqliteVisitStore::new(&config).unwrap()
}

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

fn seed(store: &SqliteVisitStore) {
    store.insert(&visit(800, 600, &["https://a.test/foo"]), 1_000).unwrap();
    store.insert(&visit(1024, 768, &["https://a.test/bar"]), 2_000).unwrap();
    store.insert(&visit(640, 480, &["https://b.test/foo", "https://b.test/baz"]), 3_000).unwrap();
}

// ============================================================================
// SECTION: Schema Tests
// ============================================================================

#[test]
fn open_is_idempotent_and_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        store.insert(&visit(800, 600, &["https://a.test/x"]), 42).unwrap();
    }
    let reopened = open_store(&dir);
    let rows = reopened.query(&base_query()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, 42);
    assert_eq!(rows[0].links, vec!["https://a.test/x".to_string()]);
}

#[test]
fn readiness_succeeds_on_open_store() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert!(store.readiness().is_ok());
}

// ============================================================================
// SECTION: Insert Tests
// ============================================================================

#[test]
fn insert_returns_full_record_with_monotonic_ids() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let first = store.insert(&visit(800, 600, &["https://a.test/x"]), 1_000).unwrap();
    let second = store.insert(&visit(1024, 768, &["https://a.test/y"]), 2_000).unwrap();
    assert!(second.id > first.id);
    assert_eq!(first.screen_width, 800);
    assert_eq!(first.timestamp, 1_000);
    assert_eq!(second.links, vec!["https://a.test/y".to_string()]);
}

// ============================================================================
// SECTION: Query Tests
// ============================================================================

#[test]
fn window_filter_excludes_older_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let mut query = base_query();
    query.since_ms = 2_000;
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.timestamp >= 2_000));
}

#[test]
fn width_filter_matches_exactly() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let mut query = base_query();
    query.screen_width = Some(1024);
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].screen_width, 1024);
}

#[test]
fn link_filter_matches_substring() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let mut query = base_query();
    query.link_contains = Some("foo".to_string());
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn link_filter_treats_percent_literally() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.insert(&visit(800, 600, &["https://a.test/50%25off"]), 1_000).unwrap();
    store.insert(&visit(800, 600, &["https://a.test/plain"]), 2_000).unwrap();
    let mut query = base_query();
    query.link_contains = Some("50%25".to_string());
    assert_eq!(store.query(&query).unwrap().len(), 1);
    // A bare wildcard matches nothing unless a literal percent is stored.
    query.link_contains = Some("%".to_string());
    assert_eq!(store.query(&query).unwrap().len(), 1);
}

#[test]
fn link_filter_treats_underscore_literally() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.insert(&visit(800, 600, &["https://a.test/snake_case"]), 1_000).unwrap();
    store.insert(&visit(800, 600, &["https://a.test/snakeXcase"]), 2_000).unwrap();
    let mut query = base_query();
    query.link_contains = Some("snake_case".to_string());
    let rows = store.query(&query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].links, vec!["https://a.test/snake_case".to_string()]);
}

#[test]
fn link_filter_with_quote_is_inert() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let mut query = base_query();
    query.link_contains = Some("'; DROP TABLE visits; --".to_string());
    assert!(store.query(&query).unwrap().is_empty());
    // Table still intact afterwards.
    assert_eq!(store.query(&base_query()).unwrap().len(), 3);
}

#[test]
fn width_sort_ascending_orders_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let mut query = base_query();
    query.orderby = SortKey::ScreenWidth;
    query.order = SortOrder::Asc;
    let widths: Vec<u32> =
        store.query(&query).unwrap().iter().map(|row| row.screen_width).collect();
    assert_eq!(widths, vec![640, 800, 1024]);
}

#[test]
fn timestamp_sort_descending_is_default_shape() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let stamps: Vec<i64> =
        store.query(&base_query()).unwrap().iter().map(|row| row.timestamp).collect();
    assert_eq!(stamps, vec![3_000, 2_000, 1_000]);
}

#[test]
fn equal_sort_keys_keep_insertion_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.insert(&visit(800, 600, &["https://a.test/x"]), 5_000).unwrap();
    store.insert(&visit(800, 600, &["https://a.test/y"]), 5_000).unwrap();
    let rows = store.query(&base_query()).unwrap();
    assert!(rows[0].id < rows[1].id);
}

#[test]
fn limit_bounds_result_size() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let mut query = base_query();
    query.limit = 2;
    assert_eq!(store.query(&query).unwrap().len(), 2);
}

// ============================================================================
// SECTION: Retention Tests
// ============================================================================

#[test]
fn delete_older_than_removes_strictly_older_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    assert_eq!(store.delete_older_than(2_000).unwrap(), 1);
    let remaining = store.query(&base_query()).unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|row| row.timestamp >= 2_000));
}

#[test]
fn delete_older_than_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    assert_eq!(store.delete_older_than(3_000).unwrap(), 2);
    assert_eq!(store.delete_older_than(3_000).unwrap(), 0);
}

// ============================================================================
// SECTION: Escape Properties
// ============================================================================

proptest! {
    #[test]
    fn escape_like_output_has_no_unescaped_metacharacters(input in ".*") {
        let escaped = escape_like(&input);
        let mut chars = escaped.chars();
        while let Some(character) = chars.next() {
            if character == '\\' {
                let follower = chars.next();
                assert!(matches!(follower, Some('\\' | '%' | '_')));
            } else {
                assert!(character != '%' && character != '_');
            }
        }
    }

    #[test]
    fn escape_like_preserves_plain_text(input in "[a-zA-Z0-9/:.-]*") {
        assert_eq!(escape_like(&input), input);
    }
}
