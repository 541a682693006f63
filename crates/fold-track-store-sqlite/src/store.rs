// crates/fold-track-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Visit Store
// Description: Durable VisitStore backed by SQLite WAL.
// Purpose: Persist visit records with parameter-bound filter/sort queries.
// Dependencies: fold-track-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`VisitStore`] using `SQLite`. The schema
//! is created idempotently on open, links are stored as a JSON array in a
//! TEXT column, and every user-supplied filter value is bound as a parameter.
//! Sort columns come from the fixed [`SortKey`] table; request input never
//! reaches the ORDER BY clause. Database contents are untrusted: rows that
//! fail to decode surface as corruption errors instead of panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use fold_track_core::NewVisit;
use fold_track_core::SortKey;
use fold_track_core::SortOrder;
use fold_track_core::StoreError;
use fold_track_core::VisitQuery;
use fold_track_core::VisitRecord;
use fold_track_core::VisitStore;
use fold_track_core::serialize_links;
use rusqlite::Connection;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` visit store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or undecodable row data.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed visit store with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex; row identifiers and
///   atomicity rely on the engine's native insert guarantees.
#[derive(Clone)]
pub struct SqliteVisitStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteVisitStore {
    /// Opens an `SQLite`-backed visit store and ensures the schema.
    ///
    /// Safe to call on every startup; schema creation is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite mutex poisoned".to_string()))
    }
}

impl VisitStore for SqliteVisitStore {
    fn insert(&self, visit: &NewVisit, timestamp_ms: i64) -> Result<VisitRecord, StoreError> {
        let links_json =
            serialize_links(&visit.links).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT INTO visits (timestamp, screen_width, screen_height, links) VALUES (?1, \
                 ?2, ?3, ?4)",
                params![
                    timestamp_ms,
                    i64::from(visit.screen_width),
                    i64::from(visit.screen_height),
                    links_json
                ],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let id = guard.last_insert_rowid();
        Ok(VisitRecord {
            id,
            timestamp: timestamp_ms,
            screen_width: visit.screen_width,
            screen_height: visit.screen_height,
            links: visit.links.clone(),
        })
    }

    fn query(&self, query: &VisitQuery) -> Result<Vec<VisitRecord>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        query_visits(&guard, query).map_err(StoreError::from)
    }

    fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let deleted = guard
            .execute("DELETE FROM visits WHERE timestamp < ?1", params![cutoff_ms])
            .map_err(|err| StoreError::Store(err.to_string()))?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|err| StoreError::Store(err.to_string()))
    }
}

// ============================================================================
// SECTION: Query Construction
// ============================================================================

/// Returns the column name for an allow-listed sort key.
const fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::Timestamp => "timestamp",
        SortKey::ScreenWidth => "screen_width",
        SortKey::ScreenHeight => "screen_height",
    }
}

/// Returns the SQL direction keyword for a sort order.
const fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Escapes `LIKE` pattern metacharacters for use with `ESCAPE '\'`.
#[must_use]
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

/// Runs the bounded filter/sort query against an open connection.
///
/// The SQL text varies only in which fixed clauses are present; every
/// user-supplied value is bound as a parameter.
fn query_visits(
    connection: &Connection,
    query: &VisitQuery,
) -> Result<Vec<VisitRecord>, SqliteStoreError> {
    let mut sql = String::from(
        "SELECT id, timestamp, screen_width, screen_height, links FROM visits WHERE timestamp >= \
         ?",
    );
    let mut bindings: Vec<Value> = vec![Value::Integer(query.since_ms)];
    if let Some(width) = query.screen_width {
        sql.push_str(" AND screen_width = ?");
        bindings.push(Value::Integer(i64::from(width)));
    }
    if let Some(needle) = &query.link_contains {
        sql.push_str(" AND links LIKE ? ESCAPE '\\'");
        bindings.push(Value::Text(format!("%{}%", escape_like(needle))));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(sort_column(query.orderby));
    sql.push(' ');
    sql.push_str(sort_direction(query.order));
    // Secondary id ASC keeps ties in insertion order, matching the in-memory
    // store's stable sort.
    sql.push_str(", id ASC LIMIT ?");
    let limit = i64::try_from(query.limit)
        .map_err(|_| SqliteStoreError::Invalid("query limit too large".to_string()))?;
    bindings.push(Value::Integer(limit));
    let mut statement =
        connection.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map(params_from_iter(bindings), |row| {
            let id: i64 = row.get(0)?;
            let timestamp: i64 = row.get(1)?;
            let screen_width: i64 = row.get(2)?;
            let screen_height: i64 = row.get(3)?;
            let links_json: String = row.get(4)?;
            Ok((id, timestamp, screen_width, screen_height, links_json))
        })
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let mut records = Vec::new();
    for row in rows {
        let (id, timestamp, raw_width, raw_height, links_json) =
            row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let screen_width = u32::try_from(raw_width).map_err(|_| {
            SqliteStoreError::Corrupt(format!("negative screen width for visit {id}"))
        })?;
        let screen_height = u32::try_from(raw_height).map_err(|_| {
            SqliteStoreError::Corrupt(format!("negative screen height for visit {id}"))
        })?;
        let links: Vec<String> = serde_json::from_str(&links_json).map_err(|_| {
            SqliteStoreError::Corrupt(format!("undecodable links for visit {id}"))
        })?;
        records.push(VisitRecord {
            id,
            timestamp,
            screen_width,
            screen_height,
            links,
        });
    }
    Ok(records)
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Validates the configured store path.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(SqliteStoreError::Invalid("store path is empty".to_string()));
    }
    if raw.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path too long".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid("store path component too long".to_string()));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path is a directory".to_string()));
    }
    Ok(())
}

/// Creates the parent directory for the database file when missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Opens a connection and applies the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let connection =
        Connection::open(&config.path).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .pragma_update(None, "synchronous", config.sync_mode.pragma_value())
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Idempotently creates the schema and checks the stored version.
fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    let version: i64 = connection
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if version > SCHEMA_VERSION {
        return Err(SqliteStoreError::VersionMismatch(format!(
            "database schema version {version} is newer than supported {SCHEMA_VERSION}"
        )));
    }
    connection
        .execute_batch(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS visits (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 timestamp INTEGER NOT NULL,
                 screen_width INTEGER NOT NULL,
                 screen_height INTEGER NOT NULL,
                 links TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_visits_timestamp ON visits (timestamp);
             COMMIT;",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
