// crates/fold-track-config/src/config.rs
// ============================================================================
// Module: Fold Track Configuration
// Description: Configuration loading and validation for the tracker.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: fold-track-core, fold-track-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Config inputs are untrusted: oversized files, non-UTF-8 content, and
//! out-of-range values are rejected instead of coerced. Every section has a
//! complete default so an empty file yields a working loopback deployment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use fold_track_core::DEFAULT_RETENTION_DAYS;
use fold_track_store_sqlite::SqliteStoreConfig;
use fold_track_store_sqlite::SqliteStoreMode;
use fold_track_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "fold-track.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "FOLD_TRACK_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address for the HTTP server.
const DEFAULT_BIND: &str = "127.0.0.1:8320";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Maximum allowed request body size in bytes.
const MAX_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum length of the admin token.
const MAX_ADMIN_TOKEN_LENGTH: usize = 256;
/// Default database filename.
const DEFAULT_STORE_PATH: &str = "fold-track.db";
/// Default busy timeout for the store in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum allowed retention or report window in days.
const MAX_WINDOW_DAYS: u32 = 365;
/// Default retention sweep interval in seconds.
const DEFAULT_RETENTION_INTERVAL_SECS: u64 = 3_600;
/// Minimum allowed retention sweep interval in seconds.
const MIN_RETENTION_INTERVAL_SECS: u64 = 30;
/// Maximum allowed retention sweep interval in seconds.
const MAX_RETENTION_INTERVAL_SECS: u64 = 86_400;
/// Default report window in days.
const DEFAULT_REPORT_WINDOW_DAYS: u32 = 7;
/// Default maximum rows returned by a report query.
const DEFAULT_REPORT_MAX_ROWS: usize = 1_000;
/// Maximum allowed report row cap.
const MAX_REPORT_MAX_ROWS: usize = 10_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Fold Track service configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FoldTrackConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Visit store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Retention policy configuration.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Report query configuration.
    #[serde(default)]
    pub report: ReportConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl FoldTrackConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then `FOLD_TRACK_CONFIG`, then
    /// `fold-track.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.retention.validate()?;
        self.report.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Optional bearer token required by the report endpoint.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            admin_token: None,
        }
    }
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes exceeds the allowed maximum".to_string(),
            ));
        }
        let addr = self.bind_addr()?;
        if let Some(token) = &self.admin_token {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(
                    "server.admin_token must be non-empty when set".to_string(),
                ));
            }
            if trimmed.len() > MAX_ADMIN_TOKEN_LENGTH {
                return Err(ConfigError::Invalid(
                    "server.admin_token exceeds max length".to_string(),
                ));
            }
        } else if !addr.ip().is_loopback() {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without server.admin_token".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid server.bind address".to_string()))
    }
}

/// Visit store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
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

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the store-crate configuration derived from this section.
    #[must_use]
    pub fn to_sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// Retention policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Whether the scheduled retention sweep is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Retention window in whole days.
    #[serde(default = "default_retention_days")]
    pub window_days: u32,
    /// Interval between scheduled sweeps in seconds.
    #[serde(default = "default_retention_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_days: default_retention_days(),
            interval_secs: default_retention_interval_secs(),
        }
    }
}

impl RetentionConfig {
    /// Validates retention configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "retention.window_days must be between 1 and {MAX_WINDOW_DAYS}"
            )));
        }
        if !(MIN_RETENTION_INTERVAL_SECS..=MAX_RETENTION_INTERVAL_SECS)
            .contains(&self.interval_secs)
        {
            return Err(ConfigError::Invalid(format!(
                "retention.interval_secs must be between {MIN_RETENTION_INTERVAL_SECS} and \
                 {MAX_RETENTION_INTERVAL_SECS}"
            )));
        }
        Ok(())
    }
}

/// Report query configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Report window in whole days.
    #[serde(default = "default_report_window_days")]
    pub window_days: u32,
    /// Maximum rows returned by a report query.
    #[serde(default = "default_report_max_rows")]
    pub max_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: default_report_window_days(),
            max_rows: default_report_max_rows(),
        }
    }
}

impl ReportConfig {
    /// Validates report configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "report.window_days must be between 1 and {MAX_WINDOW_DAYS}"
            )));
        }
        if self.max_rows == 0 || self.max_rows > MAX_REPORT_MAX_ROWS {
            return Err(ConfigError::Invalid(format!(
                "report.max_rows must be between 1 and {MAX_REPORT_MAX_ROWS}"
            )));
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit events are emitted to stderr.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default maximum body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default store path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Returns the default store busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default retention window in days.
const fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

/// Returns the default retention sweep interval.
const fn default_retention_interval_secs() -> u64 {
    DEFAULT_RETENTION_INTERVAL_SECS
}

/// Returns the default report window in days.
const fn default_report_window_days() -> u32 {
    DEFAULT_REPORT_WINDOW_DAYS
}

/// Returns the default report row cap.
const fn default_report_max_rows() -> usize {
    DEFAULT_REPORT_MAX_ROWS
}

/// Returns `true` for serde defaults.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
