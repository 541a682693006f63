// crates/fold-track-config/src/lib.rs
// ============================================================================
// Module: Fold Track Config Library
// Description: Public API surface for tracker configuration.
// Purpose: Expose strict, fail-closed config loading and validation.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing sections fall back to documented defaults; invalid values fail
//! closed rather than being coerced. A non-loopback bind address requires an
//! admin token so the report surface is never silently exposed.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditConfig;
pub use config::ConfigError;
pub use config::FoldTrackConfig;
pub use config::ReportConfig;
pub use config::RetentionConfig;
pub use config::ServerConfig;
pub use config::StoreConfig;
