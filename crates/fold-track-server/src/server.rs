// crates/fold-track-server/src/server.rs
// ============================================================================
// Module: Tracker Server
// Description: HTTP endpoints for ingestion, reporting, and health.
// Purpose: Serve /track, /report, and /healthz over axum with audit logging.
// Dependencies: fold-track-core, fold-track-config, axum, tokio
// ============================================================================

//! ## Overview
//! The tracker server wires the visit store, audit sink, and retention sweep
//! behind three routes. `POST /track` validates beacon payloads fail-closed
//! and assigns the visit timestamp server-side. `GET /report` renders the
//! filtered, sortable report page, optionally gated by a bearer token.
//! `GET /healthz` probes store readiness. Request inputs are untrusted and
//! never reach SQL text or HTML output unescaped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use fold_track_config::FoldTrackConfig;
use fold_track_core::ReportParams;
use fold_track_core::RetentionManager;
use fold_track_core::SharedVisitStore;
use fold_track_core::TrackPayload;
use fold_track_core::VisitStore;
use fold_track_core::days_to_millis;
use fold_track_core::unix_millis_now;
use fold_track_store_sqlite::SqliteVisitStore;
use serde::Serialize;
use serde_json::Value;
use tokio::time::MissedTickBehavior;

use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::audit::TrackAuditEvent;
use crate::audit::TrackAuditSink;
use crate::report::render_report;

// ============================================================================
// SECTION: Tracker Server
// ============================================================================

/// Tracker server instance.
pub struct TrackerServer {
    /// Server configuration.
    config: FoldTrackConfig,
    /// Shared state handed to request handlers.
    state: Arc<ServerState>,
}

impl TrackerServer {
    /// Builds a tracker server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerServerError`] when initialization fails.
    pub fn from_config(config: FoldTrackConfig) -> Result<Self, TrackerServerError> {
        config.validate().map_err(|err| TrackerServerError::Config(err.to_string()))?;
        let sqlite = SqliteVisitStore::new(&config.store.to_sqlite_config())
            .map_err(|err| TrackerServerError::Init(err.to_string()))?;
        let store = SharedVisitStore::from_store(sqlite);
        let audit: Arc<dyn TrackAuditSink> = if config.audit.enabled {
            Arc::new(StderrAuditSink)
        } else {
            Arc::new(NoopAuditSink)
        };
        emit_open_report_warning(&config);
        let state = Arc::new(ServerState {
            store,
            audit,
            max_body_bytes: config.server.max_body_bytes,
            admin_token: config.server.admin_token.clone(),
            report_window_ms: days_to_millis(config.report.window_days),
            report_max_rows: config.report.max_rows,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Serves requests until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), TrackerServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| TrackerServerError::Config(err.to_string()))?;
        if self.config.retention.enabled {
            spawn_retention_sweep(
                Arc::clone(&self.state),
                self.config.retention.window_days,
                self.config.retention.interval_secs,
            );
        }
        let app = build_router(Arc::clone(&self.state));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| TrackerServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| TrackerServerError::Transport("http server failed".to_string()))
    }
}

/// Shared server state for request handlers.
struct ServerState {
    /// Injected visit store.
    store: SharedVisitStore,
    /// Audit event sink.
    audit: Arc<dyn TrackAuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Optional bearer token required by the report endpoint.
    admin_token: Option<String>,
    /// Report window in milliseconds.
    report_window_ms: i64,
    /// Maximum rows returned by a report query.
    report_max_rows: usize,
}

/// Builds the route table over shared state.
fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/track", post(handle_track))
        .route("/report", get(handle_report))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

// ============================================================================
// SECTION: Ingestion Endpoint
// ============================================================================

/// Success payload for accepted visits.
#[derive(Debug, Serialize)]
struct TrackAccepted {
    /// Always true for accepted visits.
    success: bool,
}

/// Handles `POST /track`.
async fn handle_track(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    bytes: Bytes,
) -> impl IntoResponse {
    let (status, body) = track_response(&state, Some(peer.ip()), &bytes);
    (status, axum::Json(body))
}

/// Validates and stores one beacon payload.
///
/// Any malformed or invalid payload maps to the same stable rejection body so
/// callers cannot probe validation internals.
fn track_response(state: &ServerState, peer: Option<IpAddr>, bytes: &[u8]) -> (StatusCode, Value) {
    if bytes.len() > state.max_body_bytes {
        state.audit.record(&TrackAuditEvent::visit_rejected(peer, "payload too large"));
        return error_value(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large");
    }
    let Ok(payload) = serde_json::from_slice::<TrackPayload>(bytes) else {
        state.audit.record(&TrackAuditEvent::visit_rejected(peer, "malformed json"));
        return error_value(StatusCode::BAD_REQUEST, "Invalid payload");
    };
    let visit = match payload.validate() {
        Ok(visit) => visit,
        Err(err) => {
            state.audit.record(&TrackAuditEvent::visit_rejected(peer, &err.to_string()));
            return error_value(StatusCode::BAD_REQUEST, "Invalid payload");
        }
    };
    match state.store.insert(&visit, unix_millis_now()) {
        Ok(_) => {
            state.audit.record(&TrackAuditEvent::visit_recorded(peer, &visit));
            match serde_json::to_value(TrackAccepted {
                success: true,
            }) {
                Ok(body) => (StatusCode::OK, body),
                Err(_) => error_value(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure"),
            }
        }
        Err(err) => {
            state.audit.record(&TrackAuditEvent::store_failure("track_ingest", &err.to_string()));
            error_value(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
        }
    }
}

// ============================================================================
// SECTION: Report Endpoint
// ============================================================================

/// Outcome of a report request before response encoding.
enum ReportOutcome {
    /// Rendered report page.
    Page(String),
    /// Missing or invalid admin token.
    Unauthorized,
    /// Store query failed.
    Failure,
}

/// Handles `GET /report`.
async fn handle_report(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let auth_header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    match report_response(&state, Some(peer.ip()), auth_header, &pairs) {
        ReportOutcome::Page(page) => {
            (StatusCode::OK, [(CONTENT_TYPE, "text/html; charset=utf-8")], page).into_response()
        }
        ReportOutcome::Unauthorized => {
            let (status, body) = error_value(StatusCode::UNAUTHORIZED, "Unauthorized");
            (status, axum::Json(body)).into_response()
        }
        ReportOutcome::Failure => {
            let (status, body) = error_value(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
            (status, axum::Json(body)).into_response()
        }
    }
}

/// Authorizes, queries, and renders one report request.
fn report_response(
    state: &ServerState,
    peer: Option<IpAddr>,
    auth_header: Option<&str>,
    pairs: &[(String, String)],
) -> ReportOutcome {
    if let Some(expected) = &state.admin_token {
        let presented = auth_header.and_then(|value| value.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            state.audit.record(&TrackAuditEvent::report_denied(peer));
            return ReportOutcome::Unauthorized;
        }
    }
    let params =
        ReportParams::from_pairs(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    let query = params.to_query(unix_millis_now(), state.report_window_ms, state.report_max_rows);
    match state.store.query(&query) {
        Ok(rows) => {
            let count = u64::try_from(rows.len()).unwrap_or(u64::MAX);
            state.audit.record(&TrackAuditEvent::report_served(peer, count));
            ReportOutcome::Page(render_report(&params, &rows))
        }
        Err(err) => {
            state.audit.record(&TrackAuditEvent::store_failure("report_query", &err.to_string()));
            ReportOutcome::Failure
        }
    }
}

// ============================================================================
// SECTION: Health Endpoint
// ============================================================================

/// Handles `GET /healthz`.
async fn handle_healthz(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match state.store.readiness() {
        Ok(()) => (StatusCode::OK, axum::Json(serde_json::json!({ "status": "ok" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({ "status": "unavailable" })),
        ),
    }
}

// ============================================================================
// SECTION: Retention Sweep
// ============================================================================

/// Spawns the scheduled retention sweep.
///
/// The first tick fires immediately, so stale rows are purged on startup
/// before the steady interval takes over.
fn spawn_retention_sweep(state: Arc<ServerState>, window_days: u32, interval_secs: u64) {
    let manager = RetentionManager::new(state.store.clone(), window_days);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match manager.cleanup_old_records(unix_millis_now()) {
                Ok(deleted) => {
                    state.audit.record(&TrackAuditEvent::retention_sweep(deleted));
                }
                Err(err) => {
                    state
                        .audit
                        .record(&TrackAuditEvent::store_failure("retention_sweep", &err.to_string()));
                }
            }
        }
    });
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a stable JSON error body.
fn error_value(status: StatusCode, label: &'static str) -> (StatusCode, Value) {
    (status, serde_json::json!({ "error": label }))
}

/// Warns when the report endpoint is reachable without a token.
fn emit_open_report_warning(config: &FoldTrackConfig) {
    if config.server.admin_token.is_none() {
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            &mut stderr,
            "fold-track: WARNING: report endpoint has no admin token; loopback binds only. Set \
             server.admin_token before exposing the server."
        );
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tracker server errors.
#[derive(Debug, thiserror::Error)]
pub enum TrackerServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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

    use std::sync::Arc;

    use axum::http::StatusCode;
    use fold_track_core::InMemoryVisitStore;
    use fold_track_core::NewVisit;
    use fold_track_core::SharedVisitStore;
    use fold_track_core::VisitQuery;
    use fold_track_core::VisitStore;

    use super::ReportOutcome;
    use super::ServerState;
    use super::report_response;
    use super::track_response;
    use crate::audit::NoopAuditSink;

    fn test_state(admin_token: Option<&str>) -> ServerState {
        ServerState {
            store: SharedVisitStore::from_store(InMemoryVisitStore::new()),
            audit: Arc::new(NoopAuditSink),
            max_body_bytes: 64 * 1024,
            admin_token: admin_token.map(ToString::to_string),
            report_window_ms: 7 * 86_400_000,
            report_max_rows: 100,
        }
    }

    fn stored_rows(state: &ServerState) -> usize {
        let query = VisitQuery {
            since_ms: 0,
            screen_width: None,
            link_contains: None,
            orderby: fold_track_core::SortKey::Timestamp,
            order: fold_track_core::SortOrder::Desc,
            limit: 100,
        };
        state.store.query(&query).unwrap().len()
    }

    #[test]
    fn valid_payload_is_accepted_and_stored() {
        let state = test_state(None);
        let body = br#"{"screen":{"width":1024,"height":768},"links":["https://a.test/x"]}"#;
        let (status, value) = track_response(&state, None, body);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, serde_json::json!({ "success": true }));
        assert_eq!(stored_rows(&state), 1);
    }

    #[test]
    fn malformed_json_is_rejected_with_stable_body() {
        let state = test_state(None);
        let (status, value) = track_response(&state, None, b"{not json");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value, serde_json::json!({ "error": "Invalid payload" }));
        assert_eq!(stored_rows(&state), 0);
    }

    #[test]
    fn missing_sections_are_rejected() {
        let state = test_state(None);
        for body in [
            br#"{"links":["https://a.test/x"]}"#.as_slice(),
            br#"{"screen":{"width":1024,"height":768}}"#.as_slice(),
            br#"{"screen":{"width":1024,"height":768},"links":[]}"#.as_slice(),
            br#"{"screen":{"width":0,"height":768},"links":["https://a.test/x"]}"#.as_slice(),
        ] {
            let (status, value) = track_response(&state, None, body);
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(value, serde_json::json!({ "error": "Invalid payload" }));
        }
        assert_eq!(stored_rows(&state), 0);
    }

    #[test]
    fn oversized_body_is_rejected_before_parsing() {
        let mut state = test_state(None);
        state.max_body_bytes = 8;
        let body = br#"{"screen":{"width":1024,"height":768},"links":["https://a.test/x"]}"#;
        let (status, _) = track_response(&state, None, body);
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn duplicate_links_collapse_before_storage() {
        let state = test_state(None);
        let body = br#"{"screen":{"width":1024,"height":768},"links":["https://a.test/x","https://a.test/x"]}"#;
        let (status, _) = track_response(&state, None, body);
        assert_eq!(status, StatusCode::OK);
        let query = VisitQuery {
            since_ms: 0,
            screen_width: None,
            link_contains: None,
            orderby: fold_track_core::SortKey::Timestamp,
            order: fold_track_core::SortOrder::Desc,
            limit: 100,
        };
        let rows = state.store.query(&query).unwrap();
        assert_eq!(rows[0].links.len(), 1);
    }

    #[test]
    fn report_without_token_renders_page_when_open() {
        let state = test_state(None);
        state
            .store
            .insert(
                &NewVisit {
                    screen_width: 1024,
                    screen_height: 768,
                    links: vec!["https://a.test/x".to_string()],
                },
                fold_track_core::unix_millis_now(),
            )
            .unwrap();
        let outcome = report_response(&state, None, None, &[]);
        match outcome {
            ReportOutcome::Page(page) => assert!(page.contains("https://a.test/x")),
            _ => panic!("expected a rendered page"),
        }
    }

    #[test]
    fn report_with_wrong_token_is_unauthorized() {
        let state = test_state(Some("sekrit"));
        assert!(matches!(
            report_response(&state, None, Some("Bearer wrong"), &[]),
            ReportOutcome::Unauthorized
        ));
        assert!(matches!(report_response(&state, None, None, &[]), ReportOutcome::Unauthorized));
    }

    #[test]
    fn report_with_correct_token_is_served() {
        let state = test_state(Some("sekrit"));
        assert!(matches!(
            report_response(&state, None, Some("Bearer sekrit"), &[]),
            ReportOutcome::Page(_)
        ));
    }

    #[test]
    fn report_params_flow_into_the_query() {
        let state = test_state(None);
        let now = fold_track_core::unix_millis_now();
        state
            .store
            .insert(
                &NewVisit {
                    screen_width: 800,
                    screen_height: 600,
                    links: vec!["https://a.test/foo".to_string()],
                },
                now,
            )
            .unwrap();
        state
            .store
            .insert(
                &NewVisit {
                    screen_width: 1024,
                    screen_height: 768,
                    links: vec!["https://a.test/bar".to_string()],
                },
                now,
            )
            .unwrap();
        let pairs = vec![("screen_width".to_string(), "1024".to_string())];
        match report_response(&state, None, None, &pairs) {
            ReportOutcome::Page(page) => {
                assert!(page.contains("https://a.test/bar"));
                assert!(!page.contains("https://a.test/foo"));
            }
            _ => panic!("expected a rendered page"),
        }
    }
}
