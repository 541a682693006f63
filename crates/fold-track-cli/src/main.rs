// crates/fold-track-cli/src/main.rs
// ============================================================================
// Module: Fold Track CLI Entry Point
// Description: Command dispatcher for the tracker server and offline tasks.
// Purpose: Provide serve, cleanup, and beacon commands over one config.
// Dependencies: clap, fold-track-core, fold-track-config, fold-track-server
// ============================================================================

//! ## Overview
//! The Fold Track CLI starts the tracker server, runs one-shot retention
//! cleanups against the configured store, and submits beacon payloads built
//! from page snapshot files. Inputs are untrusted: snapshot files are size
//! capped and endpoints must parse as http or https URLs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use fold_track_config::FoldTrackConfig;
use fold_track_core::PageSnapshot;
use fold_track_core::RetentionManager;
use fold_track_core::SharedVisitStore;
use fold_track_core::TrackPayload;
use fold_track_core::collect_above_fold;
use fold_track_core::unix_millis_now;
use fold_track_server::TrackerServer;
use fold_track_store_sqlite::SqliteVisitStore;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum page snapshot file size in bytes.
const MAX_SNAPSHOT_FILE_SIZE: usize = 1024 * 1024;
/// Beacon request timeout in seconds.
const BEACON_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "fold-track", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the tracker HTTP server.
    Serve(ServeCommand),
    /// Delete visits older than the retention window.
    Cleanup(CleanupCommand),
    /// Build a beacon payload from a page snapshot and submit it.
    Beacon(BeaconCommand),
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `cleanup` command.
#[derive(Args, Debug)]
struct CleanupCommand {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the configured retention window in days.
    #[arg(long, value_name = "DAYS")]
    window_days: Option<u32>,
}

/// Arguments for the `beacon` command.
#[derive(Args, Debug)]
struct BeaconCommand {
    /// Tracker base URL, for example `http://127.0.0.1:8320`.
    #[arg(long, value_name = "URL")]
    endpoint: String,
    /// Path to a JSON page snapshot file.
    #[arg(long, value_name = "PATH")]
    snapshot: PathBuf,
    /// Print the payload instead of sending it.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying a user-facing message.
#[derive(Debug)]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.message)
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("fold-track {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        write_stderr_line("fold-track: no command given; see --help")
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::FAILURE);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Cleanup(command) => command_cleanup(command),
        Commands::Beacon(command) => command_beacon(command).await,
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = FoldTrackConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let server = TrackerServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Cleanup Command
// ============================================================================

/// Executes the `cleanup` command.
fn command_cleanup(command: CleanupCommand) -> CliResult<ExitCode> {
    let config = FoldTrackConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let window_days = command.window_days.unwrap_or(config.retention.window_days);
    if window_days == 0 {
        return Err(CliError::new("window days must be greater than zero".to_string()));
    }
    let sqlite = SqliteVisitStore::new(&config.store.to_sqlite_config())
        .map_err(|err| CliError::new(format!("store open failed: {err}")))?;
    let store = SharedVisitStore::from_store(sqlite);
    let manager = RetentionManager::new(store, window_days);
    let deleted = manager
        .cleanup_old_records(unix_millis_now())
        .map_err(|err| CliError::new(format!("cleanup failed: {err}")))?;
    write_stdout_line(&format!("deleted {deleted} visits older than {window_days} days"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Beacon Command
// ============================================================================

/// Executes the `beacon` command.
async fn command_beacon(command: BeaconCommand) -> CliResult<ExitCode> {
    let endpoint = parse_endpoint(&command.endpoint)?;
    let payload = load_snapshot_payload(&command.snapshot)?;
    let body = serde_json::to_string(&payload)
        .map_err(|err| CliError::new(format!("payload serialization failed: {err}")))?;
    if command.dry_run {
        write_stdout_line(&body).map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let (status, response_body) = tokio::task::spawn_blocking(move || send_beacon(&endpoint, body))
        .await
        .map_err(|err| CliError::new(format!("beacon task failed: {err}")))??;
    write_stdout_line(&format!("{status} {response_body}"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if status.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Validates the tracker endpoint and resolves the track URL.
fn parse_endpoint(raw: &str) -> CliResult<Url> {
    let base = Url::parse(raw.trim())
        .map_err(|_| CliError::new("endpoint must be a valid URL".to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(CliError::new("endpoint must use http or https".to_string()));
    }
    base.join("/track").map_err(|_| CliError::new("endpoint cannot address /track".to_string()))
}

/// Loads a page snapshot file and collects its above-the-fold payload.
fn load_snapshot_payload(path: &Path) -> CliResult<TrackPayload> {
    let bytes =
        fs::read(path).map_err(|err| CliError::new(format!("snapshot read failed: {err}")))?;
    if bytes.len() > MAX_SNAPSHOT_FILE_SIZE {
        return Err(CliError::new("snapshot file exceeds size limit".to_string()));
    }
    let snapshot: PageSnapshot = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("snapshot parse failed: {err}")))?;
    Ok(collect_above_fold(&snapshot))
}

/// Sends one beacon payload over HTTP.
fn send_beacon(endpoint: &Url, body: String) -> CliResult<(reqwest::StatusCode, String)> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(BEACON_TIMEOUT_SECS))
        .build()
        .map_err(|err| CliError::new(format!("http client build failed: {err}")))?;
    let response = client
        .post(endpoint.clone())
        .header("content-type", "application/json")
        .body(body)
        .send()
        .map_err(|err| CliError::new(format!("beacon send failed: {err}")))?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|err| CliError::new(format!("beacon response read failed: {err}")))?;
    Ok((status, text))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
