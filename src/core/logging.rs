//! Logging initialization.
//!
//! Structured `tracing` logging with a JSON file sink in the app data
//! directory. `log` macro events are redirected into `tracing` so the
//! rest of the crate can keep using `log::{info, warn, ...}!`.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("campaigner").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize the logging system.
///
/// This sets up:
/// 1. A stdout logger (pretty formatted with colors).
/// 2. A file logger (JSON formatted) in the app data directory.
/// 3. Redirects standard `log` crate events to `tracing`.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of the
/// application to ensure buffered logs are flushed on shutdown.
pub fn init() -> WorkerGuard {
    let log_dir = log_dir();
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "campaigner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // File layer: JSON format for easy parsing/ingestion
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(env_filter.clone());

    // Stdout layer: pretty human-readable format with colors
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .pretty()
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .init();

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join("campaigner.log")
    );

    guard
}

/// Initialize the logging system for TUI mode.
///
/// Identical to [`init()`] but omits the stdout layer to avoid corrupting
/// the terminal while ratatui is in raw/alternate-screen mode.
/// All logs go to the file appender only.
pub fn init_tui() -> WorkerGuard {
    let log_dir = log_dir();
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "campaigner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(env_filter);

    // No stdout layer — the TUI owns the terminal
    tracing_subscriber::registry().with(file_layer).init();

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    guard
}
