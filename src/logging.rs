//! Tracing configuration and log routing.
//!
//! Logs go to stdout through a compact formatter and, when possible, to a file. Setting
//! `COMPLY_SUMMARIZE_LOG_FILE` appends to that path; otherwise the file logger writes to
//! `logs/comply-summarize.log`. The file layer also records span close events, so every upload
//! leaves one line carrying its `request_id` and total busy/idle time next to the pipeline
//! events it produced.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, fmt::format::FmtSpan, prelude::*};

const LOG_FILE_ENV: &str = "COMPLY_SUMMARIZE_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "comply-summarize.log";
const DEFAULT_FILTER: &str = "info,tower_http=debug";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    /// Append to an explicit file, creating its parent directory when missing.
    File(PathBuf),
    /// `logs/comply-summarize.log` relative to the working directory.
    Default,
}

impl LogTarget {
    fn from_env_value(value: Option<String>) -> Self {
        match value.map(|raw| raw.trim().to_string()) {
            Some(path) if !path.is_empty() => Self::File(PathBuf::from(path)),
            _ => Self::Default,
        }
    }

    fn location(&self) -> (PathBuf, String) {
        match self {
            Self::File(path) => {
                let dir = path
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let file = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
                (dir, file)
            }
            Self::Default => (PathBuf::from(DEFAULT_LOG_DIR), DEFAULT_LOG_FILE.to_string()),
        }
    }
}

/// Configure tracing subscribers for stdout and file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`, with HTTP request traces at `debug`).
/// - Keeps the non-blocking writer alive for the process lifetime through a global guard.
/// - Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let target = LogTarget::from_env_value(std::env::var(LOG_FILE_ENV).ok());
    let result = if let Some(writer) = file_writer(&target) {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .compact();
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    if let Err(err) = result {
        eprintln!("Tracing already initialized: {err}");
    }
}

/// Build a non-blocking appender for `target`, or `None` when its directory cannot be created.
fn file_writer(target: &LogTarget) -> Option<NonBlocking> {
    let (dir, file) = target.location();
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create log directory {}: {err}", dir.display());
        return None;
    }
    let appender = tracing_appender::rolling::never(dir, file);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
