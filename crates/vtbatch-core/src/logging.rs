//! Logging init: append to `vtbatch.log` under the XDG state dir, or fall
//! back to stderr.
//!
//! Filter directives come from `VTBATCH_LOG`, then `RUST_LOG`, then a
//! default that keeps the batch engine at `debug`. Per-round progress is
//! logged at `info`, so `VTBATCH_LOG=info` is enough to follow a run.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable with filter directives for vtbatch only.
pub const LOG_ENV: &str = "VTBATCH_LOG";

const DEFAULT_FILTER: &str = "info,vtbatch=debug,vtbatch_core=debug";

/// First non-blank of the vtbatch variable, `RUST_LOG`, or the default.
fn resolve_directives(vtbatch: Option<String>, rust_log: Option<String>) -> String {
    vtbatch
        .into_iter()
        .chain(rust_log)
        .map(|d| d.trim().to_string())
        .find(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Directives in effect and the filter built from them. Unparseable
/// directives fall back to the default filter.
fn env_filter() -> (String, EnvFilter) {
    let directives = resolve_directives(
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    match EnvFilter::try_new(&directives) {
        Ok(filter) => (directives, filter),
        Err(_) => (DEFAULT_FILTER.to_string(), EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// `~/.local/state/vtbatch/vtbatch.log`, creating the directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vtbatch")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log dir {}", log_dir.display()))?;
    Ok(log_dir.join("vtbatch.log"))
}

/// Initialize structured logging to the state-dir log file.
/// Returns Err when the file cannot be opened so the caller can fall back
/// to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let (directives, filter) = env_filter();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {e}"))?;

    tracing::info!(log = %path.display(), filter = %directives, "vtbatch logging initialized");
    Ok(())
}

/// Log to stderr only. Never fails; a second subscriber is silently ignored.
pub fn init_logging_stderr() {
    let (directives, filter) = env_filter();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(filter = %directives, "vtbatch logging to stderr");
    }
}
