//! Tracing subscriber setup.
//!
//! Logs go to stderr, or to `log.file` when configured; stdout carries only
//! inventory reports. `RUST_LOG` takes precedence over the configured level.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parses a level name such as "info" or "DEBUG".
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(level.trim()).ok()
}

/// Installs the global tracing subscriber.
///
/// # Arguments
/// * `level` - Level name; an unrecognised name falls back to `info` and is
///   reported once logging is up
/// * `file` - Append logs to this file (without ANSI colours) instead of stderr
///
/// # Errors
/// This function will return an error if:
/// - The log file cannot be opened for appending
/// - A global subscriber is already installed
pub fn init(level: &str, file: Option<&Path>) -> Result<()> {
    let parsed = parse_level(level);
    let filter = EnvFilter::builder()
        .with_default_directive(parsed.unwrap_or(LevelFilter::INFO).into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    match file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {path:?}"))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(log_file))
                        .with_ansi(false),
                )
                .try_init()
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init(),
    }
    .context("Failed to initialize logging")?;

    if parsed.is_none() {
        warn!(level, "Invalid log level, falling back to info");
    }
    Ok(())
}
