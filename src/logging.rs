// src/logging.rs

//! Diagnostics for `parrun` via `tracing`.
//!
//! The console's stdout belongs to the child programs: the output gate
//! decides whose tagged chunks reach it. Our own events go to stderr so they
//! never land inside another program's stdout window.
//!
//! Level: `--log-level`, else `PARRUN_LOG`, else `info`. Per-spawn
//! `Spawning '...'` lines and gate hand-overs are `debug`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

const LOG_ENV: &str = "PARRUN_LOG";

/// Install the global subscriber. Call once, before the first run.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    if let Some(lvl) = cli_level {
        return match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        };
    }

    match env_value.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("error") => Level::ERROR,
        Some("warn" | "warning") => Level::WARN,
        Some("debug") => Level::DEBUG,
        Some("trace") => Level::TRACE,
        // Unset, "info" or anything unrecognised.
        _ => Level::INFO,
    }
}
