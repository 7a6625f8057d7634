// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `parrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parrun",
    version,
    about = "Run several programs in parallel without interleaving their output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Parrun.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Flag forwarded to every program unless it already passes it.
    ///
    /// Accepts `--flag` or `--flag=value`; may be repeated. Appended after
    /// the config file's `[config].forward` entries.
    #[arg(long = "forward", value_name = "FLAG[=VALUE]", allow_hyphen_values = true)]
    pub forward: Vec<String>,

    /// Do not forward any flags, overriding `[config].forward_args`.
    #[arg(long)]
    pub no_forward: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PARRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved programs, but don't run them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
