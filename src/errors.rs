// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::display_command;

#[derive(Error, Debug)]
pub enum ParrunError {
    /// A child process exited with a non-zero code (or was killed by a signal).
    #[error("'{}' failed ({})", display_command(.display_name, .args), describe_code(.code))]
    ProcessExit {
        display_name: String,
        args: Vec<String>,
        code: Option<i32>,
    },

    /// A child process could not be started at all.
    #[error("failed to spawn '{}': {source}", display_command(.display_name, .args))]
    Spawn {
        display_name: String,
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Package manager error: {0}")]
    PackageManager(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParrunError {
    /// Display name of the failing program, for child failures.
    pub fn program(&self) -> Option<&str> {
        match self {
            ParrunError::ProcessExit { display_name, .. }
            | ParrunError::Spawn { display_name, .. } => Some(display_name),
            _ => None,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ParrunError>;
