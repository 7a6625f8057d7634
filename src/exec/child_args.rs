// src/exec/child_args.rs

//! Inherited command-line options forwarded to every child.
//!
//! The orchestrator asks a [`ChildArgSource`] once per run and merges the
//! result into each program's own arguments with [`merge_child_args`].

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use crate::errors::{ParrunError, Result};

/// A forwarded flag, optionally followed by a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildArg {
    pub flag: String,
    pub value: Option<String>,
}

impl ChildArg {
    pub fn flag(flag: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: None,
        }
    }

    pub fn with_value(flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: Some(value.into()),
        }
    }
}

/// Parses `--flag` or `--flag=value`.
impl FromStr for ChildArg {
    type Err = ParrunError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (flag, value) = match s.split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (s, None),
        };

        if !flag.starts_with('-') || flag.trim_start_matches('-').is_empty() {
            return Err(ParrunError::ConfigError(format!(
                "invalid forwarded argument '{s}' (expected --flag or --flag=value)"
            )));
        }

        Ok(Self {
            flag: flag.to_string(),
            value,
        })
    }
}

/// Where inherited arguments come from.
pub trait ChildArgSource: Send + Sync {
    fn child_args(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ChildArg>>> + Send + '_>>;
}

/// A fixed list of inherited arguments, e.g. collected from the CLI and the
/// config file at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticArgs {
    args: Vec<ChildArg>,
}

impl StaticArgs {
    pub fn new(args: Vec<ChildArg>) -> Self {
        Self { args }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl ChildArgSource for StaticArgs {
    fn child_args(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ChildArg>>> + Send + '_>> {
        let args = self.args.clone();
        Box::pin(async move { Ok(args) })
    }
}

/// Append each inherited flag not already present in `args`.
///
/// Flags are appended in the order given, each followed by its value when it
/// has one. A flag already present (including one appended earlier in the
/// same merge) is skipped together with its value.
pub fn merge_child_args(args: &[String], inherited: &[ChildArg]) -> Vec<String> {
    let mut merged = args.to_vec();
    for arg in inherited {
        if merged.iter().any(|existing| *existing == arg.flag) {
            continue;
        }
        merged.push(arg.flag.clone());
        if let Some(value) = &arg.value {
            merged.push(value.clone());
        }
    }
    merged
}
