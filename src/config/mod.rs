// src/config/mod.rs

//! Configuration loading and validation for parrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate program entries and forwarded flags (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    ConfigFile, ConfigSection, ProgramConfig, ProgramEntry, ProgramKind, RawConfigFile,
};
pub use validate::parse_forward_args;
