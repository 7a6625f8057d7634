// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::ChildArg;
use crate::pm::DEFAULT_PACKAGE_MANAGER;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// forward_args = true
/// forward = ["--verbose"]
///
/// [[program]]
/// program = "cargo"
/// args = ["build"]
/// prefix = "[build] "
///
/// [[program]]
/// script = "lint"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// `[[program]]` entries, in file order.
    #[serde(default, rename = "program")]
    pub programs: Vec<ProgramConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Append forwarded flags to every program (default `true`).
    #[serde(default = "default_forward_args")]
    pub forward_args: bool,

    /// Flags forwarded to every program, as `--flag` or `--flag=value`.
    #[serde(default)]
    pub forward: Vec<String>,

    /// Project directory for `script`/`bin` entries, relative to the config
    /// file.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,

    /// Package manager executable used by `script`/`bin` entries.
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
}

fn default_forward_args() -> bool {
    true
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_package_manager() -> String {
    DEFAULT_PACKAGE_MANAGER.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            forward_args: default_forward_args(),
            forward: Vec::new(),
            project_dir: default_project_dir(),
            package_manager: default_package_manager(),
        }
    }
}

/// One `[[program]]` entry. Exactly one of `program`, `script` and `bin`
/// must be set.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProgramConfig {
    /// Executable name or path.
    #[serde(default)]
    pub program: Option<String>,

    /// Package-manager script (`<pm> run <script>`).
    #[serde(default)]
    pub script: Option<String>,

    /// Package-manager installed binary (`<pm> bin <bin>`).
    #[serde(default)]
    pub bin: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub prefix: Option<String>,
}

/// What a validated program entry runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramKind {
    Program(String),
    Script(String),
    Bin(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramEntry {
    pub kind: ProgramKind,
    pub args: Vec<String>,
    pub prefix: String,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub forward: Vec<ChildArg>,
    pub programs: Vec<ProgramEntry>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        forward: Vec<ChildArg>,
        programs: Vec<ProgramEntry>,
    ) -> Self {
        Self {
            config,
            forward,
            programs,
        }
    }
}
