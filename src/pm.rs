// src/pm.rs

//! Package-manager helper.
//!
//! Builds [`ProgramSpec`]s for `<pm> run <script>` and for binaries that the
//! package manager installed into the project (`<pm> bin <name>`). Both run
//! with the project directory as their working directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{ParrunError, Result};
use crate::types::{display_command, ProgramSpec};

pub const DEFAULT_PACKAGE_MANAGER: &str = "yarn";

#[derive(Debug, Clone)]
pub struct PackageManager {
    project_dir: PathBuf,
    executable: String,
}

impl PackageManager {
    /// `executable` is looked up inside `project_dir` first (a checked-in
    /// wrapper script) and falls back to the bare name on `PATH`.
    pub fn new(project_dir: impl Into<PathBuf>, executable: &str) -> Self {
        let project_dir = project_dir.into();
        let name = platform_executable(executable);
        let local = project_dir.join(&name);
        let executable = if local.is_file() {
            local.to_string_lossy().into_owned()
        } else {
            name
        };

        Self {
            project_dir,
            executable,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// `<pm> run <script> <args...>`.
    pub fn script(&self, script: &str, args: &[String], prefix: &str) -> ProgramSpec {
        let mut full_args = vec!["run".to_string(), script.to_string()];
        full_args.extend(args.iter().cloned());

        ProgramSpec::new(self.executable.clone())
            .args(full_args)
            .prefix(prefix)
            .cwd(self.project_dir.clone())
    }

    /// Resolve `bin` through `<pm> bin <bin>` and build a spec that runs it.
    pub async fn bin(&self, bin: &str, args: &[String], prefix: &str) -> Result<ProgramSpec> {
        let path = self.resolve_bin(bin).await?;
        Ok(ProgramSpec::new(platform_executable(&path))
            .args(args.iter().cloned())
            .prefix(prefix)
            .cwd(self.project_dir.clone()))
    }

    async fn resolve_bin(&self, bin: &str) -> Result<String> {
        let query = ["bin".to_string(), bin.to_string()];
        debug!(
            project_dir = %self.project_dir.display(),
            "resolving binary with '{}'",
            display_command(&self.executable, &query)
        );

        let output = Command::new(&self.executable)
            .args(&query)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("running '{}'", display_command(&self.executable, &query)))?;

        if !output.status.success() {
            return Err(ParrunError::PackageManager(format!(
                "'{}' failed: {}",
                display_command(&self.executable, &query),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if path.is_empty() {
            return Err(ParrunError::PackageManager(format!(
                "'{}' printed no path",
                display_command(&self.executable, &query)
            )));
        }

        debug!(bin, path = %path, "resolved binary");
        Ok(path)
    }
}

fn platform_executable(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.cmd")
    } else {
        name.to_string()
    }
}
