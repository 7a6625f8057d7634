// src/config/validate.rs

use crate::config::model::{ConfigFile, ProgramConfig, ProgramEntry, ProgramKind, RawConfigFile};
use crate::errors::{ParrunError, Result};
use crate::exec::ChildArg;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ParrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_programs(&raw)?;
        validate_global_config(&raw)?;

        let forward = parse_forward_args(&raw.config.forward)?;
        let programs = raw
            .programs
            .iter()
            .enumerate()
            .map(|(index, program)| validate_program(index, program))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile::new_unchecked(raw.config, forward, programs))
    }
}

fn ensure_has_programs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.programs.is_empty() {
        return Err(ParrunError::ConfigError(
            "config must contain at least one [[program]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.package_manager.trim().is_empty() {
        return Err(ParrunError::ConfigError(
            "[config].package_manager must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parse `[config].forward` entries, keeping their order.
pub fn parse_forward_args(entries: &[String]) -> Result<Vec<ChildArg>> {
    entries.iter().map(|entry| entry.parse()).collect()
}

fn validate_program(index: usize, program: &ProgramConfig) -> Result<ProgramEntry> {
    let kinds: Vec<ProgramKind> = [
        program.program.clone().map(ProgramKind::Program),
        program.script.clone().map(ProgramKind::Script),
        program.bin.clone().map(ProgramKind::Bin),
    ]
    .into_iter()
    .flatten()
    .collect();

    let kind = match <[ProgramKind; 1]>::try_from(kinds) {
        Ok([kind]) => kind,
        Err(kinds) if kinds.is_empty() => {
            return Err(ParrunError::ConfigError(format!(
                "program #{index}: one of `program`, `script` or `bin` is required"
            )));
        }
        Err(_) => {
            return Err(ParrunError::ConfigError(format!(
                "program #{index}: `program`, `script` and `bin` are mutually exclusive"
            )));
        }
    };

    let name = match &kind {
        ProgramKind::Program(name) | ProgramKind::Script(name) | ProgramKind::Bin(name) => name,
    };
    if name.trim().is_empty() {
        return Err(ParrunError::ConfigError(format!(
            "program #{index}: name must not be empty"
        )));
    }

    Ok(ProgramEntry {
        kind,
        args: program.args.clone(),
        prefix: program.prefix.clone().unwrap_or_default(),
    })
}
