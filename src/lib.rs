// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod gate;
pub mod logging;
pub mod pm;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::{parse_forward_args, ConfigFile, ProgramKind};
use crate::engine::Orchestrator;
use crate::exec::{merge_child_args, ChildArg, ChildArgSource, StaticArgs};
use crate::pm::PackageManager;
use crate::types::{display_command, ProgramSpec};

pub use crate::errors::ParrunError;

/// Run `programs` in parallel on the process's own stdout/stderr.
///
/// Resolves once every program has exited and flushed the output it wrote
/// before exiting. Fails with the first program (in exit order) that exited
/// non-zero or could not be started.
pub async fn run_in_parallel(
    programs: Vec<ProgramSpec>,
    forward_args: bool,
    source: &dyn ChildArgSource,
) -> errors::Result<()> {
    Orchestrator::default()
        .run_in_parallel(programs, forward_args, source)
        .await
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - forwarded flags from config and CLI
/// - package-manager resolution for `script`/`bin` entries
/// - the orchestrator
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;

    let mut forwarded = cfg.forward.clone();
    forwarded.extend(parse_forward_args(&args.forward)?);
    let forward_enabled = cfg.config.forward_args && !args.no_forward;

    let project_dir = config_root_dir(&config_path).join(&cfg.config.project_dir);
    let pm = PackageManager::new(project_dir, &cfg.config.package_manager);
    let programs = resolve_programs(&cfg, &pm).await?;

    if args.dry_run {
        print_dry_run(&programs, forward_enabled, &forwarded);
        return Ok(());
    }

    info!(
        programs = programs.len(),
        forward_enabled,
        forwarded = forwarded.len(),
        "starting parallel run"
    );

    let source = StaticArgs::new(forwarded);
    run_in_parallel(programs, forward_enabled, &source).await?;
    Ok(())
}

/// Turn validated config entries into runnable specs, in config order.
pub async fn resolve_programs(cfg: &ConfigFile, pm: &PackageManager) -> errors::Result<Vec<ProgramSpec>> {
    let mut programs = Vec::with_capacity(cfg.programs.len());
    for entry in &cfg.programs {
        let spec = match &entry.kind {
            ProgramKind::Program(program) => ProgramSpec::new(program.clone())
                .args(entry.args.iter().cloned())
                .prefix(entry.prefix.clone()),
            ProgramKind::Script(script) => pm.script(script, &entry.args, &entry.prefix),
            ProgramKind::Bin(bin) => pm.bin(bin, &entry.args, &entry.prefix).await?,
        };
        programs.push(spec);
    }
    Ok(programs)
}

/// Figure out the directory relative paths in the config are based on.
///
/// - If the config path has a non-empty parent (e.g. "ci/Parrun.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Parrun.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print every program with its effective arguments.
fn print_dry_run(programs: &[ProgramSpec], forward_enabled: bool, forwarded: &[ChildArg]) {
    println!("parrun dry-run");
    println!("  forward_args = {forward_enabled}");
    if forward_enabled && !forwarded.is_empty() {
        let flags: Vec<String> = forwarded
            .iter()
            .map(|arg| match &arg.value {
                Some(value) => format!("{}={}", arg.flag, value),
                None => arg.flag.clone(),
            })
            .collect();
        println!("  forward = {flags:?}");
    }
    println!();

    println!("programs ({}):", programs.len());
    for spec in programs {
        let args = if forward_enabled {
            merge_child_args(&spec.args, forwarded)
        } else {
            spec.args.clone()
        };
        println!("  - {}", display_command(&spec.program, &args));
        if !spec.prefix.is_empty() {
            println!("      prefix: {:?}", spec.prefix);
        }
        if let Some(cwd) = &spec.cwd {
            println!("      cwd: {}", cwd.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
