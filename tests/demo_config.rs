// tests/demo_config.rs

use std::error::Error;
use std::path::PathBuf;

use parrun::config::{load_and_validate, ProgramKind};
use parrun::exec::ChildArg;

type TestResult = Result<(), Box<dyn Error>>;

/// Sanity-check that demos/Parrun.toml stays valid.
#[test]
fn demo_config_is_parsed_correctly() -> TestResult {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest_dir.join("demos/Parrun.toml"))?;

    assert!(cfg.config.forward_args);
    assert_eq!(cfg.forward, vec![ChildArg::flag("--verbose")]);
    assert_eq!(cfg.programs.len(), 2);

    assert_eq!(cfg.programs[0].kind, ProgramKind::Program("sh".to_string()));
    assert_eq!(cfg.programs[0].prefix, "[fast] ");
    assert_eq!(cfg.programs[1].prefix, "[slow] ");
    assert_eq!(cfg.programs[1].args.last().map(String::as_str), Some("slow"));

    Ok(())
}
