#![allow(dead_code)]

use parrun::config::{ConfigFile, ConfigSection, ProgramConfig, RawConfigFile};
use parrun::types::ProgramSpec;

/// `/bin/sh -c <script>` with the given prefix.
pub fn sh(prefix: &str, script: &str) -> ProgramSpec {
    ProgramSpec::new("/bin/sh")
        .args(["-c", script])
        .prefix(prefix)
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                programs: Vec::new(),
            },
        }
    }

    pub fn with_program(mut self, program: ProgramConfig) -> Self {
        self.config.programs.push(program);
        self
    }

    pub fn with_forward(mut self, flag: &str) -> Self {
        self.config.config.forward.push(flag.to_string());
        self
    }

    pub fn forward_args(mut self, val: bool) -> Self {
        self.config.config.forward_args = val;
        self
    }

    pub fn package_manager(mut self, executable: &str) -> Self {
        self.config.config.package_manager = executable.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ProgramConfig`.
pub struct ProgramConfigBuilder {
    program: ProgramConfig,
}

impl ProgramConfigBuilder {
    pub fn program(name: &str) -> Self {
        Self {
            program: ProgramConfig {
                program: Some(name.to_string()),
                ..ProgramConfig::default()
            },
        }
    }

    pub fn script(name: &str) -> Self {
        Self {
            program: ProgramConfig {
                script: Some(name.to_string()),
                ..ProgramConfig::default()
            },
        }
    }

    pub fn bin(name: &str) -> Self {
        Self {
            program: ProgramConfig {
                bin: Some(name.to_string()),
                ..ProgramConfig::default()
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.program.args.push(arg.to_string());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.program.prefix = Some(prefix.to_string());
        self
    }

    /// Also set `script`, producing an invalid entry when combined with
    /// `program` or `bin`.
    pub fn also_script(mut self, name: &str) -> Self {
        self.program.script = Some(name.to_string());
        self
    }

    pub fn build(self) -> ProgramConfig {
        self.program
    }
}
