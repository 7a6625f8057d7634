use std::path::{Path, PathBuf};

/// One program to run in parallel with others.
///
/// `prefix` is prepended to every chunk of output the program produces; it
/// defaults to the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSpec {
    pub program: String,
    pub args: Vec<String>,
    pub prefix: String,
    /// Working directory for the child. `None` inherits ours.
    pub cwd: Option<PathBuf>,
}

impl ProgramSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            prefix: String::new(),
            cwd: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Name used in diagnostics and errors: the basename for absolute
    /// program paths, otherwise the program string as given.
    pub fn display_name(&self) -> String {
        display_name(&self.program)
    }
}

/// Which of the parent's console streams a chunk belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

pub fn display_name(program: &str) -> String {
    let path = Path::new(program);
    if path.is_absolute() {
        if let Some(base) = path.file_name() {
            return base.to_string_lossy().into_owned();
        }
    }
    program.to_string()
}

/// `program arg1 arg2`, with no trailing space when there are no args.
pub fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
