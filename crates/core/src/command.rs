//! External tool invocation.
//!
//! Every FSL/ANTs wrapper builds a [`ToolCommand`] and runs it through a [`RunContext`]. The
//! context carries the per-run [`LogFile`] and the [`Toolchain`] used to resolve executables, so
//! tests can point the pipelines at stand-in tools without touching `PATH`.

use crate::log::LogFile;
use crate::{SegError, SegResult};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Ordered list of directories searched for executables.
#[derive(Clone, Debug, Default)]
pub struct Toolchain {
    search_path: Vec<PathBuf>,
}

impl Toolchain {
    /// Builds a toolchain from the `PATH` variable of the current process.
    pub fn from_env() -> Self {
        let path = std::env::var_os("PATH").unwrap_or_else(OsString::new);
        Self {
            search_path: std::env::split_paths(&path).collect(),
        }
    }

    /// Builds a toolchain from an explicit search path.
    pub fn with_search_path<I>(dirs: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            search_path: dirs.into_iter().collect(),
        }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Returns the first executable named `program` on the search path.
    ///
    /// A name containing a path separator is checked as-is.
    pub fn resolve(&self, program: &str) -> Option<PathBuf> {
        let direct = Path::new(program);
        if direct.components().count() > 1 {
            return is_executable(direct).then(|| direct.to_path_buf());
        }

        self.search_path
            .iter()
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }

    /// Returns the first candidate that resolves, in the order given.
    pub fn first_available<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates
            .iter()
            .copied()
            .find(|name| self.resolve(name).is_some())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Handle passed to every wrapper and pipeline.
#[derive(Debug)]
pub struct RunContext {
    log: LogFile,
    toolchain: Toolchain,
}

impl RunContext {
    pub fn new(log: LogFile, toolchain: Toolchain) -> Self {
        Self { log, toolchain }
    }

    pub fn log(&self) -> &LogFile {
        &self.log
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }
}

/// One external program invocation: the program name and its ordered arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends `arg` only when `condition` holds.
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition {
            self.arg(arg)
        } else {
            self
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Resolves the program, failing with `SegError::Dependency` if it is not installed.
    pub fn check_dependency(&self, ctx: &RunContext) -> SegResult<PathBuf> {
        ctx.toolchain()
            .resolve(&self.program)
            .ok_or_else(|| SegError::Dependency(self.program.clone()))
    }

    /// Non-raising variant of [`Self::check_dependency`].
    pub fn probe(&self, ctx: &RunContext) -> bool {
        ctx.toolchain().resolve(&self.program).is_some()
    }

    /// Runs the command to completion.
    ///
    /// The command line is written to the run log, and the tool's stdout and stderr go straight
    /// into it while the tool runs. A non-zero exit status is returned as
    /// `SegError::SubprocessFailed`; the tool's output is already in the log by then.
    pub fn run(&self, ctx: &RunContext) -> SegResult<()> {
        let executable = self.check_dependency(ctx)?;
        let line = self.to_string();

        tracing::info!("running {}", self.program);
        tracing::debug!("{}", line);
        ctx.log().log(&line)?;

        let status = Command::new(&executable)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(ctx.log().stdio()?)
            .stderr(ctx.log().stdio()?)
            .status()
            .map_err(|source| SegError::Spawn {
                command: line.clone(),
                source,
            })?;

        if !status.success() {
            let status = status.to_string();
            tracing::warn!("{} failed: {}", self.program, status);
            ctx.log().log(&format!("{} failed: {}", self.program, status))?;
            return Err(SegError::SubprocessFailed {
                command: line,
                status,
            });
        }

        Ok(())
    }
}

/// Renders a path as a command-line argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn needs_quoting(arg: &str) -> bool {
    arg.is_empty()
        || !arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=,:+@%".contains(c))
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if needs_quoting(arg) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
