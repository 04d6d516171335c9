//! Shell-free execution of the tunnel tooling.
//!
//! [`SafeCommand`] only runs programs named by [`AllowedProgram`], passes the
//! argument vector straight to `execve` and checks every argument on the way
//! in. Key material goes through [`SafeCommand::stdin`], which keeps it out of
//! the argument vector, the process table and [`SafeCommand::describe`].
//!
//! ```rust,no_run
//! # #[cfg(feature = "command")]
//! # async fn example() -> Result<(), kvm_validation::command::CommandError> {
//! use kvm_validation::command::{AllowedProgram, SafeCommand};
//!
//! let output = SafeCommand::new(AllowedProgram::Wg)
//!     .args(["show", "wg0", "dump"])
//!     .execute()
//!     .await?;
//! print!("{}", output.stdout_lossy());
//! # Ok(())
//! # }
//! ```

use std::fmt;

use thiserror::Error;

use crate::error::ValidationError;

#[cfg(feature = "command")]
use std::process::Stdio;
#[cfg(feature = "command")]
use tokio::io::AsyncWriteExt;
#[cfg(feature = "command")]
use tokio::process::Command;

/// The only programs [`SafeCommand`] will start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AllowedProgram {
    /// `wg`, the tunnel control tool.
    Wg,
    /// `wg-quick`, the interface launcher.
    WgQuick,
    /// `ip`, for link and address queries.
    Ip,
}

impl AllowedProgram {
    /// Name looked up on `PATH` when no explicit path is configured.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wg => "wg",
            Self::WgQuick => "wg-quick",
            Self::Ip => "ip",
        }
    }
}

impl fmt::Display for AllowedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to run a [`SafeCommand`].
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was rejected before anything was spawned.
    #[error("argument validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// The program ran and exited unsuccessfully.
    #[error("command '{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        /// Program and arguments, never stdin.
        command: String,
        /// Exit code, or -1 when killed by a signal.
        exit_code: i32,
        /// Trimmed standard error.
        stderr: String,
    },

    /// Spawning, feeding stdin or collecting output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Whether the command was rejected before spawning.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }
}

/// Characters that end or split an argument when it is logged or reparsed.
const FORBIDDEN_CHARS: &[char] = &['\0', '\n', '\r'];

/// Checks one argument.
///
/// # Errors
///
/// Returns `ForbiddenChar` for NUL, LF or CR.
pub fn validate_argument(arg: &str, field: &'static str) -> Result<(), ValidationError> {
    match arg.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        Some(found) => Err(ValidationError::ForbiddenChar { field, found }),
        None => Ok(()),
    }
}

/// Checks a configured program path.
///
/// # Errors
///
/// Returns an error for an empty path, a `..` component or a shell
/// metacharacter.
pub fn validate_program_path(path: &str) -> Result<(), ValidationError> {
    const FIELD: &str = "program_path";

    if path.is_empty() {
        return Err(ValidationError::Empty { field: FIELD });
    }

    if path.contains("..") {
        return Err(ValidationError::PathTraversal {
            field: FIELD,
            value: "..".to_string(),
        });
    }

    let metachar = |c: &char| FORBIDDEN_CHARS.contains(c) || matches!(*c, ';' | '&' | '|' | '$' | '`');
    match path.chars().find(metachar) {
        Some(found) => Err(ValidationError::ForbiddenChar { field: FIELD, found }),
        None => Ok(()),
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Raw standard output.
    pub stdout: Vec<u8>,
    /// Raw standard error.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Standard output, with invalid UTF-8 replaced.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error, with invalid UTF-8 replaced.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Builder for one invocation of an [`AllowedProgram`].
///
/// The first rejected input is remembered and reported by
/// [`execute`](Self::execute); later inputs are ignored once one is rejected.
#[derive(Debug)]
pub struct SafeCommand {
    program: AllowedProgram,
    program_path: Option<String>,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
    rejected: Option<ValidationError>,
}

impl SafeCommand {
    /// Starts a command for `program`.
    #[must_use]
    pub fn new(program: AllowedProgram) -> Self {
        Self {
            program,
            program_path: None,
            args: Vec::new(),
            stdin: None,
            rejected: None,
        }
    }

    fn check(mut self, result: Result<(), ValidationError>, accept: impl FnOnce(&mut Self)) -> Self {
        if self.rejected.is_none() {
            match result {
                Ok(()) => accept(&mut self),
                Err(e) => self.rejected = Some(e),
            }
        }
        self
    }

    /// Runs `path` instead of looking the program up on `PATH`.
    #[must_use]
    pub fn with_program_path(self, path: &str) -> Self {
        self.check(validate_program_path(path), |cmd| {
            cmd.program_path = Some(path.to_string());
        })
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(self, arg: &str) -> Self {
        self.check(validate_argument(arg, "argument"), |cmd| cmd.args.push(arg.to_string()))
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg.as_ref()))
    }

    /// Writes `data` to the child's stdin, then closes it.
    #[must_use]
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// The first rejected input, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&ValidationError> {
        self.rejected.as_ref()
    }

    fn program(&self) -> &str {
        self.program_path.as_deref().unwrap_or(self.program.as_str())
    }

    /// Program and arguments for logs and errors. Stdin is never included.
    #[must_use]
    pub fn describe(&self) -> String {
        std::iter::once(self.program())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawns the program and waits for it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if an input was rejected, `Io` if the
    /// program cannot be spawned or fed, and `NonZeroExit` if it fails.
    #[cfg(feature = "command")]
    pub async fn execute(mut self) -> Result<CommandOutput, CommandError> {
        if let Some(rejected) = self.rejected.take() {
            return Err(CommandError::ValidationFailed(rejected));
        }

        let description = self.describe();
        let mut child = Command::new(self.program())
            .args(&self.args)
            .stdin(if self.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        tracing::trace!(command = %description, stdin = self.stdin.is_some(), "spawned");

        if let (Some(input), Some(mut pipe)) = (self.stdin.take(), child.stdin.take()) {
            let fed = match pipe.write_all(&input).await {
                Ok(()) => pipe.shutdown().await,
                Err(e) => Err(e),
            };
            ignore_broken_pipe(fed)?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: description,
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// A child that exits before reading all of its stdin closes the pipe; its
/// exit status says more than the write error does.
#[cfg(feature = "command")]
fn ignore_broken_pipe(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            tracing::trace!("child closed stdin early");
            Ok(())
        }
        other => other,
    }
}
