//! External process seam.
//!
//! Every call this crate makes to `wg`, `wg-quick` or `ip` goes through
//! [`ProcessRunner`], so control logic can be exercised with
//! [`FakeProcessRunner`] instead of a real host.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use kvm_validation::{AllowedProgram, CommandError, SafeCommand};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, WireGuardError};
use crate::settings::WireGuardSettings;

/// One program invocation: an allow-listed program, its argument vector and
/// optional data for standard input.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    program: AllowedProgram,
    args: Vec<String>,
    stdin: Option<String>,
}

impl Invocation {
    /// Creates an invocation without stdin.
    pub fn new<I, S>(program: AllowedProgram, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program,
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    /// Attaches data for the child's standard input.
    #[must_use]
    pub fn with_stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> AllowedProgram {
        self.program
    }

    /// The argument vector.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Data for standard input, if any.
    #[must_use]
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Program name and arguments joined by spaces. Never includes stdin.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|s| format!("[{} bytes]", s.len())))
            .finish()
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Output with the given stdout and empty stderr.
    #[must_use]
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            stderr: String::new(),
        }
    }
}

/// Runs external programs.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    /// Runs the invocation to completion.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::ProcessFailed`] if the program cannot be
    /// spawned or exits non-zero. No retries are attempted.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs programs on the host through [`SafeCommand`], never via a shell.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    wg_path: String,
    wg_quick_path: String,
    ip_path: String,
}

impl SystemRunner {
    /// Creates a runner using the program paths from `settings`.
    #[must_use]
    pub fn new(settings: &WireGuardSettings) -> Self {
        Self {
            wg_path: settings.wg_path.clone(),
            wg_quick_path: settings.wg_quick_path.clone(),
            ip_path: settings.ip_path.clone(),
        }
    }

    fn program_path(&self, program: AllowedProgram) -> &str {
        match program {
            AllowedProgram::Wg => &self.wg_path,
            AllowedProgram::WgQuick => &self.wg_quick_path,
            _ => &self.ip_path,
        }
    }
}

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let command_line = invocation.command_line();
        let mut command = SafeCommand::new(invocation.program())
            .with_program_path(self.program_path(invocation.program()))
            .args(invocation.args());
        if let Some(input) = invocation.stdin() {
            command = command.stdin(input);
        }

        let output = command.execute().await.map_err(|e| {
            let message = match e {
                CommandError::NonZeroExit {
                    exit_code, stderr, ..
                } => format!("exit code {exit_code}: {stderr}"),
                other => other.to_string(),
            };
            WireGuardError::process_failed(&command_line, message)
        })?;

        debug!(command = %command_line, "process completed");
        Ok(ProcessOutput {
            stdout: output.stdout_lossy(),
            stderr: output.stderr_lossy(),
        })
    }
}

/// A call seen by [`FakeProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Command line of the call.
    pub command: String,
    /// Stdin passed to the call.
    pub stdin: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    responses: HashMap<String, std::result::Result<ProcessOutput, String>>,
    prefix_responses: Vec<(String, ProcessOutput)>,
    calls: Vec<RecordedCall>,
}

/// A scripted process runner for testing.
///
/// Responses are keyed by [`Invocation::command_line`]. A command with no
/// scripted response fails with `ProcessFailed`, which is also how a probe
/// for a missing interface behaves on a real host. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessRunner {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcessRunner {
    /// Creates a runner with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response with the given stdout.
    pub fn respond(&self, command_line: &str, stdout: &str) {
        self.state
            .lock()
            .responses
            .insert(command_line.to_string(), Ok(ProcessOutput::stdout(stdout)));
    }

    /// Scripts a failure with the given message.
    pub fn fail(&self, command_line: &str, message: &str) {
        self.state
            .lock()
            .responses
            .insert(command_line.to_string(), Err(message.to_string()));
    }

    /// Scripts a successful response for any command line starting with
    /// `prefix`. Exact responses take precedence.
    pub fn respond_prefix(&self, prefix: &str, stdout: &str) {
        self.state
            .lock()
            .prefix_responses
            .push((prefix.to_string(), ProcessOutput::stdout(stdout)));
    }

    /// Drops a scripted response so the command fails again.
    pub fn forget(&self, command_line: &str) {
        self.state.lock().responses.remove(command_line);
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Command lines of every call made so far, in order.
    #[must_use]
    pub fn command_lines(&self) -> Vec<String> {
        self.state.lock().calls.iter().map(|c| c.command.clone()).collect()
    }
}

impl ProcessRunner for FakeProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let command = invocation.command_line();
        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            command: command.clone(),
            stdin: invocation.stdin().map(str::to_string),
        });

        match state.responses.get(&command) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(WireGuardError::process_failed(command, message.clone())),
            None => state
                .prefix_responses
                .iter()
                .find(|(prefix, _)| command.starts_with(prefix.as_str()))
                .map(|(_, output)| output.clone())
                .ok_or_else(|| WireGuardError::process_failed(command, "no scripted response")),
        }
    }
}
