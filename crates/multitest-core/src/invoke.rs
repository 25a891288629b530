// crates/multitest-core/src/invoke.rs
// ============================================================================
// Module: External Tool Invocation
// Description: Command rendering and process execution for one combination.
// Purpose: Run the build/test tool restricted to exactly one feature subset.
// Dependencies: crate::features, thiserror
// ============================================================================

//! ## Overview
//! A [`ToolCommand`] describes the external collaborator (normally
//! `cargo test`). For each combination it renders
//! `<verb> --no-default-features --features a,b [extra...]`.
//! The [`Invoker`] trait is the seam between the runner and the operating
//! system; [`ProcessInvoker`] spawns a real process and captures stdout and
//! stderr through one pipe so the two streams stay interleaved.
//!
//! ## Invariants
//! - One process runs at a time; the invoker blocks until it exits.
//! - Captured output is decoded lossily and fully buffered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;

use thiserror::Error;

use crate::features::Combination;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Flag disabling the crate's default features.
const NO_DEFAULT_FEATURES_FLAG: &str = "--no-default-features";
/// Flag introducing the comma-joined feature list.
const FEATURES_FLAG: &str = "--features";
/// Base added to a signal number to form a shell-style exit code.
const SIGNAL_EXIT_BASE: i32 = 128;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Infrastructure errors raised while driving the external tool.
///
/// A failing combination is not an error; it is reported through
/// [`InvocationResult`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The tool process could not be started.
    #[error("failed to run `{program}`: {error}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error text.
        error: String,
    },
    /// The tool's output or exit status could not be collected.
    #[error("failed to capture tool output: {0}")]
    Capture(String),
    /// Progress or failure output could not be written.
    #[error("failed to report progress: {0}")]
    Report(String),
}

// ============================================================================
// SECTION: Tool Command
// ============================================================================

/// External build/test command run once per combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program to execute.
    program: String,
    /// Subcommand placed before the feature flags.
    verb: String,
    /// Arguments appended after the feature flags.
    extra_args: Vec<String>,
    /// Working directory for the process (repository root).
    working_dir: PathBuf,
}

impl ToolCommand {
    /// Creates a command with no extra arguments.
    pub fn new(
        program: impl Into<String>,
        verb: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            verb: verb.into(),
            extra_args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    /// Appends arguments placed after the feature flags.
    #[must_use]
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the verb (subcommand).
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Returns the working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Renders the argument vector for `combination`.
    #[must_use]
    pub fn args(&self, combination: &Combination) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + self.extra_args.len());
        args.push(self.verb.clone());
        args.push(NO_DEFAULT_FEATURES_FLAG.to_string());
        args.push(FEATURES_FLAG.to_string());
        args.push(combination.feature_flag());
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Renders the full command line for display.
    #[must_use]
    pub fn command_line(&self, combination: &Combination) -> String {
        let mut line = self.program.clone();
        for arg in self.args(combination) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

// ============================================================================
// SECTION: Invocation Results
// ============================================================================

/// How the tool process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatusKind {
    /// Exited with a status code.
    Code(i32),
    /// Terminated by a signal without a status code. Carries the signal
    /// number, or `0` when the platform does not report one.
    Signal(i32),
}

impl ExitStatusKind {
    /// Returns true for a zero exit code.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Code(0))
    }

    /// Returns the exit code to propagate; signals follow the shell's
    /// `128 + N` convention.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Code(code) => code,
            Self::Signal(signal) => SIGNAL_EXIT_BASE.saturating_add(signal),
        }
    }
}

impl From<ExitStatus> for ExitStatusKind {
    fn from(status: ExitStatus) -> Self {
        status.code().map_or_else(|| Self::Signal(signal_number(status)), Self::Code)
    }
}

/// Returns the signal that terminated the process.
#[cfg(unix)]
fn signal_number(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(0)
}

/// Returns the signal that terminated the process (never reported here).
#[cfg(not(unix))]
const fn signal_number(_status: ExitStatus) -> i32 {
    0
}

/// Exit status and combined output of one tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// How the process ended.
    pub status: ExitStatusKind,
    /// Interleaved stdout and stderr.
    pub output: String,
}

impl InvocationResult {
    /// Returns true when the combination passed.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.status.success()
    }
}

// ============================================================================
// SECTION: Invokers
// ============================================================================

/// Executes the external tool for one combination.
pub trait Invoker {
    /// Runs `tool` restricted to `combination` and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the tool cannot be run at all; a tool
    /// that runs and fails is reported through the returned result.
    fn invoke(
        &mut self,
        tool: &ToolCommand,
        combination: &Combination,
    ) -> Result<InvocationResult, RunnerError>;
}

/// Invoker backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    fn invoke(
        &mut self,
        tool: &ToolCommand,
        combination: &Combination,
    ) -> Result<InvocationResult, RunnerError> {
        let (mut reader, writer) =
            std::io::pipe().map_err(|err| RunnerError::Capture(err.to_string()))?;
        let stderr_writer =
            writer.try_clone().map_err(|err| RunnerError::Capture(err.to_string()))?;

        let mut command = Command::new(tool.program());
        command
            .args(tool.args(combination))
            .current_dir(tool.working_dir())
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);
        let mut child = command.spawn().map_err(|err| RunnerError::Spawn {
            program: tool.program().to_string(),
            error: err.to_string(),
        })?;
        // The command still owns the parent's write ends; the read below only
        // sees EOF once they are closed.
        drop(command);

        let mut bytes = Vec::new();
        let read = reader.read_to_end(&mut bytes);
        let status = child.wait().map_err(|err| RunnerError::Capture(err.to_string()))?;
        read.map_err(|err| RunnerError::Capture(err.to_string()))?;

        Ok(InvocationResult {
            status: ExitStatusKind::from(status),
            output: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
