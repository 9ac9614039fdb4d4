//! Native command execution
//!
//! Backends describe what to run as a [`NativeCommand`] and hand it to a
//! [`CommandRunner`]. Production code uses [`SystemRunner`], which blocks on
//! `std::process::Command`. Tests use [`mock::MockRunner`] to script tool
//! output and record every invocation.

use std::fmt;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

pub mod mock;

/// A program and its argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl NativeCommand {
    /// Create a command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run this command through `wrapper`, e.g. `sudo`
    pub fn wrapped(self, wrapper: &str) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.to_string(),
            args,
        }
    }
}

impl fmt::Display for NativeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished native command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful run with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with the given exit code and stderr
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Check if the command exited with status 0
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`Error::NativeCommandFailed`]
    pub fn check(self, command: &NativeCommand) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let status = match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        let detail = if stderr.is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr)
        };

        Err(Error::NativeCommandFailed {
            command: command.to_string(),
            detail,
        })
    }
}

/// Capability to run a native command to completion
pub trait CommandRunner {
    /// Run `command`, blocking until it exits
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::code`]. An error means the process could not be
    /// started at all.
    fn run(&self, command: &NativeCommand) -> Result<CommandOutput>;
}

/// Runs commands on the host via `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &NativeCommand) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::NativeCommandFailed {
                command: command.to_string(),
                detail: format!("failed to run {}: {}", command.program, e),
            })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.stderr.trim().is_empty() {
            log::debug!("{} stderr: {}", command.program, output.stderr.trim());
        }

        Ok(output)
    }
}

/// Run `command` and require a zero exit status
pub(crate) fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    command: &NativeCommand,
) -> Result<CommandOutput> {
    log::info!("Running command: {}", command);
    runner.run(command)?.check(command)
}
