//! Scripted command runner for tests
//!
//! [`MockRunner`] never touches the host. Every command it receives is
//! recorded, and its output is chosen from scripted responses matched against
//! the rendered command line.
//!
//! # Example
//!
//! ```
//! use forport_core::runner::mock::MockRunner;
//! use forport_core::runner::{CommandOutput, CommandRunner, NativeCommand};
//!
//! let runner = MockRunner::new();
//! runner.respond("show all", CommandOutput::success("no rules"));
//!
//! let cmd = NativeCommand::new("netsh").args(["interface", "portproxy", "show", "all"]);
//! assert_eq!(runner.run(&cmd).unwrap().stdout, "no rules");
//! assert_eq!(runner.calls(), vec![cmd.to_string()]);
//! ```

use std::sync::{Arc, Mutex};

use super::{CommandOutput, CommandRunner, NativeCommand};
use crate::error::Result;

#[derive(Debug)]
struct Response {
    pattern: String,
    output: CommandOutput,
    once: bool,
}

#[derive(Debug, Default)]
struct MockState {
    responses: Vec<Response>,
    calls: Vec<NativeCommand>,
}

/// Recording runner with scripted output
///
/// Clones share state, so a test can keep one handle and move another into
/// a backend.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds with empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command whose line contains `pattern` with `output`
    ///
    /// Responses are matched in registration order.
    pub fn respond(&self, pattern: impl Into<String>, output: CommandOutput) -> &Self {
        self.push(pattern.into(), output, false)
    }

    /// Like [`respond`](Self::respond), but only for the next matching command
    pub fn respond_once(&self, pattern: impl Into<String>, output: CommandOutput) -> &Self {
        self.push(pattern.into(), output, true)
    }

    /// Fail every command whose line contains `pattern` with exit code 1
    pub fn fail_on(&self, pattern: impl Into<String>) -> &Self {
        self.respond(pattern, CommandOutput::failure(1, "mock failure"))
    }

    fn push(&self, pattern: String, output: CommandOutput, once: bool) -> &Self {
        self.lock().responses.push(Response {
            pattern,
            output,
            once,
        });
        self
    }

    /// Rendered command lines received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().map(ToString::to_string).collect()
    }

    /// Commands received so far, in order
    pub fn commands(&self) -> Vec<NativeCommand> {
        self.lock().calls.clone()
    }

    /// Number of received commands whose line contains `pattern`
    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread may poison the lock; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &NativeCommand) -> Result<CommandOutput> {
        let line = command.to_string();
        let mut state = self.lock();
        state.calls.push(command.clone());

        let matched = state
            .responses
            .iter()
            .position(|r| line.contains(&r.pattern));

        let output = match matched {
            Some(i) if state.responses[i].once => state.responses.remove(i).output,
            Some(i) => state.responses[i].output.clone(),
            None => CommandOutput::success(""),
        };

        Ok(output)
    }
}
