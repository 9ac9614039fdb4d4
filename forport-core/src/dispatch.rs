//! Command dispatch
//!
//! Turns the positional command-line arguments into an [`Action`], runs it
//! against a [`RuleBackend`] and returns a [`Report`] describing every native
//! operation that was attempted.
//!
//! Validation (ports, ranges, pairing, index shape) always completes before
//! the first native command runs. Once execution starts, a failed forward in
//! a multi-pair request is recorded and the remaining pairs still run.

use std::fmt;

use crate::backend::{Removal, Removed, RuleBackend};
use crate::error::{Error, Result};
use crate::plan::{plan, PortPair};
use crate::range::PortRange;
use crate::rule::RuleSet;
use crate::suggest::{suggest, VALID_ACTIONS};

/// Separator between source and destination in a forward token
pub const FORWARD_SEPARATOR: char = ':';

/// A validated top-level operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create forwarding rules from `sources` to `destinations`
    Forward {
        sources: PortRange,
        destinations: PortRange,
    },
    /// Print the live rule table
    List,
    /// Remove the rule at a 1-based index
    Remove(usize),
    /// Remove every rule
    RemoveAll,
    /// Unrecognized action token
    Unknown(String),
}

impl Action {
    /// Parse positional arguments (without the program name)
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let Some(first) = args.first() else {
            return Err(Error::Usage("missing action".to_string()));
        };
        let action = first.as_ref().trim().to_lowercase();

        if action.contains(FORWARD_SEPARATOR) {
            return Self::parse_forward(&action);
        }

        match action.as_str() {
            "list" => Ok(Action::List),
            "remove" | "delete" => match &args[1..] {
                [target] => Self::parse_remove_target(target.as_ref()),
                _ => Err(Error::Usage(format!(
                    "'{}' takes exactly one argument: <id> or all",
                    action
                ))),
            },
            _ => Ok(Action::Unknown(action)),
        }
    }

    fn parse_forward(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split(FORWARD_SEPARATOR).collect();
        let &[source, destination] = parts.as_slice() else {
            return Err(Error::Usage(format!(
                "invalid format '{}', expected <source_port>:<destination_port>",
                token
            )));
        };

        Ok(Action::Forward {
            sources: PortRange::expand(source)?,
            destinations: PortRange::expand(destination)?,
        })
    }

    fn parse_remove_target(target: &str) -> Result<Self> {
        let target = target.trim();
        if target.eq_ignore_ascii_case("all") {
            return Ok(Action::RemoveAll);
        }

        match target.parse::<usize>() {
            Ok(index) if index > 0 && target.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(Action::Remove(index))
            }
            _ => Err(Error::InvalidIndex(format!(
                "'{}' is not a positive rule number",
                target
            ))),
        }
    }
}

/// Result of forwarding one planned pair
#[derive(Debug)]
pub struct PairOutcome {
    pub pair: PortPair,
    pub result: Result<()>,
}

impl fmt::Display for PairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let PortPair {
            source,
            destination,
        } = self.pair;
        match &self.result {
            Ok(()) => write!(
                f,
                "Port forwarding from {} to {} successfully created.",
                source, destination
            ),
            Err(e) => write!(
                f,
                "Failed to create port forwarding from {} to {}: {}",
                source, destination, e
            ),
        }
    }
}

/// Human-readable outcome of a dispatched action
#[derive(Debug)]
pub enum Report {
    Forwarded(Vec<PairOutcome>),
    Listed(RuleSet),
    Removed(Removed),
    RemovedAll(Removal),
    Suggestion {
        input: String,
        suggestion: Option<&'static str>,
    },
}

impl Report {
    /// Check if every native operation succeeded and the action was known
    pub fn is_success(&self) -> bool {
        match self {
            Report::Forwarded(outcomes) => outcomes.iter().all(|o| o.result.is_ok()),
            Report::Listed(_) | Report::Removed(_) => true,
            Report::RemovedAll(removal) => removal.is_success(),
            Report::Suggestion { .. } => false,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Forwarded(outcomes) => {
                for (i, outcome) in outcomes.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", outcome)?;
                }
                Ok(())
            }
            Report::Listed(rules) => write!(f, "{}", rules),
            Report::Removed(removed) => write!(f, "{}", removed),
            Report::RemovedAll(removal) => write!(f, "{}", removal),
            Report::Suggestion {
                suggestion: Some(s),
                ..
            } => write!(f, "Did you mean '{}'?", s),
            Report::Suggestion { input, .. } => write!(
                f,
                "Unknown action '{}'. Available actions are: {}",
                input,
                VALID_ACTIONS.join(", ")
            ),
        }
    }
}

/// Runs actions against a platform backend
pub struct Dispatcher<B> {
    backend: B,
}

impl<B: RuleBackend> Dispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Parse and execute positional arguments
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<Report> {
        let action = Action::parse(args)?;
        self.execute(&action)
    }

    /// Execute a parsed action
    ///
    /// Errors are fail-fast problems or the failure of a single-call
    /// operation. Per-pair and per-rule failures of multi-call operations
    /// are carried inside the [`Report`].
    pub fn execute(&self, action: &Action) -> Result<Report> {
        match action {
            Action::Forward {
                sources,
                destinations,
            } => {
                let pairs = plan(sources, destinations)?;
                Ok(Report::Forwarded(self.forward(&pairs)))
            }
            Action::List => Ok(Report::Listed(self.backend.list()?)),
            Action::Remove(index) => Ok(Report::Removed(self.backend.remove_by_index(*index)?)),
            Action::RemoveAll => Ok(Report::RemovedAll(self.backend.remove_all()?)),
            Action::Unknown(input) => Ok(Report::Suggestion {
                input: input.clone(),
                suggestion: suggest(input),
            }),
        }
    }

    fn forward(&self, pairs: &[PortPair]) -> Vec<PairOutcome> {
        pairs
            .iter()
            .map(|&pair| {
                let result = self.backend.add(pair);
                match &result {
                    Ok(()) => log::debug!("Forwarded {}", pair),
                    Err(e) => log::warn!("Forwarding {} failed: {}", pair, e),
                }
                PairOutcome { pair, result }
            })
            .collect()
    }
}
