//! Platform rule backends
//!
//! A backend owns everything about one native tool: the command lines it
//! builds and the text it parses. The rest of the crate only sees the
//! [`RuleBackend`] capability set.
//!
//! # Platform Support
//!
//! - **Windows**: `netsh interface portproxy` (v4tov4 table)
//! - **Linux**: `iptables` NAT table, `PREROUTING` chain, `REDIRECT` target
//!
//! Both backends are compiled on every host so their parsers can be tested
//! anywhere; [`Platform::current`] picks the one to use at runtime.
//!
//! # Shared State
//!
//! The OS rule table is global and unsynchronized. Each backend call mutates
//! it directly, and nothing here guards against other processes editing it
//! between a listing and a removal.

use std::fmt;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::plan::PortPair;
use crate::rule::{ForwardingRule, RuleSet};
use crate::runner::CommandRunner;

pub mod linux;
pub mod windows;

pub use linux::{parse_prerouting_table, LinuxBackend};
pub use windows::{parse_portproxy_table, WindowsBackend};

/// Capability set every platform provides
pub trait RuleBackend {
    /// Create one forwarding rule from `pair.source` to loopback `pair.destination`
    fn add(&self, pair: PortPair) -> Result<()>;

    /// Fetch and parse the live rule table
    fn list(&self) -> Result<RuleSet>;

    /// Remove the rule at a 1-based position of a fresh listing
    fn remove_by_index(&self, index: usize) -> Result<Removed>;

    /// Remove every forwarding rule
    fn remove_all(&self) -> Result<Removal>;
}

impl<B: RuleBackend + ?Sized> RuleBackend for Box<B> {
    fn add(&self, pair: PortPair) -> Result<()> {
        (**self).add(pair)
    }

    fn list(&self) -> Result<RuleSet> {
        (**self).list()
    }

    fn remove_by_index(&self, index: usize) -> Result<Removed> {
        (**self).remove_by_index(index)
    }

    fn remove_all(&self) -> Result<Removal> {
        (**self).remove_all()
    }
}

/// Result of removing a single rule by index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    /// The 1-based index that was requested
    pub index: usize,
    /// The resolved rule, when the backend had to list to find it
    pub rule: Option<ForwardingRule>,
}

impl fmt::Display for Removed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Some(rule) => write!(f, "Successfully removed port forwarding rule: {}.", rule),
            None => write!(
                f,
                "Successfully removed port forwarding rule with index {}.",
                self.index
            ),
        }
    }
}

/// Outcome of deleting one rule during a remove-all
#[derive(Debug)]
pub struct RuleOutcome {
    pub rule: ForwardingRule,
    pub result: Result<()>,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(()) => write!(
                f,
                "Successfully removed port forwarding rule for port {}",
                self.rule.listen_port
            ),
            Err(e) => write!(
                f,
                "Failed to remove port forwarding rule for port {}: {}",
                self.rule.listen_port, e
            ),
        }
    }
}

/// Result of a remove-all
#[derive(Debug)]
pub enum Removal {
    /// One independent deletion per listed rule
    PerRule(Vec<RuleOutcome>),
    /// The whole chain was flushed in a single call
    Flushed,
}

impl Removal {
    /// Check if every deletion succeeded
    pub fn is_success(&self) -> bool {
        match self {
            Removal::PerRule(outcomes) => outcomes.iter().all(|o| o.result.is_ok()),
            Removal::Flushed => true,
        }
    }
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Removal::PerRule(outcomes) if outcomes.is_empty() => {
                write!(f, "No port forwarding rules found.")
            }
            Removal::PerRule(outcomes) => {
                for (i, outcome) in outcomes.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", outcome)?;
                }
                Ok(())
            }
            Removal::Flushed => write!(f, "Successfully removed all port forwarding rules."),
        }
    }
}

/// Host platforms with a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Detect the platform of the running host
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
        }
    }
}

/// Build the backend for `platform`
pub fn for_platform<R>(
    platform: Platform,
    runner: R,
    config: BackendConfig,
) -> Box<dyn RuleBackend>
where
    R: CommandRunner + 'static,
{
    match platform {
        Platform::Windows => Box::new(WindowsBackend::new(runner)),
        Platform::Linux => Box::new(LinuxBackend::new(runner, config)),
    }
}
