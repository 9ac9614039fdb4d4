//! Source/destination pairing
//!
//! Planning is pure: it decides which `(source, destination)` pairs a
//! forward request turns into, and rejects impossible combinations before
//! any native command runs.

use std::fmt;

use crate::error::{Error, Result};
use crate::range::{Port, PortRange};

/// One forwarding request: listen on `source`, redirect to `destination`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    pub source: Port,
    pub destination: Port,
}

impl PortPair {
    pub fn new(source: Port, destination: Port) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl From<(Port, Port)> for PortPair {
    fn from((source, destination): (Port, Port)) -> Self {
        Self::new(source, destination)
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

/// How source and destination ports are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPolicy {
    /// Many sources, one destination
    FanIn,
    /// One source, many destinations
    FanOut,
    /// Equal lengths, paired by position
    Zip,
}

impl PairingPolicy {
    /// Pick the policy for the given range lengths
    ///
    /// Checked in priority order: fan-in, fan-out, zip. Returns `None` when
    /// the lengths cannot be paired.
    pub fn select(sources: usize, destinations: usize) -> Option<Self> {
        if sources > 1 && destinations == 1 {
            Some(PairingPolicy::FanIn)
        } else if sources == 1 && destinations > 1 {
            Some(PairingPolicy::FanOut)
        } else if sources == destinations && sources > 0 {
            Some(PairingPolicy::Zip)
        } else {
            None
        }
    }
}

/// Plan the forwarding pairs for a source and destination range
pub fn plan(sources: &PortRange, destinations: &PortRange) -> Result<Vec<PortPair>> {
    let policy = PairingPolicy::select(sources.len(), destinations.len()).ok_or(
        Error::InvalidRangeCombination {
            sources: sources.len(),
            destinations: destinations.len(),
        },
    )?;

    log::debug!(
        "Pairing {} with {} using {:?}",
        sources,
        destinations,
        policy
    );

    let pairs = match policy {
        PairingPolicy::FanIn => sources
            .iter()
            .map(|&source| PortPair::new(source, destinations[0]))
            .collect(),
        PairingPolicy::FanOut => destinations
            .iter()
            .map(|&destination| PortPair::new(sources[0], destination))
            .collect(),
        PairingPolicy::Zip => sources
            .iter()
            .zip(destinations.iter())
            .map(|(&source, &destination)| PortPair::new(source, destination))
            .collect(),
    };

    Ok(pairs)
}
