//! Forwarding rules as reported by the native tools
//!
//! Neither `netsh portproxy` nor `iptables` exposes a stable rule ID. A rule
//! is identified by its 1-based position in the [`RuleSet`] returned from a
//! listing, and that index is only meaningful against the set it came from.
//! The OS table is shared with every other process on the host, so a set
//! goes stale as soon as anything else touches the table.

use std::fmt;

use crate::range::Port;

/// One active mapping known to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardingRule {
    /// Port the OS listens on
    pub listen_port: Port,
    /// Local port traffic is redirected to
    pub connect_port: Port,
}

impl ForwardingRule {
    pub fn new(listen_port: Port, connect_port: Port) -> Self {
        Self {
            listen_port,
            connect_port,
        }
    }
}

impl fmt::Display for ForwardingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.listen_port, self.connect_port)
    }
}

/// Snapshot of the rule table in native output order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ForwardingRule>,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule, keeping encounter order
    pub fn push(&mut self, rule: ForwardingRule) {
        self.rules.push(rule);
    }

    /// Resolve a 1-based index
    pub fn get(&self, index: usize) -> Option<&ForwardingRule> {
        index.checked_sub(1).and_then(|i| self.rules.get(i))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForwardingRule> {
        self.rules.iter()
    }

    /// Iterate as `(index, rule)` with 1-based indices
    pub fn enumerate(&self) -> impl Iterator<Item = (usize, &ForwardingRule)> {
        self.rules.iter().enumerate().map(|(i, rule)| (i + 1, rule))
    }
}

impl FromIterator<ForwardingRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = ForwardingRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a ForwardingRule;
    type IntoIter = std::slice::Iter<'a, ForwardingRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No port forwarding rules found.");
        }

        write!(f, "Port forwarding rules:")?;
        for (index, rule) in self.enumerate() {
            write!(f, "\n{}. {}", index, rule)?;
        }
        Ok(())
    }
}
