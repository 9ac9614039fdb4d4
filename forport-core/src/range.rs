//! Port token expansion
//!
//! A port token is either a single port (`"8080"`) or an inclusive ascending
//! range (`"8000-8010"`). Expansion turns it into the ordered list of ports
//! the pairing planner works on.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::error::{Error, Result};

/// TCP port number
pub type Port = u16;

/// Separator between the endpoints of a range token
pub const RANGE_SEPARATOR: char = '-';

/// Non-empty, ascending sequence of ports expanded from a single token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRange {
    ports: Vec<Port>,
}

impl PortRange {
    /// Expand a `N` or `N-M` token
    ///
    /// Reversed ranges (`"10-5"`) are rejected rather than silently producing
    /// an empty or descending sequence.
    pub fn expand(token: &str) -> Result<Self> {
        let token = token.trim();

        if !token.contains(RANGE_SEPARATOR) {
            return Ok(Self {
                ports: vec![parse_port(token)?],
            });
        }

        let bounds: Vec<&str> = token.split(RANGE_SEPARATOR).collect();
        let &[start, end] = bounds.as_slice() else {
            return Err(Error::InvalidRangeFormat(format!(
                "'{}' must have exactly one '{}'",
                token, RANGE_SEPARATOR
            )));
        };

        let start = parse_bound(token, start)?;
        let end = parse_bound(token, end)?;

        if start > end {
            return Err(Error::InvalidRangeFormat(format!(
                "'{}' is reversed, start must not exceed end",
                token
            )));
        }

        Ok(Self {
            ports: (start..=end).collect(),
        })
    }

    /// Build a range from a single port
    pub fn single(port: Port) -> Self {
        Self { ports: vec![port] }
    }

    /// The expanded ports in ascending order
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Check if the range holds exactly one port
    pub fn is_single(&self) -> bool {
        self.ports.len() == 1
    }
}

impl Deref for PortRange {
    type Target = [Port];

    fn deref(&self) -> &Self::Target {
        &self.ports
    }
}

impl FromStr for PortRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::expand(s)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ports.first(), self.ports.last()) {
            (Some(first), Some(last)) if first != last => write!(f, "{}-{}", first, last),
            (Some(first), _) => write!(f, "{}", first),
            _ => Ok(()),
        }
    }
}

/// Parse one endpoint of a range token
fn parse_bound(token: &str, bound: &str) -> Result<Port> {
    let bound = bound.trim();
    if bound.is_empty() || !bound.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidRangeFormat(format!(
            "'{}' has a non-numeric endpoint '{}'",
            token, bound
        )));
    }
    parse_port(bound)
}

/// Parse a single port, rejecting 0 and anything above 65535
pub fn parse_port(token: &str) -> Result<Port> {
    let token = token.trim();
    match token.parse::<Port>() {
        Ok(0) => Err(Error::InvalidPortFormat(format!(
            "'{}' is outside 1-65535",
            token
        ))),
        Ok(port) if token.bytes().all(|b| b.is_ascii_digit()) => Ok(port),
        Ok(_) => Err(Error::InvalidPortFormat(format!(
            "'{}' is not a plain integer",
            token
        ))),
        Err(_) if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) => Err(
            Error::InvalidPortFormat(format!("'{}' is outside 1-65535", token)),
        ),
        Err(_) => Err(Error::InvalidPortFormat(format!(
            "'{}' is not an integer",
            token
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_expand_single_port() {
        let range = PortRange::expand("8080").unwrap();
        assert_eq!(range.ports(), &[8080]);
        assert!(range.is_single());
    }

    #[test]
    fn test_expand_range() {
        let range = PortRange::expand("8000-8003").unwrap();
        assert_eq!(range.ports(), &[8000, 8001, 8002, 8003]);
        assert_eq!(range.to_string(), "8000-8003");
    }

    #[test]
    fn test_expand_degenerate_range() {
        let range: PortRange = "22-22".parse().unwrap();
        assert_eq!(range.ports(), &[22]);
    }

    #[test]
    fn test_expand_trims_whitespace() {
        assert_eq!(PortRange::expand(" 80 ").unwrap().ports(), &[80]);
        assert_eq!(PortRange::expand("80 - 81").unwrap().ports(), &[80, 81]);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let err = PortRange::expand("10-5").unwrap_err();
        assert!(matches!(err, Error::InvalidRangeFormat(_)));
    }

    #[test]
    fn test_malformed_range_rejected() {
        for token in ["1-2-3", "-5", "5-", "a-b", "80-x"] {
            let err = PortRange::expand(token).unwrap_err();
            assert!(
                matches!(err, Error::InvalidRangeFormat(_)),
                "{} gave {:?}",
                token,
                err
            );
        }
    }

    #[test]
    fn test_invalid_single_port_rejected() {
        for token in ["", "http", "+80", "0", "65536", "80.5"] {
            let err = PortRange::expand(token).unwrap_err();
            assert!(
                matches!(err, Error::InvalidPortFormat(_)),
                "{} gave {:?}",
                token,
                err
            );
        }
    }

    #[test]
    fn test_out_of_bounds_range_endpoint() {
        let err = PortRange::expand("65530-70000").unwrap_err();
        assert!(matches!(err, Error::InvalidPortFormat(_)));
    }

    proptest! {
        #[test]
        fn prop_single_token_expands_to_itself(port in 1u16..=u16::MAX) {
            let range = PortRange::expand(&port.to_string()).unwrap();
            prop_assert_eq!(range.ports(), &[port]);
        }

        #[test]
        fn prop_range_is_full_ascending_run(start in 1u16..=u16::MAX, len in 0u16..512) {
            let end = start.saturating_add(len);
            let range = PortRange::expand(&format!("{}-{}", start, end)).unwrap();

            prop_assert_eq!(range.len(), usize::from(end - start) + 1);
            prop_assert_eq!(range.first().copied(), Some(start));
            prop_assert_eq!(range.last().copied(), Some(end));
            prop_assert!(range.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }
}
