//! Error types for forport-core

use thiserror::Error;

/// Result type alias for forwarding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning or applying forwarding rules
#[derive(Debug, Error)]
pub enum Error {
    /// A port token is not an integer in 1..=65535
    #[error("invalid port: {0}")]
    InvalidPortFormat(String),

    /// A range token is not of the form `N-M` with N <= M
    #[error("invalid port range: {0}")]
    InvalidRangeFormat(String),

    /// Source and destination ranges cannot be paired
    #[error(
        "invalid range combination: {sources} source port(s) and {destinations} destination port(s); \
         ranges must have the same number of ports or one side must be a single port"
    )]
    InvalidRangeCombination { sources: usize, destinations: usize },

    /// Host operating system has no backend
    #[error("unsupported OS: {0}")]
    UnsupportedPlatform(String),

    /// Rule index does not resolve to a listed rule
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// Native tool could not be started or exited non-zero
    #[error("`{command}` failed: {detail}")]
    NativeCommandFailed { command: String, detail: String },

    /// Missing or malformed command-line arguments
    #[error("{0}\nusage: forport <source_port>:<destination_port> | list | delete <id> | delete all")]
    Usage(String),
}

impl Error {
    /// Check if the error was raised before any native command ran
    pub fn is_fail_fast(&self) -> bool {
        !self.is_native_failure()
    }

    /// Check if the error came from a native tool invocation
    pub fn is_native_failure(&self) -> bool {
        matches!(self, Error::NativeCommandFailed { .. })
    }
}
