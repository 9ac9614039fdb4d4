//! Backend configuration

use std::net::Ipv4Addr;

/// Address the OS listens on for forwarded ports
pub const LISTEN_ADDRESS: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Address forwarded traffic is delivered to
pub const CONNECT_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// NAT chain that holds the redirect rules on Linux
pub const NAT_CHAIN: &str = "PREROUTING";

/// Program used to elevate Linux commands
pub const SUDO: &str = "sudo";

/// Settings shared by all platform backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Prefix Linux `iptables` invocations with `sudo`
    pub use_sudo: bool,
}

impl BackendConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the `sudo` prefix
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { use_sudo: true }
    }
}
