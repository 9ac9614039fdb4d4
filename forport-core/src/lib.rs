//! TCP port forwarding rules over native OS tools
//!
//! This crate models forwarding rules on top of the host's native NAT/proxy
//! facility and turns user requests like `8000-8010:9000` into individual
//! rule operations.
//!
//! # Components
//!
//! - **Range expansion** ([`range`]): `"80"` or `"8000-8010"` to ordered ports
//! - **Pairing** ([`plan`]): fan-in, fan-out or positional pairing of ports
//! - **Backends** ([`backend`]): add, list, remove by index, remove all
//! - **Dispatch** ([`dispatch`]): argument handling and human-readable reports
//!
//! # Platform Requirements
//!
//! ## Windows
//! - Administrator privileges for `netsh interface portproxy`
//!
//! ## Linux
//! - Root privileges for `iptables` (commands are run via `sudo` by default)
//!
//! # Example
//!
//! ```ignore
//! use forport_core::{backend, BackendConfig, Dispatcher, Platform, SystemRunner};
//!
//! let platform = Platform::current()?;
//! let backend = backend::for_platform(platform, SystemRunner, BackendConfig::default());
//! let report = Dispatcher::new(backend).run(&["8000-8002:9000"])?;
//! println!("{}", report);
//! ```

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod plan;
pub mod range;
pub mod rule;
pub mod runner;
pub mod suggest;

pub use backend::{Platform, Removal, Removed, RuleBackend};
pub use config::BackendConfig;
pub use dispatch::{Action, Dispatcher, Report};
pub use error::{Error, Result};
pub use plan::{PairingPolicy, PortPair};
pub use range::{Port, PortRange};
pub use rule::{ForwardingRule, RuleSet};
pub use runner::{CommandOutput, CommandRunner, NativeCommand, SystemRunner};
