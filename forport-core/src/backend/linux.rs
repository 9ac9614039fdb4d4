//! Linux backend over the `iptables` NAT table
//!
//! Rules are `REDIRECT` targets in the `PREROUTING` chain. A listing with
//! `-n --line-numbers` prints lines like:
//!
//! ```text
//! Chain PREROUTING (policy ACCEPT)
//! num  target     prot opt source               destination
//! 1    REDIRECT   tcp  --  0.0.0.0/0            0.0.0.0/0            tcp dpt:8080 redir ports 80
//! ```
//!
//! The listen port follows `dpt:` and the connect port is the last token.
//! Deletion is positional in `iptables` itself, so indices are passed through
//! without listing first. The native position counts every rule in the
//! chain, including ones that are not redirects.

use crate::config::{BackendConfig, NAT_CHAIN, SUDO};
use crate::error::{Error, Result};
use crate::plan::PortPair;
use crate::range::Port;
use crate::rule::{ForwardingRule, RuleSet};
use crate::runner::{run_checked, CommandRunner, NativeCommand};

use super::{Removal, Removed, RuleBackend};

const REDIRECT_TARGET: &str = "REDIRECT";
const DPT_MARKER: &str = "dpt:";

/// iptables NAT backend
pub struct LinuxBackend<R> {
    runner: R,
    config: BackendConfig,
}

impl<R: CommandRunner> LinuxBackend<R> {
    pub fn new(runner: R, config: BackendConfig) -> Self {
        Self { runner, config }
    }

    /// `iptables -t nat <args>`, elevated if configured
    fn nat<I, S>(&self, args: I) -> NativeCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = NativeCommand::new("iptables").args(["-t", "nat"]).args(args);
        if self.config.use_sudo {
            command.wrapped(SUDO)
        } else {
            command
        }
    }
}

impl<R: CommandRunner> RuleBackend for LinuxBackend<R> {
    fn add(&self, pair: PortPair) -> Result<()> {
        let command = self.nat([
            "-A".to_string(),
            NAT_CHAIN.to_string(),
            "-p".to_string(),
            "tcp".to_string(),
            "--dport".to_string(),
            pair.source.to_string(),
            "-j".to_string(),
            REDIRECT_TARGET.to_string(),
            "--to-port".to_string(),
            pair.destination.to_string(),
        ]);
        run_checked(&self.runner, &command)?;
        Ok(())
    }

    fn list(&self) -> Result<RuleSet> {
        let command = self.nat(["-L", NAT_CHAIN, "-n", "--line-numbers"]);
        let output = run_checked(&self.runner, &command)?;
        Ok(parse_prerouting_table(&output.stdout))
    }

    fn remove_by_index(&self, index: usize) -> Result<Removed> {
        if index == 0 {
            return Err(Error::InvalidIndex(
                "0 (rule numbers start at 1)".to_string(),
            ));
        }

        let command = self.nat(["-D".to_string(), NAT_CHAIN.to_string(), index.to_string()]);
        run_checked(&self.runner, &command)?;
        Ok(Removed { index, rule: None })
    }

    fn remove_all(&self) -> Result<Removal> {
        let command = self.nat(["-F", NAT_CHAIN]);
        run_checked(&self.runner, &command)?;
        Ok(Removal::Flushed)
    }
}

/// Parse `iptables -t nat -L PREROUTING` output
///
/// Only lines mentioning the `REDIRECT` target are considered, and of those
/// only the ones with both a `dpt:` port and a numeric last token. Order is
/// preserved.
pub fn parse_prerouting_table(output: &str) -> RuleSet {
    output
        .lines()
        .filter(|line| line.contains(REDIRECT_TARGET))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();

            let listen_port = parts
                .iter()
                .rev()
                .find_map(|part| part.split_once(DPT_MARKER).map(|(_, port)| port))
                .and_then(parse_port)?;
            let connect_port = parts.last().copied().and_then(parse_port)?;

            Some(ForwardingRule::new(listen_port, connect_port))
        })
        .collect()
}

fn parse_port(token: &str) -> Option<Port> {
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;
    use crate::runner::CommandOutput;

    const PREROUTING: &str = "\
Chain PREROUTING (policy ACCEPT)
num  target     prot opt source               destination
1    DOCKER     all  --  0.0.0.0/0            0.0.0.0/0            ADDRTYPE match dst-type LOCAL
2    REDIRECT   tcp  --  0.0.0.0/0            0.0.0.0/0            tcp dpt:8080 redir ports 80
3    REDIRECT   tcp  --  0.0.0.0/0            0.0.0.0/0            tcp dpt:2222 redir ports 22
";

    fn backend(runner: &MockRunner) -> LinuxBackend<MockRunner> {
        LinuxBackend::new(runner.clone(), BackendConfig::default())
    }

    #[test]
    fn test_parse_table() {
        let rules = parse_prerouting_table(PREROUTING);
        assert_eq!(
            rules.iter().copied().collect::<Vec<_>>(),
            vec![ForwardingRule::new(8080, 80), ForwardingRule::new(2222, 22)]
        );
    }

    #[test]
    fn test_parse_skips_lines_without_both_ports() {
        let output = "\
num  target     prot opt source               destination
1    REDIRECT   tcp  --  0.0.0.0/0            0.0.0.0/0            tcp dpts:8000:8010 redir ports 80
2    REDIRECT   tcp  --  0.0.0.0/0            0.0.0.0/0            tcp dpt:9000 redir ports 9001
3    REDIRECT   tcp  --  0.0.0.0/0            0.0.0.0/0            tcp dpt:9100 redir ports 9101-9102
";
        let rules = parse_prerouting_table(output);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get(1), Some(&ForwardingRule::new(9000, 9001)));
    }

    #[test]
    fn test_parse_empty_chain() {
        let output = "Chain PREROUTING (policy ACCEPT)\nnum  target     prot opt source               destination\n";
        assert!(parse_prerouting_table(output).is_empty());
    }

    #[test]
    fn test_add_command_line() {
        let runner = MockRunner::new();
        backend(&runner).add(PortPair::new(8080, 80)).unwrap();

        assert_eq!(
            runner.calls(),
            vec!["sudo iptables -t nat -A PREROUTING -p tcp --dport 8080 -j REDIRECT --to-port 80"]
        );
    }

    #[test]
    fn test_without_sudo() {
        let runner = MockRunner::new();
        let backend = LinuxBackend::new(runner.clone(), BackendConfig::new().with_sudo(false));

        backend.list().unwrap();

        assert_eq!(
            runner.calls(),
            vec!["iptables -t nat -L PREROUTING -n --line-numbers"]
        );
    }

    #[test]
    fn test_list_parses_runner_output() {
        let runner = MockRunner::new();
        runner.respond("-L PREROUTING", CommandOutput::success(PREROUTING));

        let rules = backend(&runner).list().unwrap();
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_remove_by_index_is_positional() {
        let runner = MockRunner::new();
        let removed = backend(&runner).remove_by_index(3).unwrap();

        assert_eq!(removed, Removed { index: 3, rule: None });
        assert_eq!(runner.calls(), vec!["sudo iptables -t nat -D PREROUTING 3"]);
    }

    #[test]
    fn test_remove_by_index_failure_from_exit_status() {
        let runner = MockRunner::new();
        runner.respond(
            "-D PREROUTING",
            CommandOutput::failure(1, "iptables: Index of deletion too big."),
        );

        let err = backend(&runner).remove_by_index(42).unwrap_err();
        assert!(err.is_native_failure());
        assert!(err.to_string().contains("Index of deletion too big"));
    }

    #[test]
    fn test_remove_by_index_zero() {
        let runner = MockRunner::new();
        let err = backend(&runner).remove_by_index(0).unwrap_err();

        assert!(matches!(err, Error::InvalidIndex(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_remove_all_flushes_chain() {
        let runner = MockRunner::new();
        let removal = backend(&runner).remove_all().unwrap();

        assert!(matches!(removal, Removal::Flushed));
        assert_eq!(runner.calls(), vec!["sudo iptables -t nat -F PREROUTING"]);
    }
}
