//! Windows backend over `netsh interface portproxy`
//!
//! `netsh interface portproxy show all` prints a table like:
//!
//! ```text
//! Listen on ipv4:             Connect to ipv4:
//!
//! Address         Port        Address         Port
//! --------------- ----------  --------------- ----------
//! 0.0.0.0         8080        127.0.0.1       80
//! ```
//!
//! Data lines carry the listen port as the 2nd token and the connect port as
//! the 4th. Everything else is skipped.

use crate::config::{CONNECT_ADDRESS, LISTEN_ADDRESS};
use crate::error::{Error, Result};
use crate::plan::PortPair;
use crate::range::Port;
use crate::rule::{ForwardingRule, RuleSet};
use crate::runner::{run_checked, CommandRunner, NativeCommand};

use super::{Removal, Removed, RuleBackend, RuleOutcome};

/// Port proxy backend
pub struct WindowsBackend<R> {
    runner: R,
}

impl<R: CommandRunner> WindowsBackend<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn portproxy() -> NativeCommand {
        NativeCommand::new("netsh").args(["interface", "portproxy"])
    }

    fn delete_command(listen_port: Port) -> NativeCommand {
        Self::portproxy().args([
            "delete".to_string(),
            "v4tov4".to_string(),
            format!("listenport={}", listen_port),
            format!("listenaddress={}", LISTEN_ADDRESS),
        ])
    }

    fn delete(&self, rule: &ForwardingRule) -> Result<()> {
        log::info!("Removing port forwarding rule: {}", rule);
        run_checked(&self.runner, &Self::delete_command(rule.listen_port))?;
        Ok(())
    }
}

impl<R: CommandRunner> RuleBackend for WindowsBackend<R> {
    fn add(&self, pair: PortPair) -> Result<()> {
        let command = Self::portproxy().args([
            "add".to_string(),
            "v4tov4".to_string(),
            format!("listenport={}", pair.source),
            format!("listenaddress={}", LISTEN_ADDRESS),
            format!("connectport={}", pair.destination),
            format!("connectaddress={}", CONNECT_ADDRESS),
        ]);
        run_checked(&self.runner, &command)?;
        Ok(())
    }

    fn list(&self) -> Result<RuleSet> {
        let command = Self::portproxy().args(["show", "all"]);
        let output = run_checked(&self.runner, &command)?;
        Ok(parse_portproxy_table(&output.stdout))
    }

    fn remove_by_index(&self, index: usize) -> Result<Removed> {
        let rules = self.list()?;
        let rule = *rules.get(index).ok_or_else(|| {
            Error::InvalidIndex(format!("{} ({} rule(s) listed)", index, rules.len()))
        })?;

        self.delete(&rule)?;
        Ok(Removed {
            index,
            rule: Some(rule),
        })
    }

    fn remove_all(&self) -> Result<Removal> {
        let rules = self.list()?;
        let outcomes = rules
            .iter()
            .map(|rule| RuleOutcome {
                rule: *rule,
                result: self.delete(rule),
            })
            .collect();
        Ok(Removal::PerRule(outcomes))
    }
}

/// Parse `netsh interface portproxy show all` output
///
/// Lines whose 2nd and 4th tokens are not both plain port numbers are
/// dropped. Order is preserved.
pub fn parse_portproxy_table(output: &str) -> RuleSet {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Listen on"))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return None;
            }
            let listen_port = numeric_port(parts[1])?;
            let connect_port = numeric_port(parts[3])?;
            Some(ForwardingRule::new(listen_port, connect_port))
        })
        .collect()
}

fn numeric_port(token: &str) -> Option<Port> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;
    use crate::runner::CommandOutput;

    const SHOW_ALL: &str = "\r\n\
Listen on ipv4:             Connect to ipv4:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
0.0.0.0         8080        127.0.0.1       80\r\n\
0.0.0.0         2222        127.0.0.1       22\r\n\
\r\n";

    #[test]
    fn test_parse_table() {
        let rules = parse_portproxy_table(SHOW_ALL);
        assert_eq!(
            rules.iter().copied().collect::<Vec<_>>(),
            vec![ForwardingRule::new(8080, 80), ForwardingRule::new(2222, 22)]
        );
    }

    #[test]
    fn test_parse_skips_header_and_malformed() {
        let output = "Listen on ipv4:             Connect to ipv4:\n\
                      0.0.0.0         9000        127.0.0.1       9001\n\
                      0.0.0.0         http        127.0.0.1       80\n\
                      0.0.0.0         70000       127.0.0.1       80\n";
        let rules = parse_portproxy_table(output);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get(1), Some(&ForwardingRule::new(9000, 9001)));
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_portproxy_table("").is_empty());
    }

    #[test]
    fn test_add_command_line() {
        let runner = MockRunner::new();
        let backend = WindowsBackend::new(runner.clone());

        backend.add(PortPair::new(8080, 80)).unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "netsh interface portproxy add v4tov4 listenport=8080 listenaddress=0.0.0.0 \
                 connectport=80 connectaddress=127.0.0.1"
            ]
        );
    }

    #[test]
    fn test_add_failure_from_exit_status() {
        let runner = MockRunner::new();
        runner.fail_on("add v4tov4");
        let backend = WindowsBackend::new(runner);

        let err = backend.add(PortPair::new(8080, 80)).unwrap_err();
        assert!(err.is_native_failure());
    }

    #[test]
    fn test_remove_by_index_resolves_listen_port() {
        let runner = MockRunner::new();
        runner.respond("show all", CommandOutput::success(SHOW_ALL));
        let backend = WindowsBackend::new(runner.clone());

        let removed = backend.remove_by_index(2).unwrap();

        assert_eq!(removed.rule, Some(ForwardingRule::new(2222, 22)));
        assert_eq!(
            runner.calls().last().unwrap(),
            "netsh interface portproxy delete v4tov4 listenport=2222 listenaddress=0.0.0.0"
        );
    }

    #[test]
    fn test_remove_by_index_out_of_range() {
        let runner = MockRunner::new();
        runner.respond("show all", CommandOutput::success(SHOW_ALL));
        let backend = WindowsBackend::new(runner.clone());

        for index in [0, 3] {
            let err = backend.remove_by_index(index).unwrap_err();
            assert!(matches!(err, Error::InvalidIndex(_)));
        }
        assert_eq!(runner.count("delete"), 0);
    }

    #[test]
    fn test_remove_all_continues_after_failure() {
        let runner = MockRunner::new();
        runner
            .respond("show all", CommandOutput::success(SHOW_ALL))
            .fail_on("listenport=8080");
        let backend = WindowsBackend::new(runner.clone());

        let removal = backend.remove_all().unwrap();

        let Removal::PerRule(outcomes) = &removal else {
            panic!("expected per-rule removal");
        };
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].result.is_ok());
        assert!(!removal.is_success());
        assert_eq!(runner.count("delete v4tov4"), 2);
    }

    #[test]
    fn test_list_failure_is_not_empty() {
        let runner = MockRunner::new();
        runner.fail_on("show all");
        let backend = WindowsBackend::new(runner);

        assert!(backend.list().unwrap_err().is_native_failure());
    }
}
