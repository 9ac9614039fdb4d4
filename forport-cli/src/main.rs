//! forport CLI
//!
//! A command-line interface for managing TCP port forwarding rules.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forport_core::{backend, BackendConfig, Dispatcher, Platform, SystemRunner};

/// forport - forward TCP ports with the OS's native NAT/proxy table
///
/// Uses `netsh interface portproxy` on Windows and the iptables NAT
/// PREROUTING chain on Linux.
#[derive(Parser)]
#[command(name = "forport")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "forport <source_port>:<destination_port> | list | delete <id> | delete all")]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run iptables directly instead of through sudo (Linux only)
    #[arg(long)]
    no_sudo: bool,

    /// `<src>:<dst>` (ports or N-M ranges), `list`, `remove <id>`, `delete all`
    #[arg(value_name = "ACTION")]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Dispatch the command and print its report
///
/// Returns whether every native operation succeeded.
fn run(cli: &Cli) -> Result<bool> {
    let platform = Platform::current().context("Cannot manage port forwarding on this host")?;
    debug!("Using {} backend", platform);

    let config = BackendConfig::new().with_sudo(!cli.no_sudo);
    let dispatcher = Dispatcher::new(backend::for_platform(platform, SystemRunner, config));

    let report = dispatcher.run(cli.args.as_slice())?;
    println!("{}", report);

    Ok(report.is_success())
}
