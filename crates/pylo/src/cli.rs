//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Bring up a Palo Alto Networks firewall HA pair from XML templates.
///
/// Generates API keys for both firewalls, pairs them in active/passive
/// HA, then pushes the interface, zone, routing, security and NAT
/// configuration to the active member and syncs it to the peer.
#[derive(Debug, Parser)]
#[command(name = "pylo", version)]
pub struct Cli {
    /// Run configuration file (TOML or JSON)
    #[arg(long, short = 'c', env = "PYLO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print errors; no banner, progress bars or summary
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Accept self-signed firewall certificates
    #[arg(long, short = 'k')]
    pub insecure: bool,

    /// Directory for the run log file
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
