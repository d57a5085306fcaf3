//! Command-line interface.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{NamingPolicy, RunConfig};
use crate::transport::HostKeyVerification;

/// Push a configuration file to every reachable Cisco IOS device in a CSV
/// inventory, over SSH or Telnet.
#[derive(Parser, Debug)]
#[command(name = "confrun")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// File of configuration commands, one per line
    #[arg(short, long = "conf", value_name = "FILE")]
    pub conf: PathBuf,

    /// CSV inventory with IP, Username, Password and Enable Secret columns
    #[arg(short = 's', long = "csv", value_name = "FILE")]
    pub csv: PathBuf,

    /// Enable debug logging and print every transcript in the summary
    #[arg(short, long)]
    pub verbose: bool,

    /// Name transcripts after the device's reported hostname instead of its IP
    #[arg(short = 'n', long = "host")]
    pub name_by_identity: bool,

    /// Directory receiving transcripts and the down-devices list
    #[arg(short, long, value_name = "DIR", default_value = "result-config")]
    pub output_dir: PathBuf,

    /// Number of devices configured at the same time
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=256))]
    pub workers: u32,

    /// Ping timeout (seconds)
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    pub probe_timeout: u64,

    /// Login and per-command timeout (seconds)
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Refuse SSH hosts whose key is not already in known_hosts
    #[arg(long)]
    pub strict_host_key: bool,
}

impl Cli {
    /// Run configuration described by these arguments.
    pub fn into_run_config(self) -> RunConfig {
        let naming = if self.name_by_identity {
            NamingPolicy::DeviceIdentity
        } else {
            NamingPolicy::HostIdentifier
        };
        let max_sessions = usize::try_from(self.workers)
            .ok()
            .and_then(NonZeroUsize::new)
            .unwrap_or(NonZeroUsize::MIN);

        let mut config = RunConfig::new(self.conf, self.csv)
            .with_output_dir(self.output_dir)
            .with_naming(naming)
            .with_max_sessions(max_sessions);
        config.probe_timeout = Duration::from_secs(self.probe_timeout);
        config.session.command_timeout = Duration::from_secs(self.timeout);
        if self.strict_host_key {
            config.session.host_key_verification = HostKeyVerification::Strict;
        }
        config
    }
}
