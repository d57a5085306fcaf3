//! Run configuration.
//!
//! Everything a run needs is collected into a [`RunConfig`] up front and
//! handed to the [`Orchestrator`](crate::orchestrator::Orchestrator); no
//! component reads ambient state.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifact;
use crate::transport::{HostKeyVerification, TransportKind};

/// How per-host transcript files are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `<host>_<timestamp>.txt`, using the inventory host identifier.
    #[default]
    HostIdentifier,

    /// `<identity>_<timestamp>.txt`, using the name the device reports.
    DeviceIdentity,
}

/// Per-session connection settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Port tried first (SSH).
    pub ssh_port: u16,

    /// Port tried when the SSH port is closed (Telnet).
    pub telnet_port: u16,

    /// Bound on each TCP connect and on the SSH handshake.
    pub connect_timeout: Duration,

    /// Bound on each login, escalation, and command round trip.
    pub command_timeout: Duration,

    /// Quiet period after the configuration push during which trailing
    /// output is still collected.
    pub settle_delay: Duration,

    /// SSH host key policy.
    pub host_key_verification: HostKeyVerification,

    /// Alternate known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SessionOptions {
    /// Port to use for a given transport.
    pub fn port_for(&self, kind: TransportKind) -> u16 {
        match kind {
            TransportKind::Ssh => self.ssh_port,
            TransportKind::Telnet => self.telnet_port,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ssh_port: TransportKind::Ssh.default_port(),
            telnet_port: TransportKind::Telnet.default_port(),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(500),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// Configuration for one deployment run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// File of configuration commands pushed to every device.
    pub payload_path: PathBuf,

    /// CSV inventory of hosts and credentials.
    pub inventory_path: PathBuf,

    /// Directory receiving the down list and transcripts.
    pub output_dir: PathBuf,

    /// Transcript naming policy.
    pub naming: NamingPolicy,

    /// Bound on each reachability probe.
    pub probe_timeout: Duration,

    /// Maximum number of sessions open at once. One keeps the run strictly
    /// sequential.
    pub max_sessions: NonZeroUsize,

    /// Timestamp embedded in every artifact name of this run.
    pub run_timestamp: String,

    /// Connection settings for each device session.
    pub session: SessionOptions,
}

impl RunConfig {
    /// Create a configuration with default settings for the given inputs.
    pub fn new(payload_path: impl Into<PathBuf>, inventory_path: impl Into<PathBuf>) -> Self {
        Self {
            payload_path: payload_path.into(),
            inventory_path: inventory_path.into(),
            ..Self::default()
        }
    }

    /// Set the naming policy.
    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the maximum number of concurrent sessions.
    pub fn with_max_sessions(mut self, max: NonZeroUsize) -> Self {
        self.max_sessions = max;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            payload_path: PathBuf::new(),
            inventory_path: PathBuf::new(),
            output_dir: PathBuf::from("result-config"),
            naming: NamingPolicy::default(),
            probe_timeout: Duration::from_secs(1),
            max_sessions: NonZeroUsize::MIN,
            run_timestamp: artifact::run_timestamp(),
            session: SessionOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sequential() {
        let config = RunConfig::new("conf.txt", "hosts.csv");
        assert_eq!(config.max_sessions.get(), 1);
        assert_eq!(config.naming, NamingPolicy::HostIdentifier);
        assert_eq!(config.output_dir, PathBuf::from("result-config"));
        assert_eq!(config.session.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_port_for() {
        let options = SessionOptions {
            ssh_port: 2222,
            ..SessionOptions::default()
        };
        assert_eq!(options.port_for(TransportKind::Ssh), 2222);
        assert_eq!(options.port_for(TransportKind::Telnet), 23);
    }
}
