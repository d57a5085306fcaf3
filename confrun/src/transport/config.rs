//! Connection configuration shared by the SSH and Telnet transports.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::TransportKind;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
///
/// Only consulted by the SSH transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    /// This is the default and matches common SSH client behavior.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// Transport connection configuration.
#[derive(Debug)]
pub struct TransportConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Management port.
    pub port: u16,

    /// Which management protocol to speak on `port`.
    pub kind: TransportKind,

    /// Username for authentication.
    pub username: String,

    /// Login password. SSH uses it at the protocol layer, Telnet in-band.
    pub password: SecretString,

    /// Connection and handshake timeout.
    pub timeout: Duration,

    /// Terminal width for the SSH PTY.
    pub terminal_width: u32,

    /// Terminal height for the SSH PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl TransportConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
