//! Management transports.
//!
//! A device is reached over exactly one of a closed set of protocols:
//! SSH (preferred) or Telnet (fallback). Both expose the same byte-stream
//! surface so the channel layer above does not care which one it drives.

pub mod config;
mod ssh;
mod telnet;

use std::fmt;

pub use config::{HostKeyVerification, TransportConfig};
pub use ssh::SshTransport;
pub use telnet::{TelnetCodec, TelnetTransport};

use crate::error::Result;

/// Management protocol used to reach a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// SSH, the primary transport.
    Ssh,

    /// Telnet, used only when SSH is not reachable.
    Telnet,
}

impl TransportKind {
    /// Well-known port for this protocol.
    pub fn default_port(self) -> u16 {
        match self {
            TransportKind::Ssh => 22,
            TransportKind::Telnet => 23,
        }
    }

    /// Line terminator sent after every command.
    pub fn line_ending(self) -> &'static str {
        match self {
            TransportKind::Ssh => "\n",
            TransportKind::Telnet => "\r\n",
        }
    }

    /// Whether the device expects in-band username/password prompts.
    pub fn authenticates_in_band(self) -> bool {
        matches!(self, TransportKind::Telnet)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Ssh => f.write_str("ssh"),
            TransportKind::Telnet => f.write_str("telnet"),
        }
    }
}

/// An established connection to a device.
///
/// Each session owns its transport exclusively; connections are never
/// shared between hosts.
pub enum Transport {
    Ssh(SshTransport),
    Telnet(TelnetTransport),
}

impl Transport {
    /// Connect using the protocol named in `config`.
    ///
    /// For SSH this includes protocol-level authentication and opening the
    /// interactive shell. For Telnet it only opens the TCP stream; login
    /// happens in-band against the device's prompts.
    pub async fn connect(config: &TransportConfig) -> Result<Self> {
        match config.kind {
            TransportKind::Ssh => Ok(Transport::Ssh(SshTransport::connect(config).await?)),
            TransportKind::Telnet => Ok(Transport::Telnet(TelnetTransport::connect(config).await?)),
        }
    }

    /// Which protocol this connection speaks.
    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::Ssh(_) => TransportKind::Ssh,
            Transport::Telnet(_) => TransportKind::Telnet,
        }
    }

    /// Write raw bytes to the device.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Transport::Ssh(ssh) => ssh.write(data).await,
            Transport::Telnet(telnet) => telnet.write(data).await,
        }
    }

    /// Read the next chunk of device output.
    ///
    /// Returns `Ok(None)` once the remote side has closed the stream.
    pub async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self {
            Transport::Ssh(ssh) => ssh.read_chunk().await,
            Transport::Telnet(telnet) => telnet.read_chunk().await,
        }
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        match self {
            Transport::Ssh(ssh) => ssh.close().await,
            Transport::Telnet(telnet) => telnet.close().await,
        }
    }
}
