//! Error types for confrun.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for confrun operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (TCP, SSH, Telnet, authentication)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Inventory loading and lookup errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Configuration payload errors
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Result artifact errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl Error {
    /// Whether the device rejected the credentials, either at login or at
    /// privilege escalation.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::AuthenticationFailed { .. })
                | Error::Driver(DriverError::EnableFailed { .. })
        )
    }

    /// Whether the management port stopped accepting connections between
    /// discovery and session open.
    ///
    /// A connection that was accepted but then stalled in the SSH handshake
    /// is [`TransportError::HandshakeTimeout`] and does not count.
    pub fn is_transport_unavailable(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::ConnectionFailed { .. } | TransportError::Timeout(_))
        )
    }

    /// Device output collected before a configuration push failed, if any.
    pub fn partial_transcript(&self) -> Option<&str> {
        match self {
            Error::Driver(DriverError::PushInterrupted { transcript, .. }) => Some(transcript),
            _ => None,
        }
    }
}

/// Transport layer errors (TCP connection, SSH, Telnet, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// The server presented a host key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Strict verification is on and the host is not in known_hosts
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// TCP connect timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The port accepted the connection but key exchange or
    /// authentication did not finish in time
    #[error("SSH handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching on the device output).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// Operation invoked from the wrong point of the session lifecycle
    #[error("Invalid session state: expected {expected:?}, found {found:?}")]
    InvalidState {
        expected: SessionState,
        found: SessionState,
    },

    /// The enable secret was rejected
    #[error("Privilege escalation rejected on {host}")]
    EnableFailed { host: String },

    /// The device answered with a prompt the session did not expect
    #[error("Unexpected prompt: '{prompt}'")]
    UnexpectedPrompt { prompt: String },

    /// The configuration push failed part-way; `transcript` holds what the
    /// device printed up to that point
    #[error("{source}")]
    PushInterrupted {
        transcript: String,
        #[source]
        source: Box<Error>,
    },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Inventory loading and lookup errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The inventory file could not be opened or parsed
    #[error("Failed to read inventory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV decoding error on a record
    #[error("Malformed inventory record: {0}")]
    Csv(#[from] csv::Error),

    /// A required column header is absent
    #[error("Inventory is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    /// A record has an empty host identifier
    #[error("Inventory record {record} has an empty '{column}' field")]
    EmptyField { record: usize, column: &'static str },

    /// The same host identifier appears twice
    #[error("Host '{host}' appears more than once in the inventory")]
    DuplicateHost { host: String },

    /// Lookup for a host that is not in the inventory
    #[error("Host '{host}' is not in the inventory")]
    UnknownHost { host: String },
}

/// Configuration payload errors.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The payload file could not be read
    #[error("Failed to read configuration payload {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload holds no commands
    #[error("Configuration payload {path} contains no commands")]
    Empty { path: PathBuf },
}

/// Result artifact errors.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An artifact could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using confrun's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        let login: Error = TransportError::AuthenticationFailed {
            user: "admin".to_string(),
        }
        .into();
        assert!(login.is_auth_failure());

        let enable: Error = DriverError::EnableFailed {
            host: "10.0.0.1".to_string(),
        }
        .into();
        assert!(enable.is_auth_failure());

        let timeout: Error = ChannelError::PatternTimeout(Duration::from_secs(1)).into();
        assert!(!timeout.is_auth_failure());
    }

    #[test]
    fn test_transport_unavailable_classification() {
        let refused: Error = TransportError::ConnectionFailed {
            host: "10.0.0.1".to_string(),
            port: 22,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        }
        .into();
        assert!(refused.is_transport_unavailable());

        let connect: Error = TransportError::Timeout(Duration::from_secs(5)).into();
        assert!(connect.is_transport_unavailable());

        let handshake: Error = TransportError::HandshakeTimeout(Duration::from_secs(5)).into();
        assert!(!handshake.is_transport_unavailable());
        assert!(!handshake.is_auth_failure());
    }

    #[test]
    fn test_partial_transcript_of_interrupted_push() {
        let err: Error = DriverError::PushInterrupted {
            transcript: "R1(config)#hostname EDGE1\n".to_string(),
            source: Box::new(ChannelError::Closed.into()),
        }
        .into();
        assert_eq!(err.partial_transcript(), Some("R1(config)#hostname EDGE1\n"));
        assert_eq!(err.to_string(), "Driver error: Channel error: Channel closed");

        let plain: Error = ChannelError::Closed.into();
        assert_eq!(plain.partial_transcript(), None);
    }
}
