//! Builder for device sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::ios::Session;
use crate::error::{DriverError, Result};
use crate::platform;
use crate::transport::{HostKeyVerification, TransportConfig, TransportKind};

/// Builder for constructing device sessions.
///
/// # Example
///
/// ```rust,no_run
/// use confrun::session::SessionBuilder;
/// use confrun::transport::TransportKind;
///
/// # async fn example() -> Result<(), confrun::Error> {
/// let mut session = SessionBuilder::new("192.168.1.1")
///     .transport(TransportKind::Ssh)
///     .username("admin")
///     .password("secret")
///     .secret("enable-secret")
///     .build()?;
/// session.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    kind: TransportKind,
    port: Option<u16>,
    username: Option<String>,
    password: Option<SecretString>,
    secret: Option<SecretString>,
    connect_timeout: Duration,
    timeout: Duration,
    settle_delay: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            kind: TransportKind::Ssh,
            port: None,
            username: None,
            password: None,
            secret: None,
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(500),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the transport (default: SSH).
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the port (default: the transport's well-known port).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the enable secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the timeout for login, escalation and each command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long to keep collecting output after the configuration push.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the SSH host key policy.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use an alternate known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the session.
    ///
    /// This creates the session but does not connect. Call `open()` on the
    /// returned session to establish the connection.
    pub fn build(self) -> Result<Session> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;
        let password = self.password.ok_or_else(|| DriverError::InvalidConfig {
            message: "Password is required".to_string(),
        })?;
        if self.host.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "Host is required".to_string(),
            }
            .into());
        }

        let transport = TransportConfig {
            port: self.port.unwrap_or_else(|| self.kind.default_port()),
            host: self.host,
            kind: self.kind,
            username,
            password,
            timeout: self.connect_timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        Ok(Session::new(
            transport,
            self.secret.unwrap_or_else(|| SecretString::from(String::new())),
            platform::ios::platform(),
            self.timeout,
            self.settle_delay,
        ))
    }
}
