//! Management port discovery.

use std::time::Duration;

use log::debug;
use tokio::net::TcpStream;

use super::TransportDiscovery;
use crate::transport::TransportKind;

/// Discovers the transport by trying the SSH port, then the Telnet port.
///
/// The probe connection is dropped as soon as it is established; the
/// session opens its own.
#[derive(Debug, Clone)]
pub struct PortDiscoverer {
    ssh_port: u16,
    telnet_port: u16,
    timeout: Duration,
}

impl PortDiscoverer {
    pub fn new(ssh_port: u16, telnet_port: u16, timeout: Duration) -> Self {
        Self {
            ssh_port,
            telnet_port,
            timeout,
        }
    }

    /// Check whether `host:port` accepts a TCP connection within the timeout.
    pub async fn is_open(&self, host: &str, port: u16) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => {
                debug!("Port {host}:{port} is open");
                true
            }
            Ok(Err(e)) => {
                debug!("Port {host}:{port} connection failed: {e}");
                false
            }
            Err(_) => {
                debug!("Port {host}:{port} connection timed out");
                false
            }
        }
    }
}

impl Default for PortDiscoverer {
    fn default() -> Self {
        Self::new(
            TransportKind::Ssh.default_port(),
            TransportKind::Telnet.default_port(),
            Duration::from_secs(5),
        )
    }
}

impl TransportDiscovery for PortDiscoverer {
    async fn discover(&self, host: &str) -> Option<TransportKind> {
        if self.is_open(host, self.ssh_port).await {
            Some(TransportKind::Ssh)
        } else if self.is_open(host, self.telnet_port).await {
            Some(TransportKind::Telnet)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn discoverer(ssh_port: u16, telnet_port: u16) -> PortDiscoverer {
        PortDiscoverer::new(ssh_port, telnet_port, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_both_open_prefers_ssh() {
        let ssh = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let telnet = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let discoverer = discoverer(
            ssh.local_addr().unwrap().port(),
            telnet.local_addr().unwrap().port(),
        );

        assert_eq!(discoverer.discover("127.0.0.1").await, Some(TransportKind::Ssh));
    }

    #[tokio::test]
    async fn test_only_telnet_open() {
        let telnet = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let discoverer = discoverer(closed_port().await, telnet.local_addr().unwrap().port());

        assert_eq!(discoverer.discover("127.0.0.1").await, Some(TransportKind::Telnet));
    }

    #[tokio::test]
    async fn test_both_closed() {
        let discoverer = discoverer(closed_port().await, closed_port().await);
        assert_eq!(discoverer.discover("127.0.0.1").await, None);
    }
}
