//! Pre-session probes.
//!
//! Before any session is attempted a host must answer a reachability probe,
//! and then one of its management ports must accept a TCP connection. Both
//! outcomes are plain values: an unreachable host or a closed port is an
//! expected result, not an error.

mod icmp;
mod port;

pub use icmp::IcmpProber;
pub use port::PortDiscoverer;

use std::fmt;
use std::future::Future;

use crate::transport::TransportKind;

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Up,
    Down,
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reachability::Up => f.write_str("up"),
            Reachability::Down => f.write_str("down"),
        }
    }
}

/// Decides whether a host is worth a session attempt.
pub trait ReachabilityProbe: Send + Sync {
    /// Probe `host`. Every failure mode maps to [`Reachability::Down`].
    fn probe(&self, host: &str) -> impl Future<Output = Reachability> + Send;
}

/// Picks the management protocol for a reachable host.
pub trait TransportDiscovery: Send + Sync {
    /// SSH when its port accepts a connection, otherwise Telnet when its
    /// port does, otherwise `None`.
    fn discover(&self, host: &str) -> impl Future<Output = Option<TransportKind>> + Send;
}
