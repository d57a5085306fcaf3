//! # confrun
//!
//! Batch configuration push to Cisco IOS devices.
//!
//! Given a CSV inventory of hosts and credentials and a file of configuration
//! commands, confrun pings every host, picks SSH or falls back to Telnet,
//! logs in, enters privileged EXEC with `enable`, pushes the commands and
//! saves what each device printed back.
//!
//! ## Features
//!
//! - Async SSH sessions via russh, Telnet over plain TCP
//! - Reachability and transport probes ahead of every session
//! - Cisco IOS prompt handling (user EXEC, privileged EXEC, configuration)
//! - Verbatim per-device transcripts and a list of unreachable hosts
//! - Per-host failure isolation, optionally with several devices at once
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confrun::{IcmpProber, IosConnector, Orchestrator, PortDiscoverer, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), confrun::Error> {
//!     let config = RunConfig::new("conf.txt", "hosts.csv");
//!     let session = config.session.clone();
//!
//!     let orchestrator = Orchestrator::new(
//!         config.clone(),
//!         IcmpProber::new(config.probe_timeout),
//!         PortDiscoverer::new(session.ssh_port, session.telnet_port, session.connect_timeout),
//!         IosConnector::new(session),
//!     );
//!
//!     let report = orchestrator.run_from_files().await?;
//!     println!("{} pushed, {} down", report.pushed(), report.down.len());
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod orchestrator;
pub mod payload;
pub mod platform;
pub mod probe;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::{NamingPolicy, RunConfig, SessionOptions};
pub use error::{Error, Result};
pub use inventory::{Inventory, InventoryRecord};
pub use orchestrator::{FailureKind, HostReport, Orchestrator, RunReport, SessionOutcome};
pub use payload::Payload;
pub use probe::{IcmpProber, PortDiscoverer, Reachability, ReachabilityProbe, TransportDiscovery};
pub use session::{Connector, DeviceSession, IosConnector, Session, SessionBuilder, SessionState};
pub use transport::{HostKeyVerification, TransportKind};
