//! Batch deployment across an inventory.
//!
//! The orchestrator drives every host through the same pipeline:
//!
//! ```text
//! probe ──► down list
//!   │
//!   └─ up ──► discover ──► open ──► push ──► (identity) ──► transcript
//! ```
//!
//! Per-host failures end that host's pipeline and are reported in the
//! [`RunReport`]; they never stop the batch. Only loading the inputs and
//! creating the output directory are fatal.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use futures_util::stream::{self, StreamExt};
use log::{debug, error, info, warn};

use crate::artifact::ArtifactStore;
use crate::config::{NamingPolicy, RunConfig};
use crate::error::{Error, Result};
use crate::inventory::{Inventory, InventoryRecord};
use crate::payload::Payload;
use crate::probe::{Reachability, ReachabilityProbe, TransportDiscovery};
use crate::session::{Connector, DeviceSession};
use crate::transport::TransportKind;

/// Why a reachable host was not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Login or enable credentials were rejected.
    AuthenticationFailure,

    /// No management port accepted a connection.
    TransportUnavailable,

    /// The push succeeded but its transcript could not be saved.
    OutputWrite,

    /// Timeouts, disconnects and unexpected device output.
    Other,
}

impl FailureKind {
    /// Classify a per-host error.
    pub fn classify(error: &Error) -> Self {
        if error.is_auth_failure() {
            FailureKind::AuthenticationFailure
        } else if error.is_transport_unavailable() {
            FailureKind::TransportUnavailable
        } else if matches!(error, Error::Artifact(_)) {
            FailureKind::OutputWrite
        } else {
            FailureKind::Other
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::AuthenticationFailure => f.write_str("authentication failure"),
            FailureKind::TransportUnavailable => f.write_str("transport unavailable"),
            FailureKind::OutputWrite => f.write_str("output write failure"),
            FailureKind::Other => f.write_str("session failure"),
        }
    }
}

/// Result of one reachable host's pipeline.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The payload was pushed and the transcript saved.
    Pushed {
        transport: TransportKind,
        transcript: String,
        artifact: PathBuf,
    },

    /// The pipeline stopped early.
    Failed {
        kind: FailureKind,
        message: String,
        /// Output of a push that failed part-way. The device may hold some
        /// of the payload.
        partial_transcript: Option<String>,
    },
}

impl SessionOutcome {
    pub fn is_pushed(&self) -> bool {
        matches!(self, SessionOutcome::Pushed { .. })
    }
}

/// Outcome for one host.
#[derive(Debug, Clone)]
pub struct HostReport {
    pub host: String,
    pub outcome: SessionOutcome,
}

/// Everything a run did, in inventory order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Hosts that failed the reachability probe.
    pub down: Vec<String>,

    /// One entry per reachable host.
    pub hosts: Vec<HostReport>,
}

impl RunReport {
    /// Number of hosts configured.
    pub fn pushed(&self) -> usize {
        self.hosts.iter().filter(|h| h.outcome.is_pushed()).count()
    }

    /// Number of reachable hosts that were not configured.
    pub fn failed(&self) -> usize {
        self.hosts.len() - self.pushed()
    }

    /// Outcome for a host, if it was reachable.
    pub fn outcome(&self, host: &str) -> Option<&SessionOutcome> {
        self.hosts.iter().find(|h| h.host == host).map(|h| &h.outcome)
    }

    /// Human-readable per-host summary, optionally followed by every
    /// transcript, complete or partial.
    pub fn summary(&self, with_transcripts: bool) -> String {
        let mut out = String::new();
        for host in &self.down {
            let _ = writeln!(out, "{host:<24} down");
        }
        for host in &self.hosts {
            let _ = match &host.outcome {
                SessionOutcome::Pushed {
                    transport, artifact, ..
                } => writeln!(out, "{:<24} pushed over {transport} -> {}", host.host, artifact.display()),
                SessionOutcome::Failed { kind, message, .. } => {
                    writeln!(out, "{:<24} {kind}: {message}", host.host)
                }
            };
        }
        let _ = writeln!(
            out,
            "\n{} pushed, {} failed, {} down",
            self.pushed(),
            self.failed(),
            self.down.len()
        );

        if with_transcripts {
            for host in &self.hosts {
                let (label, transcript) = match &host.outcome {
                    SessionOutcome::Pushed { transcript, .. } => ("transcript", transcript),
                    SessionOutcome::Failed {
                        partial_transcript: Some(transcript),
                        ..
                    } => ("partial transcript", transcript),
                    SessionOutcome::Failed { .. } => continue,
                };
                let _ = writeln!(out, "\n===== {} {label} =====\n{transcript}", host.host);
            }
        }
        out
    }
}

/// Runs a configuration payload against an inventory.
pub struct Orchestrator<P, D, C> {
    config: RunConfig,
    prober: P,
    discovery: D,
    connector: C,
}

impl<P, D, C> Orchestrator<P, D, C>
where
    P: ReachabilityProbe,
    D: TransportDiscovery,
    C: Connector,
{
    pub fn new(config: RunConfig, prober: P, discovery: D, connector: C) -> Self {
        Self {
            config,
            prober,
            discovery,
            connector,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load the inventory and payload named in the configuration, then run.
    pub async fn run_from_files(&self) -> Result<RunReport> {
        let inventory = Inventory::load(&self.config.inventory_path)?;
        let payload = Payload::load(&self.config.payload_path)?;
        info!(
            "Loaded {} hosts and {} configuration lines",
            inventory.len(),
            payload.len()
        );
        self.run(&inventory, &payload).await
    }

    /// Push `payload` to every reachable host in `inventory`.
    pub async fn run(&self, inventory: &Inventory, payload: &Payload) -> Result<RunReport> {
        let store = ArtifactStore::create(&self.config.output_dir, &self.config.run_timestamp).await?;
        debug!("Writing artifacts to {}", store.dir().display());

        let mut report = RunReport::default();
        let mut up = Vec::new();
        for host in inventory.hosts() {
            match self.prober.probe(host).await {
                Reachability::Up => {
                    info!("{host}: up");
                    up.push(host);
                }
                Reachability::Down => {
                    warn!("{host}: down");
                    if let Err(e) = store.append_down(host).await {
                        error!("{host}: {}: {e}", FailureKind::OutputWrite);
                    }
                    report.down.push(host.to_string());
                }
            }
        }

        let records = up
            .into_iter()
            .map(|host| inventory.get(host))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        report.hosts = stream::iter(records)
            .map(|record| self.process(record, payload, &store))
            .buffered(self.config.max_sessions.get())
            .collect()
            .await;

        info!(
            "Run complete: {} pushed, {} failed, {} down",
            report.pushed(),
            report.failed(),
            report.down.len()
        );
        Ok(report)
    }

    async fn process(&self, record: &InventoryRecord, payload: &Payload, store: &ArtifactStore) -> HostReport {
        let host = &record.host;

        let outcome = match self.discovery.discover(host).await {
            None => {
                error!("{host}: {}: no management port open", FailureKind::TransportUnavailable);
                SessionOutcome::Failed {
                    kind: FailureKind::TransportUnavailable,
                    message: "neither SSH nor Telnet accepted a connection".to_string(),
                    partial_transcript: None,
                }
            }
            Some(transport) => {
                info!("{host}: using {transport}");
                match self.deploy(record, transport, payload, store).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let kind = FailureKind::classify(&e);
                        error!("{host}: {kind}: {e}");
                        let partial_transcript = e.partial_transcript().map(str::to_string);
                        if let Some(partial) = &partial_transcript {
                            warn!("{host}: push interrupted, device output so far:\n{partial}");
                        }
                        SessionOutcome::Failed {
                            kind,
                            message: e.to_string(),
                            partial_transcript,
                        }
                    }
                }
            }
        };

        HostReport {
            host: host.clone(),
            outcome,
        }
    }

    async fn deploy(
        &self,
        record: &InventoryRecord,
        transport: TransportKind,
        payload: &Payload,
        store: &ArtifactStore,
    ) -> Result<SessionOutcome> {
        let host = &record.host;
        let mut session = self.connector.open(record, transport).await?;

        let transcript = match session.push_config(payload).await {
            Ok(transcript) => transcript,
            Err(e) => {
                if let Err(close_err) = session.close().await {
                    debug!("{host}: close after failed push: {close_err}");
                }
                return Err(e);
            }
        };

        let name = match self.config.naming {
            NamingPolicy::HostIdentifier => host.clone(),
            NamingPolicy::DeviceIdentity => session.describe_identity().await,
        };

        if let Err(e) = session.close().await {
            warn!("{host}: close failed: {e}");
        }

        let artifact = store.write_transcript(&name, host, &transcript).await?;
        info!("{host}: transcript written to {}", artifact.display());

        Ok(SessionOutcome::Pushed {
            transport,
            transcript,
            artifact,
        })
    }
}
