//! Authenticated device sessions.
//!
//! A session walks a fixed lifecycle:
//!
//! ```text
//! Unauthenticated ──► Authenticated ──► Privileged ──► ConfigPushed ──► Closed
//! ```
//!
//! Transitions only move forward. A failure at any step ends the session
//! for that host; nothing is retried.

mod builder;
mod connector;
mod ios;
mod response;

pub use builder::SessionBuilder;
pub use connector::IosConnector;
pub use ios::{Session, parse_identity};
pub use response::Response;

use std::future::Future;

use crate::error::Result;
use crate::inventory::InventoryRecord;
use crate::payload::Payload;
use crate::transport::TransportKind;

/// Lifecycle state of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Built but not yet logged in.
    Unauthenticated,

    /// Logged in at user EXEC level.
    Authenticated,

    /// Escalated to privileged EXEC with `enable`.
    Privileged,

    /// Configuration payload has been sent.
    ConfigPushed,

    /// Transport closed.
    Closed,
}

/// Operations available on an open device session.
pub trait DeviceSession: Send {
    /// Send the configuration payload and return the raw transcript.
    ///
    /// The transcript holds everything the device printed, including the
    /// echoed commands and any per-line error messages. No command is
    /// checked for success.
    fn push_config(&mut self, payload: &Payload) -> impl Future<Output = Result<String>> + Send;

    /// Name the device reports for itself.
    ///
    /// Falls back to the host identifier when the device output cannot be
    /// parsed; this never fails.
    fn describe_identity(&mut self) -> impl Future<Output = String> + Send;

    /// Close the session and its transport.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens authenticated, privileged sessions.
///
/// This is the `Open` step of a device interaction: connect over the chosen
/// transport, log in, and escalate. Rejected credentials surface as an error
/// for which [`Error::is_auth_failure`](crate::Error::is_auth_failure) is true.
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: DeviceSession;

    /// Open a session to `record.host` over `transport`.
    fn open(
        &self,
        record: &InventoryRecord,
        transport: TransportKind,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}
