//! Connector producing IOS sessions from inventory records.

use log::debug;
use secrecy::ExposeSecret;

use super::builder::SessionBuilder;
use super::ios::Session;
use super::Connector;
use crate::config::SessionOptions;
use crate::error::Result;
use crate::inventory::InventoryRecord;
use crate::transport::TransportKind;

/// Opens [`Session`]s with the run's connection settings.
#[derive(Debug, Clone, Default)]
pub struct IosConnector {
    options: SessionOptions,
}

impl IosConnector {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    /// Builder preloaded with the record's credentials and the run settings.
    pub fn builder(&self, record: &InventoryRecord, transport: TransportKind) -> SessionBuilder {
        let builder = SessionBuilder::new(&record.host)
            .transport(transport)
            .port(self.options.port_for(transport))
            .username(&record.username)
            .password(record.password.expose_secret())
            .secret(record.secret.expose_secret())
            .connect_timeout(self.options.connect_timeout)
            .timeout(self.options.command_timeout)
            .settle_delay(self.options.settle_delay)
            .host_key_verification(self.options.host_key_verification);

        match &self.options.known_hosts_path {
            Some(path) => builder.known_hosts_path(path),
            None => builder,
        }
    }
}

impl Connector for IosConnector {
    type Session = Session;

    async fn open(&self, record: &InventoryRecord, transport: TransportKind) -> Result<Session> {
        let mut session = self.builder(record, transport).build()?;

        if let Err(e) = session.open().await {
            debug!("{}: open failed in state {:?}", record.host, session.state());
            session.close().await?;
            return Err(e);
        }

        Ok(session)
    }
}
