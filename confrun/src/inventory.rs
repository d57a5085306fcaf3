//! Device inventory loaded from CSV.
//!
//! Each row names one device and the credentials used to reach it. The
//! column headers are fixed and case-sensitive:
//!
//! ```text
//! IP,Username,Password,Enable Secret
//! 10.0.0.1,admin,password,enable_secret_password
//! ```

use std::io;
use std::path::Path;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::InventoryError;

/// Column headers every inventory must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["IP", "Username", "Password", "Enable Secret"];

#[derive(Debug, Deserialize)]
struct InventoryRow {
    #[serde(rename = "IP")]
    host: String,

    #[serde(rename = "Username")]
    username: String,

    #[serde(rename = "Password")]
    password: String,

    #[serde(rename = "Enable Secret")]
    secret: String,
}

/// One device and its credentials.
#[derive(Debug)]
pub struct InventoryRecord {
    /// IP address or DNS name; unique within the inventory.
    pub host: String,

    /// Login username.
    pub username: String,

    /// Login password.
    pub password: SecretString,

    /// Enable secret for privileged EXEC.
    pub secret: SecretString,
}

impl InventoryRecord {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            secret: SecretString::from(secret.into()),
        }
    }
}

/// Read-only view of the inventory, in file order, keyed by host.
#[derive(Debug, Default)]
pub struct Inventory {
    records: IndexMap<String, InventoryRecord>,
}

impl Inventory {
    /// Load an inventory CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .from_path(path)
            .map_err(|source| InventoryError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_csv(reader)
    }

    /// Load an inventory from any CSV source.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, InventoryError> {
        Self::from_csv(csv::ReaderBuilder::new().from_reader(reader))
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, InventoryError> {
        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(InventoryError::MissingColumn { column });
            }
        }

        let mut records = IndexMap::new();
        for (index, row) in reader.deserialize::<InventoryRow>().enumerate() {
            let row = row?;
            let host = row.host.trim().to_string();
            if host.is_empty() {
                return Err(InventoryError::EmptyField {
                    record: index + 1,
                    column: "IP",
                });
            }
            if records.contains_key(&host) {
                return Err(InventoryError::DuplicateHost { host });
            }

            let record = InventoryRecord::new(host.clone(), row.username, row.password, row.secret);
            records.insert(host, record);
        }

        Ok(Self { records })
    }

    /// Build an inventory from records already in memory.
    pub fn from_records(records: impl IntoIterator<Item = InventoryRecord>) -> Result<Self, InventoryError> {
        let mut map = IndexMap::new();
        for record in records {
            if map.contains_key(&record.host) {
                return Err(InventoryError::DuplicateHost { host: record.host });
            }
            map.insert(record.host.clone(), record);
        }
        Ok(Self { records: map })
    }

    /// Look up a host's record.
    ///
    /// A miss means the caller asked for a host that never came from this
    /// inventory, which is reported as [`InventoryError::UnknownHost`].
    pub fn get(&self, host: &str) -> Result<&InventoryRecord, InventoryError> {
        self.records.get(host).ok_or_else(|| InventoryError::UnknownHost {
            host: host.to_string(),
        })
    }

    /// Host identifiers in file order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
