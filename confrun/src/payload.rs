//! Configuration payload: the commands pushed to every device.

use std::path::Path;

use crate::error::PayloadError;

/// Ordered list of configuration-mode commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    commands: Vec<String>,
}

impl Payload {
    /// Read a payload file.
    ///
    /// A missing, unreadable or command-less file is a load error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PayloadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PayloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let payload = Self::parse(&text);
        if payload.is_empty() {
            return Err(PayloadError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(payload)
    }

    /// Parse payload text: one command per line, in file order.
    ///
    /// Line endings are trimmed and blank lines dropped; everything else,
    /// leading indentation included, is kept verbatim.
    pub fn parse(text: &str) -> Self {
        let commands = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self { commands }
    }

    /// Commands in send order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the payload holds no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_order_and_indentation() {
        let payload = Payload::parse("interface Gi0/1\r\n description uplink\r\n\r\n no shutdown\n");
        let commands: Vec<_> = payload.commands().collect();
        assert_eq!(
            commands,
            vec!["interface Gi0/1", " description uplink", " no shutdown"]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = Payload::load("/nonexistent/confrun/payload.txt").unwrap_err();
        assert!(matches!(err, PayloadError::Read { .. }));
    }

    #[test]
    fn test_load_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "\n   \n").unwrap();

        let err = Payload::load(&path).unwrap_err();
        assert!(matches!(err, PayloadError::Empty { .. }));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.txt");
        std::fs::write(&path, "ntp server 10.0.0.5\nlogging host 10.0.0.6\n").unwrap();

        let payload = Payload::load(&path).unwrap();
        assert_eq!(payload.len(), 2);
    }
}
