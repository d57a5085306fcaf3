//! Result artifacts written to the output directory.
//!
//! A run produces at most one `downDevices_<ts>.txt` (one unreachable host
//! per line) and one `<name>_<ts>.txt` transcript per configured device.
//! `<ts>` is fixed when the run starts so every file of a run shares it.

use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::ArtifactError;

/// Format of the run timestamp embedded in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Current local time formatted for artifact names.
pub fn run_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`.
///
/// Names come from the inventory or from the device itself, so path
/// separators must never reach the filesystem. A name made only of dots
/// is replaced as well.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}

/// Writer for one run's artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    timestamp: String,
}

impl ArtifactStore {
    /// Open the output directory, creating it if needed.
    pub async fn create(dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| ArtifactError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        Ok(Self {
            dir,
            timestamp: timestamp.into(),
        })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of this run's down-devices list.
    pub fn down_path(&self) -> PathBuf {
        self.dir.join(format!("downDevices_{}.txt", self.timestamp))
    }

    /// Append an unreachable host to the down-devices list.
    pub async fn append_down(&self, host: &str) -> Result<(), ArtifactError> {
        let path = self.down_path();
        let result = async {
            let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
            file.write_all(format!("{host}\n").as_bytes()).await?;
            file.flush().await
        }
        .await;

        result.map_err(|source| ArtifactError::Write { path, source })
    }

    /// Write a device transcript verbatim and return its path.
    ///
    /// Existing files are never overwritten. When `<name>_<ts>.txt` is
    /// already taken (two devices reporting the same identity within one
    /// run), the host is folded into the name, then a counter.
    pub async fn write_transcript(
        &self,
        name: &str,
        host: &str,
        transcript: &str,
    ) -> Result<PathBuf, ArtifactError> {
        let name = sanitize(name);
        let host = sanitize(host);

        let mut candidates = vec![self.transcript_path(&name)];
        if name != host {
            candidates.push(self.transcript_path(&format!("{name}_{host}")));
        }

        let mut attempt = 0usize;
        loop {
            let path = match candidates.get(attempt) {
                Some(path) => path.clone(),
                None => self.transcript_path(&format!("{name}_{host}_{attempt}")),
            };
            attempt += 1;

            match write_new(&path, transcript.as_bytes()).await {
                Ok(()) => return Ok(path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying another name", path.display());
                }
                Err(source) => return Err(ArtifactError::Write { path, source }),
            }
        }
    }

    fn transcript_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}_{}.txt", self.timestamp))
    }
}

async fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path).await?;
    file.write_all(contents).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("10.0.0.1"), "10.0.0.1");
        assert_eq!(sanitize("core-sw01_lab"), "core-sw01_lab");
        assert_eq!(sanitize("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize("fe80::1"), "fe80__1");
        assert_eq!(sanitize(".."), "__");
        assert_eq!(sanitize(""), "_");
    }

    #[test]
    fn test_run_timestamp_shape() {
        let ts = run_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn test_create_makes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("result-config");
        let store = ArtifactStore::create(&dir, "2024-01-01_00-00").await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[tokio::test]
    async fn test_append_down() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(tmp.path(), "2024-01-01_00-00").await.unwrap();

        store.append_down("10.0.0.1").await.unwrap();
        store.append_down("10.0.0.7").await.unwrap();

        let path = tmp.path().join("downDevices_2024-01-01_00-00.txt");
        assert_eq!(store.down_path(), path);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "10.0.0.1\n10.0.0.7\n");
    }

    #[tokio::test]
    async fn test_transcript_written_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(tmp.path(), "2024-01-01_00-00").await.unwrap();

        let transcript = "R1(config)#interface Gi0/1\r\n% Invalid input\n\u{7}R1(config)#";
        let path = store.write_transcript("R1", "10.0.0.1", transcript).await.unwrap();

        assert_eq!(path, tmp.path().join("R1_2024-01-01_00-00.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), transcript.as_bytes());
    }

    #[tokio::test]
    async fn test_transcript_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(tmp.path(), "ts").await.unwrap();

        let first = store.write_transcript("Router", "10.0.0.1", "one").await.unwrap();
        let second = store.write_transcript("Router", "10.0.0.2", "two").await.unwrap();
        let third = store.write_transcript("Router", "10.0.0.2", "three").await.unwrap();

        assert_eq!(first, tmp.path().join("Router_ts.txt"));
        assert_eq!(second, tmp.path().join("Router_10.0.0.2_ts.txt"));
        assert_eq!(third, tmp.path().join("Router_10.0.0.2_2_ts.txt"));
        assert_eq!(std::fs::read_to_string(first).unwrap(), "one");
        assert_eq!(std::fs::read_to_string(third).unwrap(), "three");
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::create(tmp.path().join("gone"), "ts").await.unwrap();
        std::fs::remove_dir(tmp.path().join("gone")).unwrap();

        let err = store.write_transcript("R1", "10.0.0.1", "x").await.unwrap_err();
        assert!(matches!(err, ArtifactError::Write { .. }));
    }
}
