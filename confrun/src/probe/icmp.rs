//! ICMP echo probe using the system `ping` binary.
//!
//! Raw ICMP sockets need elevated privileges on most platforms, while the
//! `ping` utility is installed setuid or with the right capabilities. One
//! echo request is sent and the exit status decides the outcome.

use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;

use super::{Reachability, ReachabilityProbe};

/// Slack on top of the probe timeout before the child is killed.
const PROCESS_GRACE: Duration = Duration::from_secs(1);

/// Reachability probe sending a single ICMP echo request.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    timeout: Duration,
}

impl IcmpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ReachabilityProbe for IcmpProber {
    async fn probe(&self, host: &str) -> Reachability {
        // Would be parsed as an option by ping.
        if host.is_empty() || host.starts_with('-') {
            warn!("{host:?}: not a valid probe target");
            return Reachability::Down;
        }

        let mut cmd = Command::new("ping");
        cmd.args(ping_args(host, self.timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(self.timeout + PROCESS_GRACE, cmd.status()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!("{host}: failed to run ping: {e}");
                return Reachability::Down;
            }
            Err(_) => {
                debug!("{host}: ping did not exit within {:?}", self.timeout + PROCESS_GRACE);
                return Reachability::Down;
            }
        };

        if status.success() {
            Reachability::Up
        } else {
            debug!("{host}: ping exited with {status}");
            Reachability::Down
        }
    }
}

/// Arguments for a single echo request bounded by `timeout`.
#[cfg(target_os = "windows")]
pub fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1);
    vec![
        "-n".to_string(),
        "1".to_string(),
        "-w".to_string(),
        millis.to_string(),
        host.to_string(),
    ]
}

/// Arguments for a single echo request bounded by `timeout`.
#[cfg(any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"))]
pub fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-t".to_string(),
        whole_seconds(timeout).to_string(),
        host.to_string(),
    ]
}

/// Arguments for a single echo request bounded by `timeout`.
#[cfg(not(any(
    target_os = "windows",
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd"
)))]
pub fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        whole_seconds(timeout).to_string(),
        host.to_string(),
    ]
}

/// Round up to whole seconds, at least one.
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn whole_seconds(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds() {
        assert_eq!(whole_seconds(Duration::from_secs(1)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::from_millis(200)), 1);
        assert_eq!(whole_seconds(Duration::ZERO), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_ping_args_linux() {
        let args = ping_args("10.0.0.1", Duration::from_secs(1));
        assert_eq!(args, vec!["-c", "1", "-W", "1", "10.0.0.1"]);
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_ping_args_windows() {
        let args = ping_args("10.0.0.1", Duration::from_secs(1));
        assert_eq!(args, vec!["-n", "1", "-w", "1000", "10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_option_like_host_is_down() {
        let prober = IcmpProber::default();
        assert_eq!(prober.probe("-f").await, Reachability::Down);
        assert_eq!(prober.probe("").await, Reachability::Down);
    }
}
