//! Session implementation for the IOS command line.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use super::response::Response;
use super::{DeviceSession, SessionState};
use crate::channel::DeviceChannel;
use crate::error::{ChannelError, DriverError, Error, Result, TransportError};
use crate::payload::Payload;
use crate::platform::{Platform, PrivilegeLevel, last_line};
use crate::transport::{Transport, TransportConfig, TransportKind};

/// An interactive session with one device.
///
/// Built with [`SessionBuilder`](super::SessionBuilder). Owns its transport
/// exclusively from [`open`](Self::open) until [`close`](Self::close).
pub struct Session {
    /// Connection settings, including the login credentials.
    transport_config: TransportConfig,

    /// Secret answered at the `enable` password prompt.
    secret: SecretString,

    /// CLI grammar of the device.
    platform: Platform,

    /// Open channel (None until opened and after close).
    channel: Option<DeviceChannel>,

    /// Lifecycle state.
    state: SessionState,

    /// Privilege level of the last prompt seen.
    privilege: Option<PrivilegeLevel>,

    /// Timeout for login, escalation and each command.
    timeout: Duration,

    /// Quiet period collected after the configuration push.
    settle_delay: Duration,
}

impl Session {
    pub(crate) fn new(
        transport_config: TransportConfig,
        secret: SecretString,
        platform: Platform,
        timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            transport_config,
            secret,
            platform,
            channel: None,
            state: SessionState::Unauthenticated,
            privilege: None,
            timeout,
            settle_delay,
        }
    }

    /// Host this session talks to.
    pub fn host(&self) -> &str {
        &self.transport_config.host
    }

    /// Port this session connects to.
    pub fn port(&self) -> u16 {
        self.transport_config.port
    }

    /// Transport in use.
    pub fn transport_kind(&self) -> TransportKind {
        self.transport_config.kind
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Privilege level of the last prompt seen.
    pub fn current_privilege(&self) -> Option<PrivilegeLevel> {
        self.privilege
    }

    /// Check if the session holds an open channel.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(DriverError::InvalidState {
                expected,
                found: self.state,
            }
            .into());
        }
        Ok(())
    }

    /// Connect, log in and escalate to privileged EXEC.
    ///
    /// Credentials rejected at login surface as
    /// [`TransportError::AuthenticationFailed`]; a rejected enable secret as
    /// [`DriverError::EnableFailed`].
    pub async fn open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        self.expect_state(SessionState::Unauthenticated)?;

        let transport = Transport::connect(&self.transport_config).await?;
        let channel = self.channel.insert(DeviceChannel::new(transport, self.timeout));

        let prompt = if self.transport_config.kind.authenticates_in_band() {
            login(
                channel,
                &self.platform,
                &self.transport_config.username,
                &self.transport_config.password,
            )
            .await?
        } else {
            let output = channel.read_until(self.platform.prompt_pattern()).await?;
            last_line(&output).to_string()
        };
        self.privilege = self.platform.determine_level(&prompt);
        self.state = SessionState::Authenticated;
        debug!(
            "{}: logged in at {:?}",
            self.transport_config.host, self.privilege
        );

        let level = escalate(
            channel,
            &self.platform,
            &self.secret,
            &self.transport_config.host,
            self.privilege,
        )
        .await?;
        self.privilege = Some(level);
        self.state = SessionState::Privileged;

        for command in self.platform.on_open_commands.clone() {
            self.send_command(&command).await?;
        }

        info!(
            "{}: session open over {} on port {}",
            self.host(),
            self.transport_kind(),
            self.port()
        );
        Ok(())
    }

    /// Send a command and wait for the prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let start = Instant::now();

        channel.send_line(command).await?;
        let raw = channel.read_until(self.platform.prompt_pattern()).await?;

        let prompt = last_line(&raw).to_string();
        if let Some(level) = self.platform.determine_level(&prompt) {
            self.privilege = Some(level);
        }

        Ok(Response::new(command, raw, prompt, start.elapsed()))
    }

    /// Push the configuration payload and return the full transcript.
    ///
    /// Enters configuration mode and sends every payload line in order,
    /// waiting for each to be echoed before the next. Banner text and other
    /// lines that do not bring back a prompt go through the same way. Leaves
    /// with `end`, then keeps collecting output for the settle delay.
    ///
    /// A failure part-way through leaves the device as it is and comes back
    /// as [`DriverError::PushInterrupted`] carrying the output so far.
    pub async fn push_config(&mut self, payload: &Payload) -> Result<String> {
        self.expect_state(SessionState::Privileged)?;

        let mut transcript = String::new();
        match self.send_payload(payload, &mut transcript).await {
            Ok(()) => {
                self.state = SessionState::ConfigPushed;
                self.privilege = self.platform.determine_level(last_line(&transcript));
                debug!(
                    "{}: pushed {} commands, {} bytes of output",
                    self.host(),
                    payload.len(),
                    transcript.len()
                );
                Ok(transcript)
            }
            Err(e) => {
                if let Some(channel) = self.channel.as_mut() {
                    transcript.push_str(&channel.take_buffered());
                }
                Err(DriverError::PushInterrupted {
                    transcript,
                    source: Box::new(e),
                }
                .into())
            }
        }
    }

    async fn send_payload(&mut self, payload: &Payload, transcript: &mut String) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let platform = &self.platform;
        let prompt_pattern = platform.prompt_pattern();

        let config = platform
            .level(PrivilegeLevel::Configuration)
            .ok_or_else(|| DriverError::InvalidConfig {
                message: format!("platform {} has no configuration mode", platform.name),
            })?;
        let enter = config.escalate_command.as_deref().unwrap_or("configure terminal");
        let exit = config.deescalate_command.as_deref().unwrap_or("end");

        channel.send_line(enter).await?;
        let output = channel.read_until(prompt_pattern).await?;
        transcript.push_str(&output);

        let prompt = last_line(&output);
        if platform.determine_level(prompt) != Some(PrivilegeLevel::Configuration) {
            return Err(DriverError::UnexpectedPrompt {
                prompt: prompt.to_string(),
            }
            .into());
        }

        for line in payload.commands() {
            channel.send_line(line).await?;
            transcript.push_str(&channel.read_until_echo(line).await?);
        }

        channel.send_line(exit).await?;
        transcript.push_str(&channel.read_until_echo(exit).await?);
        transcript.push_str(&channel.read_until(prompt_pattern).await?);

        transcript.push_str(&channel.drain(self.settle_delay).await?);
        Ok(())
    }

    /// Name the device reports for itself, or the host identifier when the
    /// identity command output cannot be used.
    pub async fn describe_identity(&mut self) -> String {
        if self.state < SessionState::Privileged || self.state == SessionState::Closed {
            warn!("{}: cannot query identity in state {:?}", self.host(), self.state);
            return self.host().to_string();
        }

        let command = self.platform.identity_command.clone();
        match self.send_command(&command).await {
            Ok(response) => match parse_identity(&response.result) {
                Some(identity) => identity,
                None => {
                    warn!(
                        "{}: could not parse identity from '{}', using host identifier",
                        self.host(),
                        response.result.trim()
                    );
                    self.host().to_string()
                }
            },
            Err(e) => {
                warn!("{}: identity query failed ({}), using host identifier", self.host(), e);
                self.host().to_string()
            }
        }
    }

    /// Log out and close the transport.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.send_line("exit").await {
                debug!("{}: exit not sent: {}", self.host(), e);
            }
            if let Err(e) = channel.close().await {
                debug!("{}: transport close: {}", self.host(), e);
            }
        }
        self.state = SessionState::Closed;
        Ok(())
    }
}

impl DeviceSession for Session {
    async fn push_config(&mut self, payload: &Payload) -> Result<String> {
        Session::push_config(self, payload).await
    }

    async fn describe_identity(&mut self) -> String {
        Session::describe_identity(self).await
    }

    async fn close(&mut self) -> Result<()> {
        Session::close(self).await
    }
}

/// Answer in-band username/password prompts until a CLI prompt shows up.
///
/// Returns the CLI prompt. Being asked for the same credential twice means
/// the device rejected it.
async fn login(
    channel: &mut DeviceChannel,
    platform: &Platform,
    username: &str,
    password: &SecretString,
) -> Result<String> {
    let rejected = || -> Error {
        TransportError::AuthenticationFailed {
            user: username.to_string(),
        }
        .into()
    };

    let mut sent_username = false;
    let mut sent_password = false;
    let mut output = channel.read_until(platform.login_pattern()).await?;

    loop {
        let prompt = last_line(&output);
        if platform.determine_level(prompt).is_some() {
            return Ok(prompt.to_string());
        }

        if platform.login.username.is_match(prompt.as_bytes()) {
            if sent_username {
                return Err(rejected());
            }
            channel.send_line(username).await?;
            sent_username = true;
        } else if platform.login.password.is_match(prompt.as_bytes()) {
            if sent_password {
                return Err(rejected());
            }
            channel.send_line(password.expose_secret()).await?;
            sent_password = true;
        } else {
            return Err(DriverError::UnexpectedPrompt {
                prompt: prompt.to_string(),
            }
            .into());
        }

        output = match channel.read_until(platform.login_pattern()).await {
            Err(Error::Channel(ChannelError::Closed)) if sent_password => return Err(rejected()),
            other => other?,
        };
    }
}

/// Enter privileged EXEC from the current level with `enable` + secret.
async fn escalate(
    channel: &mut DeviceChannel,
    platform: &Platform,
    secret: &SecretString,
    host: &str,
    current: Option<PrivilegeLevel>,
) -> Result<PrivilegeLevel> {
    if current == Some(PrivilegeLevel::PrivilegeExec) {
        return Ok(PrivilegeLevel::PrivilegeExec);
    }

    let definition = platform
        .level(PrivilegeLevel::PrivilegeExec)
        .ok_or_else(|| DriverError::InvalidConfig {
            message: format!("platform {} has no privileged mode", platform.name),
        })?;
    let command = definition.escalate_command.as_deref().unwrap_or("enable");
    let rejected = || -> Error {
        DriverError::EnableFailed {
            host: host.to_string(),
        }
        .into()
    };

    let pattern = platform.escalate_pattern();
    channel.send_line(command).await?;
    let mut output = channel.read_until(&pattern).await?;

    let asks_secret = definition
        .escalate_prompt
        .as_ref()
        .is_some_and(|p| p.is_match(last_line(&output).as_bytes()));
    if asks_secret {
        channel.send_line(secret.expose_secret()).await?;
        output = match channel.read_until(&pattern).await {
            Err(Error::Channel(ChannelError::Closed)) => return Err(rejected()),
            other => other?,
        };
    }

    match platform.determine_level(last_line(&output)) {
        Some(PrivilegeLevel::PrivilegeExec) => Ok(PrivilegeLevel::PrivilegeExec),
        _ => Err(rejected()),
    }
}

/// Extract the device name from the identity command output.
///
/// The name is the first token of the first non-empty line, as in
/// `R1 uptime is 2 weeks, 3 days`. Error lines and tokens that cannot be a
/// hostname yield `None`.
pub fn parse_identity(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    if line.starts_with('%') || line.starts_with('^') {
        return None;
    }

    let token = line.split_whitespace().next()?;
    let valid = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    valid.then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionBuilder;
    use crate::testing::FakeDevice;

    fn telnet_session(port: u16, password: &str, secret: &str) -> Session {
        SessionBuilder::new("127.0.0.1")
            .transport(TransportKind::Telnet)
            .port(port)
            .username("admin")
            .password(password)
            .secret(secret)
            .timeout(Duration::from_secs(5))
            .settle_delay(Duration::from_millis(50))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_identity() {
        assert_eq!(
            parse_identity("R1 uptime is 2 weeks, 3 days, 4 hours").as_deref(),
            Some("R1")
        );
        assert_eq!(
            parse_identity("\n  core-sw01.lab uptime is 1 year\n").as_deref(),
            Some("core-sw01.lab")
        );
        assert_eq!(parse_identity(""), None);
        assert_eq!(parse_identity("% Invalid input detected at '^' marker."), None);
        assert_eq!(parse_identity("R1#(weird) uptime"), None);
    }

    #[tokio::test]
    async fn test_open_push_and_identify_over_telnet() {
        let mut device = FakeDevice::new("R1").spawn().await;
        let mut session = telnet_session(device.port, "cisco", "class");

        session.open().await.unwrap();
        assert_eq!(session.state(), SessionState::Privileged);
        assert_eq!(session.current_privilege(), Some(PrivilegeLevel::PrivilegeExec));

        let payload = Payload::parse("hostname EDGE1\nbogus command\n");
        let transcript = session.push_config(&payload).await.unwrap();
        let marker = format!("{}^", " ".repeat(20));
        let expected = [
            "configure terminal",
            "Enter configuration commands, one per line.  End with CNTL/Z.",
            "R1(config)#hostname EDGE1",
            "EDGE1(config)#bogus command",
            marker.as_str(),
            "% Invalid input detected at '^' marker.",
            "",
            "EDGE1(config)#end",
            "EDGE1#",
        ]
        .join("\n");
        assert_eq!(transcript, expected);
        assert_eq!(session.state(), SessionState::ConfigPushed);

        assert_eq!(session.describe_identity().await, "EDGE1");

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.is_open());

        let commands = device.next_session().await;
        assert_eq!(
            commands,
            vec![
                "enable",
                "terminal length 0",
                "terminal width 511",
                "configure terminal",
                "hostname EDGE1",
                "bogus command",
                "end",
                "show version | include uptime",
                "exit",
            ]
        );
    }

    #[tokio::test]
    async fn test_push_banner_lines_without_prompt() {
        let mut device = FakeDevice::new("R1").spawn().await;
        let mut session = telnet_session(device.port, "cisco", "class");
        session.open().await.unwrap();

        let payload = Payload::parse("banner motd ^\nAuthorized access only\n^\nhostname EDGE1\n");
        let transcript = session.push_config(&payload).await.unwrap();

        assert!(transcript.contains("R1(config)#banner motd ^\nEnter TEXT message."));
        assert!(transcript.contains("\nAuthorized access only\n^\nR1(config)#hostname EDGE1\n"));
        assert!(transcript.ends_with("EDGE1(config)#end\nEDGE1#"));
        assert_eq!(session.state(), SessionState::ConfigPushed);

        session.close().await.unwrap();
        let commands = device.next_session().await;
        assert_eq!(
            &commands[3..],
            &[
                "configure terminal",
                "banner motd ^",
                "Authorized access only",
                "^",
                "hostname EDGE1",
                "end",
                "exit",
            ]
        );
    }

    #[tokio::test]
    async fn test_interrupted_push_keeps_partial_transcript() {
        let mut device = FakeDevice::new("R1").hang_up_on("interface Gi0/9").spawn().await;
        let mut session = telnet_session(device.port, "cisco", "class");
        session.open().await.unwrap();

        let payload = Payload::parse("hostname EDGE1\ninterface Gi0/9\n description never sent\n");
        let err = session.push_config(&payload).await.unwrap_err();

        let partial = err.partial_transcript().unwrap();
        assert!(partial.starts_with("configure terminal\n"));
        assert!(partial.ends_with("R1(config)#hostname EDGE1\nEDGE1(config)#"));
        match err {
            Error::Driver(DriverError::PushInterrupted { source, .. }) => {
                assert!(matches!(*source, Error::Channel(ChannelError::Closed)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.state(), SessionState::Privileged);

        session.close().await.unwrap();
        let commands = device.next_session().await;
        assert_eq!(commands.last().map(String::as_str), Some("interface Gi0/9"));
    }

    #[tokio::test]
    async fn test_rejected_login_is_auth_failure() {
        let device = FakeDevice::new("R1").spawn().await;
        let mut session = telnet_session(device.port, "wrong", "class");

        let err = session.open().await.unwrap_err();
        assert!(err.is_auth_failure(), "unexpected error: {err}");
        assert_eq!(session.state(), SessionState::Unauthenticated);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_enable_secret_is_auth_failure() {
        let device = FakeDevice::new("R1").spawn().await;
        let mut session = telnet_session(device.port, "cisco", "wrong");

        let err = session.open().await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::EnableFailed { .. })));
        assert!(err.is_auth_failure());
        assert_eq!(session.state(), SessionState::Authenticated);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_push_requires_privileged_state() {
        let mut session = telnet_session(1, "cisco", "class");
        let payload = Payload::parse("hostname X\n");

        let err = session.push_config(&payload).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::InvalidState {
                expected: SessionState::Privileged,
                found: SessionState::Unauthenticated,
            })
        ));
        assert_eq!(session.describe_identity().await, "127.0.0.1");
    }
}
