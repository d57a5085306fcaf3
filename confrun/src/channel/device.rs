//! Prompt-driven channel over a device transport.

use std::time::Duration;

use log::trace;
use regex::bytes::{Regex, RegexBuilder};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};
use crate::transport::{Transport, TransportKind};

/// Default number of trailing bytes searched for a prompt.
const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Interactive channel to a device CLI.
///
/// Owns the transport for the lifetime of the session. Reads accumulate
/// into a [`PatternBuffer`] until the requested pattern appears at its tail;
/// the accumulated text is then handed back verbatim.
pub struct DeviceChannel {
    transport: Transport,
    buffer: PatternBuffer,
    timeout: Duration,
}

impl DeviceChannel {
    /// Wrap a connected transport. `timeout` bounds every prompt wait.
    pub fn new(transport: Transport, timeout: Duration) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::new(DEFAULT_SEARCH_DEPTH),
            timeout,
        }
    }

    /// The protocol underneath this channel.
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Send one line of input followed by the transport's line terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        trace!("send: {:?}", line);
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(self.kind().line_ending().as_bytes());
        self.transport.write(&data).await
    }

    /// Read until `pattern` matches the tail of the output, using the
    /// default timeout.
    pub async fn read_until(&mut self, pattern: &Regex) -> Result<String> {
        self.read_until_timeout(pattern, self.timeout).await
    }

    /// Read until `pattern` matches the tail of the output.
    ///
    /// Returns everything read since the previous call, including the
    /// matched text. Exceeding `timeout` is a [`ChannelError::PatternTimeout`].
    pub async fn read_until_timeout(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;

        while !self.buffer.tail_contains(pattern) {
            self.fill(deadline, timeout).await?;
        }

        Ok(self.buffer.take_string())
    }

    /// Read until the device has echoed `line` back, using the default
    /// timeout.
    ///
    /// Returns the output up to and including the echo. Whatever follows
    /// stays buffered for the next read. Lines that never produce a CLI
    /// prompt, such as banner text, still echo, so this is what a
    /// configuration push waits on between lines.
    pub async fn read_until_echo(&mut self, line: &str) -> Result<String> {
        let echo = echo_pattern(line)?;
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(end) = self.buffer.search_full(&echo).map(|m| m.end()) {
                return Ok(self.buffer.take_through(end));
            }
            self.fill(deadline, self.timeout).await?;
        }
    }

    /// Read one chunk into the buffer.
    async fn fill(&mut self, deadline: Instant, timeout: Duration) -> Result<()> {
        let chunk = tokio::time::timeout_at(deadline, self.transport.read_chunk())
            .await
            .map_err(|_| ChannelError::PatternTimeout(timeout))?;

        match chunk? {
            Some(data) => {
                trace!("recv: {:?}", String::from_utf8_lossy(&data));
                self.buffer.extend(&data);
                Ok(())
            }
            None => Err(ChannelError::Closed.into()),
        }
    }

    /// Hand back output read but not yet returned by any read.
    pub fn take_buffered(&mut self) -> String {
        self.buffer.take_string()
    }

    /// Collect whatever output arrives within `window`.
    ///
    /// Used to let the device flush trailing output. Running out of time is
    /// the normal way this returns; a closed stream just ends it early.
    pub async fn drain(&mut self, window: Duration) -> Result<String> {
        let deadline = Instant::now() + window;

        loop {
            match tokio::time::timeout_at(deadline, self.transport.read_chunk()).await {
                Ok(Ok(Some(data))) => self.buffer.extend(&data),
                Ok(Ok(None)) | Err(_) => break,
                Ok(Err(e)) => return Err(e),
            }
        }

        Ok(self.buffer.take_string())
    }

    /// Close the underlying transport.
    pub async fn close(self) -> Result<()> {
        self.transport.close().await
    }
}

/// Pattern for the echo of `line`: the line's text at the start of a line
/// or right after a prompt, ending the line. A blank line echoes as a bare
/// line break.
fn echo_pattern(line: &str) -> Result<Regex> {
    let text = line.trim();
    let pattern = if text.is_empty() {
        r"\n".to_string()
    } else {
        format!(r"(?:^|[#>])[ \t]*{}[ \t]*$", regex::escape(text))
    };

    let echo = RegexBuilder::new(&pattern)
        .multi_line(true)
        .build()
        .map_err(ChannelError::InvalidPattern)?;
    Ok(echo)
}
