//! Telnet transport over a plain TCP stream.
//!
//! The client refuses every option the server offers or requests, which
//! leaves the connection in NVT mode with the device doing its own echo.
//! That is enough for a line-oriented CLI.

use log::{debug, trace};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::config::TransportConfig;
use crate::error::{Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Option(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Incremental Telnet protocol decoder.
///
/// Separates application data from IAC command sequences. Sequences may be
/// split across reads; the decoder carries its state between calls.
#[derive(Debug)]
pub struct TelnetCodec {
    state: State,
}

/// Output of one [`TelnetCodec::decode`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Application data with every Telnet command removed.
    pub data: Vec<u8>,

    /// Negotiation replies that must be written back to the server.
    pub replies: Vec<u8>,
}

impl TelnetCodec {
    pub fn new() -> Self {
        Self { state: State::Data }
    }

    /// Decode raw bytes received from the server.
    pub fn decode(&mut self, input: &[u8]) -> Decoded {
        let mut out = Decoded::default();

        for &byte in input {
            self.state = match self.state {
                State::Data => match byte {
                    IAC => State::Iac,
                    // NVT pads a bare CR with NUL
                    0 => State::Data,
                    _ => {
                        out.data.push(byte);
                        State::Data
                    }
                },
                State::Iac => match byte {
                    IAC => {
                        out.data.push(IAC);
                        State::Data
                    }
                    DO | DONT | WILL | WONT => State::Option(byte),
                    SB => State::Subnegotiation,
                    _ => State::Data,
                },
                State::Option(command) => {
                    match command {
                        DO => out.replies.extend_from_slice(&[IAC, WONT, byte]),
                        WILL => out.replies.extend_from_slice(&[IAC, DONT, byte]),
                        _ => {}
                    }
                    trace!("telnet option command {} {}", command, byte);
                    State::Data
                }
                State::Subnegotiation => match byte {
                    IAC => State::SubnegotiationIac,
                    _ => State::Subnegotiation,
                },
                State::SubnegotiationIac => match byte {
                    SE => State::Data,
                    _ => State::Subnegotiation,
                },
            };
        }

        out
    }

    /// Escape application data for sending (doubles every IAC byte).
    pub fn encode(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for &byte in data {
            if byte == IAC {
                out.push(IAC);
            }
            out.push(byte);
        }
        out
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Telnet transport wrapping a TCP stream.
pub struct TelnetTransport {
    stream: TcpStream,
    codec: TelnetCodec,
}

impl TelnetTransport {
    /// Open the TCP connection. No login is performed here.
    pub async fn connect(config: &TransportConfig) -> Result<Self> {
        debug!("Opening Telnet connection to {}", config.socket_addr());

        let stream = tokio::time::timeout(
            config.timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        stream.set_nodelay(true).map_err(TransportError::Io)?;

        Ok(Self {
            stream,
            codec: TelnetCodec::new(),
        })
    }

    /// Write application data, escaping IAC bytes.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(&TelnetCodec::encode(data))
            .await
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Read the next chunk of application data; `None` once the server
    /// closes the connection.
    ///
    /// Negotiation-only reads are answered and skipped.
    pub async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = self
                .stream
                .read(&mut buf)
                .await
                .map_err(TransportError::Io)?;
            if n == 0 {
                return Ok(None);
            }

            let decoded = self.codec.decode(&buf[..n]);
            if !decoded.replies.is_empty() {
                self.stream
                    .write_all(&decoded.replies)
                    .await
                    .map_err(TransportError::Io)?;
            }
            if !decoded.data.is_empty() {
                return Ok(Some(decoded.data));
            }
        }
    }

    /// Shut down the TCP stream.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_data_passes_through() {
        let mut codec = TelnetCodec::new();
        let decoded = codec.decode(b"Username: ");
        assert_eq!(decoded.data, b"Username: ");
        assert!(decoded.replies.is_empty());
    }

    #[test]
    fn test_refuses_options() {
        let mut codec = TelnetCodec::new();
        // DO TERMINAL-TYPE, WILL ECHO, then data
        let decoded = codec.decode(&[IAC, DO, 24, IAC, WILL, 1, b'R', b'1', b'>']);
        assert_eq!(decoded.data, b"R1>");
        assert_eq!(decoded.replies, vec![IAC, WONT, 24, IAC, DONT, 1]);
    }

    #[test]
    fn test_negative_commands_are_not_answered() {
        let mut codec = TelnetCodec::new();
        let decoded = codec.decode(&[IAC, DONT, 3, IAC, WONT, 3]);
        assert!(decoded.data.is_empty());
        assert!(decoded.replies.is_empty());
    }

    #[test]
    fn test_sequence_split_across_reads() {
        let mut codec = TelnetCodec::new();
        let first = codec.decode(&[b'a', IAC]);
        assert_eq!(first.data, b"a");
        let second = codec.decode(&[DO]);
        assert!(second.replies.is_empty());
        let third = codec.decode(&[31, b'b']);
        assert_eq!(third.data, b"b");
        assert_eq!(third.replies, vec![IAC, WONT, 31]);
    }

    #[test]
    fn test_subnegotiation_is_skipped() {
        let mut codec = TelnetCodec::new();
        let decoded = codec.decode(&[IAC, SB, 24, 1, IAC, SE, b'o', b'k']);
        assert_eq!(decoded.data, b"ok");
    }

    #[test]
    fn test_escaped_iac_and_nul_padding() {
        let mut codec = TelnetCodec::new();
        let decoded = codec.decode(&[b'x', IAC, IAC, b'\r', 0, b'\n']);
        assert_eq!(decoded.data, vec![b'x', IAC, b'\r', b'\n']);
        assert_eq!(TelnetCodec::encode(&[IAC, b'y']), vec![IAC, IAC, b'y']);
    }
}
