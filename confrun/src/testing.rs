//! Loopback Telnet server emulating an IOS command line, for tests.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

const IAC: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Exec,
    Privileged,
    Config,
}

/// Scripted IOS device.
#[derive(Debug, Clone)]
pub(crate) struct FakeDevice {
    hostname: String,
    username: String,
    password: String,
    secret: String,
    hang_up_on: Option<String>,
}

/// Handle on a running [`FakeDevice`].
pub(crate) struct RunningDevice {
    pub port: u16,
    sessions: mpsc::UnboundedReceiver<Vec<String>>,
}

impl RunningDevice {
    /// Commands received over the next connection, once it has ended.
    pub async fn next_session(&mut self) -> Vec<String> {
        self.sessions.recv().await.unwrap_or_default()
    }
}

impl FakeDevice {
    /// Device accepting `admin` / `cisco` with enable secret `class`.
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            username: "admin".to_string(),
            password: "cisco".to_string(),
            secret: "class".to_string(),
            hang_up_on: None,
        }
    }

    /// Drop the connection, without echo, on receiving `command`.
    pub fn hang_up_on(mut self, command: &str) -> Self {
        self.hang_up_on = Some(command.to_string());
        self
    }

    /// Listen on an ephemeral loopback port and serve connections one at a
    /// time until the test ends.
    pub async fn spawn(self) -> RunningDevice {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let commands = self.serve(stream).await.unwrap_or_default();
                if tx.send(commands).is_err() {
                    break;
                }
            }
        });

        RunningDevice { port, sessions: rx }
    }

    async fn serve(&self, stream: TcpStream) -> io::Result<Vec<String>> {
        let (read, mut write) = stream.into_split();
        let mut read = BufReader::new(read);
        let mut commands = Vec::new();

        // IAC DO TERMINAL-TYPE, to be refused by the client
        write.write_all(&[IAC, 253, 24]).await?;
        write
            .write_all(b"\r\n\r\nUser Access Verification\r\n\r\nUsername: ")
            .await?;

        let Some(username) = read_line(&mut read).await? else {
            return Ok(commands);
        };
        send(&mut write, &format!("{username}\r\nPassword: ")).await?;
        let Some(password) = read_line(&mut read).await? else {
            return Ok(commands);
        };

        if username != self.username || password != self.password {
            send(&mut write, "\r\n% Login invalid\r\n\r\nUsername: ").await?;
            while read_line(&mut read).await?.is_some() {}
            return Ok(commands);
        }

        let mut hostname = self.hostname.clone();
        let mut mode = Mode::Exec;
        let mut banner_delimiter: Option<char> = None;
        send(&mut write, &format!("\r\n{}", prompt(&hostname, mode))).await?;

        while let Some(line) = read_line(&mut read).await? {
            commands.push(line.clone());
            if line == "exit" && mode != Mode::Config {
                break;
            }
            if self.hang_up_on.as_deref() == Some(line.as_str()) {
                break;
            }
            send(&mut write, &format!("{line}\r\n")).await?;

            // Banner text is echoed with no prompt until the delimiter.
            if let Some(delimiter) = banner_delimiter {
                if line.contains(delimiter) {
                    banner_delimiter = None;
                    send(&mut write, &prompt(&hostname, mode)).await?;
                }
                continue;
            }

            match (mode, line.as_str()) {
                (Mode::Exec, "enable") => {
                    send(&mut write, "Password: ").await?;
                    let secret = read_line(&mut read).await?.unwrap_or_default();
                    if secret == self.secret {
                        mode = Mode::Privileged;
                        send(&mut write, "\r\n").await?;
                    } else {
                        send(&mut write, "\r\n% Access denied\r\n\r\n").await?;
                    }
                }
                (Mode::Privileged, "configure terminal") => {
                    send(
                        &mut write,
                        "Enter configuration commands, one per line.  End with CNTL/Z.\r\n",
                    )
                    .await?;
                    mode = Mode::Config;
                }
                (Mode::Privileged, "show version | include uptime") => {
                    send(
                        &mut write,
                        &format!("{hostname} uptime is 2 weeks, 3 days, 4 hours\r\n"),
                    )
                    .await?;
                }
                (Mode::Config, "end") => mode = Mode::Privileged,
                (Mode::Config, cmd) if cmd.starts_with("banner ") => {
                    let text = cmd.split_whitespace().nth(2).unwrap_or_default();
                    let mut chars = text.chars();
                    let delimiter = chars.next();
                    if let Some(delimiter) = delimiter.filter(|d| !chars.as_str().contains(*d)) {
                        send(
                            &mut write,
                            &format!(
                                "Enter TEXT message.  End with the character '{delimiter}'.\r\n"
                            ),
                        )
                        .await?;
                        banner_delimiter = Some(delimiter);
                        continue;
                    }
                }
                (Mode::Config, cmd) if cmd.starts_with("hostname ") => {
                    hostname = cmd["hostname ".len()..].trim().to_string();
                }
                (Mode::Config, cmd) if cmd.starts_with("bogus") => {
                    send(
                        &mut write,
                        &format!(
                            "{}^\r\n% Invalid input detected at '^' marker.\r\n\r\n",
                            " ".repeat(20)
                        ),
                    )
                    .await?;
                }
                _ => {}
            }

            send(&mut write, &prompt(&hostname, mode)).await?;
        }

        Ok(commands)
    }
}

fn prompt(hostname: &str, mode: Mode) -> String {
    match mode {
        Mode::Exec => format!("{hostname}>"),
        Mode::Privileged => format!("{hostname}#"),
        Mode::Config => format!("{hostname}(config)#"),
    }
}

async fn send(write: &mut OwnedWriteHalf, text: &str) -> io::Result<()> {
    write.write_all(text.as_bytes()).await
}

/// Read one CRLF-terminated line, skipping the client's 3-byte option
/// replies. `None` at end of stream.
async fn read_line(read: &mut BufReader<OwnedReadHalf>) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    loop {
        let byte = match read.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };
        match byte {
            IAC => {
                read.read_u8().await?;
                read.read_u8().await?;
            }
            b'\n' => break,
            b'\r' => {}
            _ => line.push(byte),
        }
    }

    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}
