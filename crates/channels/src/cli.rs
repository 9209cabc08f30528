//! CLI channel: interactive terminal-based chat.
//!
//! Reads lines from stdin (or any async reader) on a background task and
//! hands each user message to the shell over an mpsc channel. The channel
//! closes when the user types `exit` or input ends.

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelError {
    #[error("Input stream lost: {0}")]
    ConnectionLost(String),
}

/// What a single line of input means to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellLine {
    /// `exit`, in any case
    Exit,
    /// Nothing but whitespace
    Blank,
    Message(String),
}

impl ShellLine {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            ShellLine::Blank
        } else if trimmed.eq_ignore_ascii_case("exit") {
            ShellLine::Exit
        } else {
            ShellLine::Message(trimmed.to_string())
        }
    }
}

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel<R> {
    reader: R,
}

impl CliChannel<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }
}

impl<R> CliChannel<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Start reading. Messages arrive in order; the receiver yields `None`
    /// after `exit`, end of input, or a read error (sent first).
    pub fn start(self) -> mpsc::Receiver<Result<String, ChannelError>> {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut lines = self.reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match ShellLine::classify(&line) {
                        ShellLine::Blank => continue,
                        ShellLine::Exit => {
                            debug!("Exit requested");
                            break;
                        }
                        ShellLine::Message(message) => {
                            if tx.send(Ok(message)).await.is_err() {
                                break;
                            }
                        }
                    },
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx
                            .send(Err(ChannelError::ConnectionLost(e.to_string())))
                            .await;
                        break;
                    }
                }
            }
        });

        rx
    }
}
