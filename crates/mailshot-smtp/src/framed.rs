//! Line framing for the SMTP dialogue.
//!
//! Replies are CRLF-terminated lines that may continue over several lines
//! (`250-...`). Message content sent after DATA must use CRLF line endings,
//! must have lines starting with `.` doubled, and ends with `.` on its own
//! line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::reply::{Reply, is_last_line};

/// Upper bound on the number of lines in a single reply.
const MAX_REPLY_LINES: usize = 128;

/// Reads one complete reply.
///
/// # Errors
///
/// Returns an error on I/O failure, when the peer closes the connection
/// mid-reply, or when the reply is malformed.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Protocol("connection closed by server".into()));
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        trace!(line, "S:");
        let last = is_last_line(line);
        lines.push(line.to_string());
        if last {
            break;
        }
        if lines.len() >= MAX_REPLY_LINES {
            return Err(Error::Protocol("reply has too many lines".into()));
        }
    }

    Reply::parse(&lines)
}

/// Writes one command and flushes.
///
/// # Errors
///
/// Returns an error if the write fails.
pub async fn write_command<W>(writer: &mut W, command: &Command) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if command.is_sensitive() {
        trace!("C: AUTH <redacted>");
    } else {
        trace!(?command, "C:");
    }
    writer.write_all(&command.serialize()).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes message content followed by the end-of-data marker.
///
/// # Errors
///
/// Returns an error if the write fails.
pub async fn write_data<W>(writer: &mut W, message: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_data(message)).await?;
    writer.flush().await?;
    Ok(())
}

/// Normalizes line endings to CRLF, dot-stuffs, and appends `.\r\n`.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    let content = message.strip_suffix(b"\n").unwrap_or(message);

    for line in content.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(b".\r\n");
    out
}
