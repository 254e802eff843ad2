//! Line-delimited JSON framing.
//!
//! One JSON-RPC message per line, terminated by `\n`. Generic over the reader
//! and writer so the same framing serves the server's stdio, the sample
//! client's child pipes and in-memory tests.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

use crate::stdio::error::TransportError;

pub struct StdioTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    max_message_bytes: usize,
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, max_message_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            max_message_bytes,
        }
    }

    /// Reads the next line, trimmed. `None` on EOF; blank lines come back as
    /// an empty string.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        // Room for a trailing "\r\n"; the trimmed length below is the real gate.
        let limit = self.max_message_bytes as u64 + 2;
        let mut buffer = Vec::new();
        let bytes_read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buffer)
            .await
            .map_err(|err| TransportError::Read(err.to_string()))?;

        if bytes_read == 0 {
            return Ok(None);
        }

        if buffer.last() != Some(&b'\n') && bytes_read as u64 == limit {
            self.discard_rest_of_line().await?;
            return Err(TransportError::MessageTooLarge {
                limit: self.max_message_bytes,
            });
        }

        let line = String::from_utf8(buffer).map_err(|_| TransportError::InvalidEncoding)?;
        let trimmed = line.trim();
        if trimmed.len() > self.max_message_bytes {
            return Err(TransportError::MessageTooLarge {
                limit: self.max_message_bytes,
            });
        }

        trace!(len = trimmed.len(), "read message");
        Ok(Some(trimmed.to_string()))
    }

    pub async fn write_line(&mut self, message: &str) -> Result<(), TransportError> {
        trace!(len = message.len(), "writing message");

        self.writer
            .write_all(message.as_bytes())
            .await
            .map_err(|err| TransportError::Write(err.to_string()))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|err| TransportError::Write(err.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|err| TransportError::Write(err.to_string()))?;

        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    async fn discard_rest_of_line(&mut self) -> Result<(), TransportError> {
        loop {
            let (consumed, done) = {
                let available = self
                    .reader
                    .fill_buf()
                    .await
                    .map_err(|err| TransportError::Read(err.to_string()))?;
                if available.is_empty() {
                    return Ok(());
                }
                match available.iter().position(|byte| *byte == b'\n') {
                    Some(position) => (position + 1, true),
                    None => (available.len(), false),
                }
            };

            self.reader.consume(consumed);
            if done {
                return Ok(());
            }
        }
    }
}
