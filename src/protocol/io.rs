// ABOUTME: Newline-delimited frame I/O — one request per input line, one frame per output line.
// ABOUTME: All writers share a single locked sink so concurrent frames never interleave.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::frame::Request;

/// What the reader produced from one non-blank input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Request(Request),
    /// The line could not be read as a request; carries the parser's complaint.
    Malformed(String),
}

/// Reads requests from a line-oriented byte stream.
pub struct FrameReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Read the next non-blank line. Returns `Ok(None)` at end of stream.
    pub async fn next_frame(&mut self) -> std::io::Result<Option<Inbound>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line.trim(),
                Err(e) => return Ok(Some(Inbound::Malformed(e.to_string()))),
            };
            if line.is_empty() {
                continue;
            }

            tracing::trace!(line, "frame received");
            return Ok(Some(match Request::parse(line) {
                Ok(request) => Inbound::Request(request),
                Err(detail) => Inbound::Malformed(detail),
            }));
        }
    }
}

type BoxedSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable handle to the shared output sink.
///
/// Each call to [`FrameWriter::emit`] serializes the frame first, then holds
/// the lock only while that one line is written and flushed.
#[derive(Clone)]
pub struct FrameWriter {
    sink: Arc<Mutex<BoxedSink>>,
}

impl FrameWriter {
    pub fn new<W>(sink: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    /// Write one frame as a single line.
    pub async fn emit<T: Serialize>(&self, frame: &T) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');

        let mut sink = self.sink.lock().await;
        sink.write_all(line.as_bytes()).await?;
        sink.flush().await?;
        Ok(())
    }

    /// Flush and shut down the underlying sink.
    pub async fn shutdown(&self) -> std::io::Result<()> {
        let mut sink = self.sink.lock().await;
        sink.flush().await?;
        sink.shutdown().await
    }
}
