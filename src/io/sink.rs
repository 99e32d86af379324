//! Buffered fragment writer with backpressure reporting.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::OutputTarget;

/// Buffered bytes at which [`OutputSink::write`] starts reporting backpressure.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Thin wrapper over an async byte writer.
///
/// `write` only buffers and reports whether the caller may keep going;
/// bytes reach the underlying writer in `drain` and `end`.
pub struct OutputSink {
    id: String,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    buffer: Vec<u8>,
    high_water_mark: usize,
    bytes_written: u64,
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("id", &self.id)
            .field("buffered", &self.buffer.len())
            .field("high_water_mark", &self.high_water_mark)
            .field("bytes_written", &self.bytes_written)
            .finish()
    }
}

impl OutputSink {
    /// Wrap an already opened writer.
    pub fn new(
        id: impl Into<String>,
        writer: Box<dyn AsyncWrite + Unpin + Send>,
        high_water_mark: usize,
    ) -> Self {
        Self {
            id: id.into(),
            writer,
            buffer: Vec::new(),
            high_water_mark,
            bytes_written: 0,
        }
    }

    /// Open `target` for writing, truncating existing content.
    pub async fn open(target: &dyn OutputTarget, high_water_mark: usize) -> std::io::Result<Self> {
        let writer = target.open_overwrite().await?;
        Ok(Self::new(target.id(), writer, high_water_mark))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a fragment.
    ///
    /// Returns `false` once the buffer has reached the high-water mark; the
    /// caller must stop producing until [`OutputSink::drain`] completes.
    pub fn write(&mut self, fragment: &str) -> bool {
        self.buffer.extend_from_slice(fragment.as_bytes());
        self.buffer.len() < self.high_water_mark
    }

    /// Flush everything buffered to the underlying writer.
    pub async fn drain(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer).await?;
            self.bytes_written += self.buffer.len() as u64;
            trace!(sink = %self.id, bytes = self.buffer.len(), "drained");
            self.buffer.clear();
        }
        self.writer.flush().await
    }

    /// Drain, then close the underlying writer. Returns the total bytes written.
    pub async fn end(mut self) -> std::io::Result<u64> {
        self.drain().await?;
        self.writer.shutdown().await?;
        Ok(self.bytes_written)
    }

    /// Bytes queued but not yet handed to the writer.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes handed to the writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }
}
