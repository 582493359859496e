//! Chunked transmission of large bodies through the modem.
//!
//! The SIMCom TLS channel accepts roughly one serial buffer per write, so a
//! body is pushed as a run of full chunks followed by one short tail:
//!
//! ```text
//! body:   |<---- C ---->|<---- C ---->|<-- L mod C -->|
//! write:   chunk 1       chunk 2       final chunk
//! ```
//!
//! After every chunk the sink's latched write error is inspected.  Any
//! error aborts the send; the caller must refresh the connection before
//! retrying.  No line terminator is appended.  Request framing belongs to
//! the caller.

use log::{debug, warn};

use super::{ByteSource, SourceShape};
use crate::app::ports::StreamSink;
use crate::config::ModemConfig;
use crate::error::StreamError;

/// Largest chunk any source shape may use.
pub const MAX_CHUNK_BYTES: usize = 1360;

/// Bytes of the final chunk kept for diagnostics.
pub const TAIL_BYTES: usize = 32;

/// Progress of one send call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingCursor {
    pub chunk_size: usize,
    pub bytes_remaining: usize,
    /// Trailing bytes of the most recently written chunk.
    pub last_chunk_tail: heapless::Vec<u8, TAIL_BYTES>,
}

impl StreamingCursor {
    fn new(chunk_size: usize, bytes_remaining: usize) -> Self {
        Self {
            chunk_size,
            bytes_remaining,
            last_chunk_tail: heapless::Vec::new(),
        }
    }

    fn advance(&mut self, chunk: &[u8]) {
        self.bytes_remaining = self.bytes_remaining.saturating_sub(chunk.len());
        let start = chunk.len().saturating_sub(TAIL_BYTES);
        self.last_chunk_tail.clear();
        // Cannot fail: at most TAIL_BYTES are copied.
        let _ = self.last_chunk_tail.extend_from_slice(&chunk[start..]);
    }
}

/// Outcome of a completed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub bytes_sent: usize,
    pub chunks: usize,
    pub tail: heapless::Vec<u8, TAIL_BYTES>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkedStreamer {
    buffered_chunk: usize,
    streaming_chunk: usize,
}

impl ChunkedStreamer {
    /// Chunk sizes are clamped to `1..=MAX_CHUNK_BYTES`.
    pub fn new(buffered_chunk: usize, streaming_chunk: usize) -> Self {
        Self {
            buffered_chunk: buffered_chunk.clamp(1, MAX_CHUNK_BYTES),
            streaming_chunk: streaming_chunk.clamp(1, MAX_CHUNK_BYTES),
        }
    }

    pub fn from_config(cfg: &ModemConfig) -> Self {
        Self::new(
            cfg.buffered_chunk_bytes as usize,
            cfg.streaming_chunk_bytes as usize,
        )
    }

    pub fn chunk_size_for(&self, shape: SourceShape) -> usize {
        match shape {
            SourceShape::Buffered => self.buffered_chunk,
            SourceShape::Streaming => self.streaming_chunk,
        }
    }

    /// Drain `source` into `sink` chunk by chunk.
    pub fn send(
        &self,
        source: &mut impl ByteSource,
        sink: &mut impl StreamSink,
    ) -> Result<SendReport, StreamError> {
        let chunk_size = self.chunk_size_for(source.shape());
        let mut cursor = StreamingCursor::new(chunk_size, source.available());
        let mut buf = [0u8; MAX_CHUNK_BYTES];
        let mut bytes_sent = 0usize;
        let mut chunks = 0usize;

        while source.available() > 0 {
            // Full chunks while a full chunk is buffered, then one short tail.
            let want = source.available().min(chunk_size);
            let n = source.read(&mut buf[..want]);
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];

            let written = sink.write(chunk);
            bytes_sent += written;

            let code = sink.write_error();
            if code != 0 {
                warn!("Stream: write error {} after {} bytes", code, bytes_sent);
                return Err(StreamError::WriteError { code, bytes_sent });
            }
            if written < n {
                warn!("Stream: short write {}/{}", written, n);
                return Err(StreamError::ShortWrite {
                    written,
                    expected: n,
                });
            }

            cursor.advance(chunk);
            chunks += 1;
        }

        debug!(
            "Stream: {} bytes in {} chunks of {} ({} left)",
            bytes_sent, chunks, chunk_size, cursor.bytes_remaining
        );

        Ok(SendReport {
            bytes_sent,
            chunks,
            tail: cursor.last_chunk_tail,
        })
    }
}

impl Default for ChunkedStreamer {
    fn default() -> Self {
        Self::from_config(&ModemConfig::default())
    }
}
