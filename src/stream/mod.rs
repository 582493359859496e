//! Byte sources fed to the chunked streamer.
//!
//! A payload is either already in memory ([`SliceSource`]) or produced
//! incrementally into a bounded FIFO ([`LoopbackStream`]).  Both are read
//! through the one [`ByteSource`] trait; the [`SourceShape`] tag picks the
//! chunk size so the streaming loop itself is shared.

pub mod chunked;

use crate::app::ports::StreamSink;

/// How a source holds its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// Complete body in memory; length known up front.
    Buffered,
    /// Body produced incrementally; only the buffered prefix is known.
    Streaming,
}

/// A finite, forward-only sequence of bytes.
pub trait ByteSource {
    fn shape(&self) -> SourceShape;

    /// Bytes that can be read right now without blocking.
    fn available(&self) -> usize;

    /// Copy up to `buf.len()` bytes out.  Returns bytes copied.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

// ---------------------------------------------------------------------------
// In-memory body
// ---------------------------------------------------------------------------

pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn shape(&self) -> SourceShape {
        SourceShape::Buffered
    }

    fn available(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.available());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

// ---------------------------------------------------------------------------
// Loopback FIFO
// ---------------------------------------------------------------------------

/// Default loopback capacity, enough for one serialized telemetry document.
pub const LOOPBACK_CAPACITY: usize = 4000;

/// Bounded FIFO: producers write serialized output in, the streamer reads
/// it back out.  Writes past capacity are dropped and latch a write error.
pub struct LoopbackStream<const N: usize = LOOPBACK_CAPACITY> {
    fifo: heapless::Deque<u8, N>,
    overflowed: bool,
}

impl<const N: usize> LoopbackStream<N> {
    pub fn new() -> Self {
        Self {
            fifo: heapless::Deque::new(),
            overflowed: false,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.fifo.clear();
        self.overflowed = false;
    }
}

impl<const N: usize> Default for LoopbackStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StreamSink for LoopbackStream<N> {
    fn write(&mut self, buf: &[u8]) -> usize {
        let mut taken = 0;
        for &b in buf {
            if self.fifo.push_back(b).is_err() {
                self.overflowed = true;
                break;
            }
            taken += 1;
        }
        taken
    }

    fn write_error(&self) -> i32 {
        i32::from(self.overflowed)
    }
}

impl<const N: usize> ByteSource for LoopbackStream<N> {
    fn shape(&self) -> SourceShape {
        SourceShape::Streaming
    }

    fn available(&self) -> usize {
        self.fifo.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.fifo.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }
}
