//! Transport abstraction: any byte-oriented channel.
//!
//! The secured channels are generic over `Transport`: the modem's
//! socket/TLS session plugs in underneath without touching them.  The AT
//! link itself goes through `atat` and does not use this trait.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`.  Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// A peer is attached and writes can succeed.
    fn is_open(&self) -> bool;

    /// Drop the peer.  A closed transport may be reopened by its owner.
    fn close(&mut self);
}

/// A transport with no peer: writes are refused and reads are empty.
///
/// Stands in for a channel whose session has not been wired up yet.
#[derive(Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, _data: &[u8]) -> Result<usize, ()> {
        Err(())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        false
    }

    fn close(&mut self) {}
}

/// Drain everything currently readable from `t`.  Returns bytes discarded.
pub fn drain<T: Transport>(t: &mut T) -> usize {
    let mut scratch = [0u8; 64];
    let mut total = 0;
    while let Ok(n) = t.read(&mut scratch) {
        if n == 0 {
            break;
        }
        total += n;
    }
    total
}
