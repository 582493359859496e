//! Secured client channel over a modem transport.
//!
//! [`ModemChannel`] is the handle the link core sees for one TLS endpoint.
//! The TLS engine itself sits behind the wrapped [`Transport`]; this layer
//! adds the two things the link relies on:
//!
//! - a **latched write error**: the first failed write sets a non-zero
//!   code that sticks until [`clear_write_error`](SecureChannel::clear_write_error),
//!   so a chunked send can check once per chunk;
//! - the **verification time** the TLS engine checks certificate
//!   lifetimes against, since the device has no RTC.

use log::{debug, warn};

use crate::app::ports::{SecureChannel, StreamSink};
use crate::gsm_time::VerificationTime;
use crate::transport::{Transport, drain};

/// Write error code latched when the transport refuses a write.
pub const WRITE_ERROR_TRANSPORT: i32 = 1;

pub struct ModemChannel<T> {
    name: &'static str,
    transport: T,
    write_error: i32,
    verification_time: Option<VerificationTime>,
}

impl<T: Transport> ModemChannel<T> {
    pub fn new(name: &'static str, transport: T) -> Self {
        Self {
            name,
            transport,
            write_error: 0,
            verification_time: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> StreamSink for ModemChannel<T> {
    fn write(&mut self, buf: &[u8]) -> usize {
        if !self.transport.is_open() {
            self.write_error = WRITE_ERROR_TRANSPORT;
            return 0;
        }
        match self.transport.write(buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("{}: write of {} bytes failed: {:?}", self.name, buf.len(), e);
                self.write_error = WRITE_ERROR_TRANSPORT;
                0
            }
        }
    }

    fn write_error(&self) -> i32 {
        self.write_error
    }
}

impl<T: Transport> SecureChannel for ModemChannel<T> {
    fn connected(&self) -> bool {
        self.transport.is_open()
    }

    fn clear_write_error(&mut self) {
        self.write_error = 0;
    }

    fn stop(&mut self) {
        debug!("{}: stopping session", self.name);
        let stale = drain(&mut self.transport);
        if stale > 0 {
            debug!("{}: dropped {} unread bytes", self.name, stale);
        }
        if let Err(e) = self.transport.flush() {
            debug!("{}: flush on stop failed: {:?}", self.name, e);
        }
        self.transport.close();
    }

    fn set_verification_time(&mut self, time: VerificationTime) {
        debug!("{}: verification time {}", self.name, time);
        self.verification_time = Some(time);
    }

    fn verification_time(&self) -> Option<VerificationTime> {
        self.verification_time
    }
}
