//! Unified error types for the SimLink firmware.
//!
//! Lifecycle outcomes that the caller is expected to branch on travel as
//! [`SimStatus`](crate::modem::SimStatus) values; everything else funnels
//! into the single [`Error`] enum below.  All variants are `Copy` so they can
//! be handed back through the facade and logged without allocation.

use core::fmt;

use crate::app::ports::ConfigError;
use crate::modem::SimStatus;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible link operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The modem never answered the AT probe.  Fatal for the session.
    Init(InitError),
    /// A lifecycle step ended in a non-ready SIM/network status.
    Sim(SimStatus),
    /// A chunked send aborted.  Refresh the connection before retrying.
    Stream(StreamError),
    /// The cell-tower clock could not be trusted.  Non-fatal.
    TimeSync(TimeSyncError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Sim(s) => write!(f, "sim: {s}"),
            Self::Stream(e) => write!(f, "stream: {e}"),
            Self::TimeSync(e) => write!(f, "time sync: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl From<SimStatus> for Error {
    fn from(s: SimStatus) -> Self {
        Self::Sim(s)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(match e {
            ConfigError::Corrupted => "config corrupted",
            ConfigError::ValidationFailed(msg) => msg,
            ConfigError::IoError => "storage I/O error",
        })
    }
}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// Every rung of the AT probe ladder failed.
    AtProbeExhausted { attempts: u8 },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtProbeExhausted { attempts } => {
                write!(f, "modem silent after {attempts} AT probes")
            }
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Streaming errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The sink latched a non-zero write-error code after a chunk.
    WriteError { code: i32, bytes_sent: usize },
    /// The sink accepted fewer bytes than the chunk held.
    ShortWrite { written: usize, expected: usize },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteError { code, bytes_sent } => {
                write!(f, "write error {code} after {bytes_sent} bytes")
            }
            Self::ShortWrite { written, expected } => {
                write!(f, "short write ({written}/{expected} bytes)")
            }
        }
    }
}

impl From<StreamError> for Error {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

// ---------------------------------------------------------------------------
// Time-sync errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSyncError {
    /// The modem returned no timestamp at all.
    NoTimestamp,
    /// A positional field was missing or not numeric.
    Malformed(&'static str),
    /// The year failed the plausibility window.
    ImplausibleYear(u16),
    /// The fields do not name a real calendar instant.
    InvalidDate,
}

impl fmt::Display for TimeSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTimestamp => write!(f, "no timestamp from modem"),
            Self::Malformed(field) => write!(f, "malformed {field} field"),
            Self::ImplausibleYear(y) => write!(f, "implausible year {y}"),
            Self::InvalidDate => write!(f, "not a calendar date"),
        }
    }
}

impl From<TimeSyncError> for Error {
    fn from(e: TimeSyncError) -> Self {
        Self::TimeSync(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
