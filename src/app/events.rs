//! Outbound link events.
//!
//! The [`ModemService`](super::service::ModemService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to serial, forward to a status display.

use core::fmt;

use crate::gsm_time::VerificationTime;
use crate::modem::ModemState;

/// Parts of the device whose health is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Modem,
    DataEndpoint,
    WeatherEndpoint,
    Controller,
}

impl Subsystem {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Modem => "SIMCOM",
            Self::DataEndpoint => "DATA",
            Self::WeatherEndpoint => "WEATHER",
            Self::Controller => "ESP32",
        }
    }
}

/// Coarse health level for one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Functionality {
    Offline,
    Partial,
    Full,
}

impl fmt::Display for Functionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offline => "offline",
            Self::Partial => "partial",
            Self::Full => "full",
        })
    }
}

/// Structured events emitted by the link core.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// The modem lifecycle moved between states.
    StateChanged { from: ModemState, to: ModemState },

    /// A subsystem's health changed.
    Health {
        subsystem: Subsystem,
        functionality: Functionality,
        detail: &'static str,
    },

    /// Both secured channels were anchored to network time.
    ClockSynced(VerificationTime),

    /// The network timestamp was rejected; channels keep their old anchor.
    ClockRejected,

    /// Channels were torn down and the modem buffer flushed.
    ConnectionRefreshed { reason: &'static str },
}
