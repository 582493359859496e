//! Modem session state.
//!
//! ```text
//!  Uninitialized ─▶ PoweringOn ─▶ ProbingAt ─▶ SimCheck ─▶ NetworkAttach ─▶ InternetReady
//!        ▲                            │            │              │
//!        │                            └────────────┴──────────────┴──▶ Offline
//!        └──────────────── power_down (from any state) ◀─────────────────┘
//! ```
//!
//! [`ModemSession`] owns everything that used to be process-wide flags:
//! the lifecycle state, the AT probe counter, the availability arbiter,
//! and the initialized / clock-synced markers.  The transitions themselves
//! live in [`lifecycle`].

pub mod lifecycle;

use core::fmt;

use log::info;

use crate::app::events::LinkEvent;
use crate::app::ports::EventSink;
use crate::arbiter::Arbiter;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModemState {
    Uninitialized = 0,
    PoweringOn = 1,
    ProbingAt = 2,
    SimCheck = 3,
    NetworkAttach = 4,
    InternetReady = 5,
    Offline = 6,
}

impl ModemState {
    pub const COUNT: usize = 7;

    /// Convert a `u8` index back to `ModemState`.  Out-of-range indices map
    /// to `Offline`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Uninitialized,
            1 => Self::PoweringOn,
            2 => Self::ProbingAt,
            3 => Self::SimCheck,
            4 => Self::NetworkAttach,
            5 => Self::InternetReady,
            _ => {
                debug_assert!(idx == 6, "invalid modem state index: {idx}");
                Self::Offline
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::PoweringOn => "PoweringOn",
            Self::ProbingAt => "ProbingAt",
            Self::SimCheck => "SimCheck",
            Self::NetworkAttach => "NetworkAttach",
            Self::InternetReady => "InternetReady",
            Self::Offline => "Offline",
        }
    }

    /// The AT link answered at some point in this session.
    pub fn has_at_link(self) -> bool {
        matches!(
            self,
            Self::SimCheck | Self::NetworkAttach | Self::InternetReady
        )
    }
}

impl fmt::Display for ModemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Lifecycle outcomes
// ---------------------------------------------------------------------------

/// Result of a setup or connect step, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SimStatus {
    FailedToAt,
    NoSimCard,
    NoNetwork,
    NoInternet,
    InternetReady,
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FailedToAt => "failed to AT",
            Self::NoSimCard => "no SIM card",
            Self::NoNetwork => "no network",
            Self::NoInternet => "no internet",
            Self::InternetReady => "internet ready",
        })
    }
}

// ---------------------------------------------------------------------------
// AT probe counter
// ---------------------------------------------------------------------------

/// Bounded AT probe counter: 0, 1, 2.
///
/// * `1` retries at the primary baud rate.
/// * `2` runs at the fallback baud rate and is the last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttachAttemptCounter(u8);

impl AttachAttemptCounter {
    pub const LAST: u8 = 2;

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_last(self) -> bool {
        self.0 >= Self::LAST
    }

    /// Move to the next rung.  Saturates at [`Self::LAST`].
    pub fn escalate(&mut self) -> u8 {
        self.0 = (self.0 + 1).min(Self::LAST);
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct ModemSession {
    state: ModemState,
    attempts: AttachAttemptCounter,
    arbiter: Arbiter,
    initialized: bool,
    clock_synced: bool,
}

impl ModemSession {
    pub fn new(poll_ms: u32) -> Self {
        Self {
            state: ModemState::Uninitialized,
            attempts: AttachAttemptCounter::default(),
            arbiter: Arbiter::new(poll_ms),
            initialized: false,
            clock_synced: false,
        }
    }

    pub fn state(&self) -> ModemState {
        self.state
    }

    pub fn attempts(&self) -> AttachAttemptCounter {
        self.attempts
    }

    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_clock_synced(&self) -> bool {
        self.clock_synced
    }

    pub(crate) fn mark_clock_synced(&mut self) {
        self.clock_synced = true;
    }

    /// Move to `to`, logging and emitting the transition.  Self-transitions
    /// are silent.
    pub(crate) fn transition(&mut self, to: ModemState, sink: &mut impl EventSink) {
        let from = self.state;
        if from == to {
            return;
        }
        info!("Modem transition: {} -> {}", from, to);
        self.state = to;
        sink.emit(&LinkEvent::StateChanged { from, to });
    }
}

impl Default for ModemSession {
    fn default() -> Self {
        Self::new(crate::arbiter::DEFAULT_POLL_MS)
    }
}
