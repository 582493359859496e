//! Single-owner availability arbiter for the shared modem.
//!
//! There is one physical modem and several logical clients (telemetry
//! upload, weather lookup, clock sync).  A client polls
//! [`Arbiter::wait_until_available`] until it observes the modem free and
//! claims it in the same critical section; it gives the modem back with
//! [`Arbiter::set_available`].  There is no queue and no fairness: the
//! first poller to see "available" wins.
//!
//! The token is never released on scope exit.  A holder that forgets to
//! call `set_available(true)` keeps the modem until power-down.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, warn};

use crate::app::ports::Clock;

/// Default poll interval while waiting for the modem.
pub const DEFAULT_POLL_MS: u32 = 100;

/// Snapshot of the availability token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvailabilityToken {
    /// Free for the next caller to claim.
    pub available: bool,
    /// Last successful claimant.  Cleared on release.
    pub owner: Option<&'static str>,
    /// Clock reading at the moment of the claim.
    pub acquired_at_ms: u64,
}

impl AvailabilityToken {
    pub fn is_held(&self) -> bool {
        self.owner.is_some()
    }
}

pub struct Arbiter {
    token: Mutex<CriticalSectionRawMutex, RefCell<AvailabilityToken>>,
    poll_ms: u32,
}

impl Arbiter {
    /// A closed arbiter with no owner.  Nothing can be acquired until the
    /// modem comes up and calls [`set_available(true)`](Self::set_available).
    pub const fn new(poll_ms: u32) -> Self {
        Self {
            token: Mutex::new(RefCell::new(AvailabilityToken {
                available: false,
                owner: None,
                acquired_at_ms: 0,
            })),
            poll_ms,
        }
    }

    pub fn poll_ms(&self) -> u32 {
        self.poll_ms
    }

    /// Poll until the modem is free, then claim it for `owner`.
    ///
    /// Returns `false` once `timeout_ms` has elapsed without a claim; the
    /// token is left exactly as it was.
    pub fn wait_until_available(
        &self,
        owner: &'static str,
        timeout_ms: u32,
        clock: &mut impl Clock,
    ) -> bool {
        let started = clock.now_ms();
        loop {
            if self.try_acquire(owner, clock.now_ms()) {
                return true;
            }
            if clock.now_ms().saturating_sub(started) >= u64::from(timeout_ms) {
                let holder = self.snapshot().owner;
                warn!(
                    "Arbiter: {} timed out after {} ms (held by {:?})",
                    owner, timeout_ms, holder
                );
                return false;
            }
            clock.sleep_ms(self.poll_ms);
        }
    }

    /// Claim the modem if it is free.  Check and claim are one atomic step.
    pub fn try_acquire(&self, owner: &'static str, now_ms: u64) -> bool {
        let claimed = self.token.lock(|cell| {
            let mut t = cell.borrow_mut();
            if !t.available {
                return false;
            }
            t.available = false;
            t.owner = Some(owner);
            t.acquired_at_ms = now_ms;
            true
        });
        if claimed {
            debug!("Arbiter: modem claimed by {}", owner);
        }
        claimed
    }

    /// Open (`true`) or close (`false`) the modem.  Either way the current
    /// owner is forgotten.
    pub fn set_available(&self, available: bool) {
        let prev = self.token.lock(|cell| {
            let mut t = cell.borrow_mut();
            let prev = t.owner.take();
            t.available = available;
            prev
        });
        match prev {
            Some(owner) => debug!("Arbiter: released by {} (available={})", owner, available),
            None => debug!("Arbiter: available={}", available),
        }
    }

    pub fn is_available(&self) -> bool {
        self.token.lock(|cell| cell.borrow().available)
    }

    pub fn snapshot(&self) -> AvailabilityToken {
        self.token.lock(|cell| *cell.borrow())
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_MS)
    }
}
