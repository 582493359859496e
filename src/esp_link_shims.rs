//! ESP-IDF symbol providers for third-party crates.
//!
//! `embassy-sync`'s `CriticalSectionRawMutex` (used by the modem arbiter)
//! needs a `critical-section` 1.x implementation at link time.  On the
//! device it is backed by one process-wide std mutex with a per-thread
//! nesting depth.  The `atat` client times its responses with
//! `embassy-time`, whose driver ticks here at 1 MHz off `esp_timer`.
//! Host builds get both from the `std` features of those crates.

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use core::task::Waker;
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};
#[cfg(target_os = "espidf")]
use std::time::Duration;

#[cfg(target_os = "espidf")]
static SECTION_LOCK: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static DEPTH: Cell<u8> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            // Unit payload: poison carries no state.
            let guard = SECTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            HELD.with(|held| *held.borrow_mut() = Some(guard));
        }
        let next = d.saturating_add(1);
        depth.set(next);
        next
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            HELD.with(|held| *held.borrow_mut() = None);
        }
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub fn _embassy_time_now() -> u64 {
    // SAFETY: esp_timer is started by the IDF before `main`.
    unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
}

/// Wakes timer futures from a short-lived thread.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub fn _embassy_time_schedule_wake(at: u64, waker: &Waker) {
    let waker = waker.clone();
    std::thread::spawn(move || {
        let now = _embassy_time_now();
        if at > now {
            std::thread::sleep(Duration::from_micros(at - now));
        }
        waker.wake();
    });
}
