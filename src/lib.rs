//! SimLink firmware library.
//!
//! Cellular modem lifecycle, access arbitration, chunked streaming and
//! network-time anchoring for ESP32 telemetry nodes.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module, so
//! the whole link core builds and tests on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod arbiter;
pub mod config;
pub mod error;
pub mod gsm_time;
pub mod modem;
pub mod pins;
pub mod stream;
pub mod transport;

pub mod adapters;

mod esp_link_shims;

#[cfg(all(test, not(target_os = "espidf")))]
use embassy_time as _;
