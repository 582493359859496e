//! Application core: link logic behind port traits.
//!
//! The facade in [`service`] drives the modem session, arbiter and
//! streamer.  All interaction with hardware happens through the port
//! traits in [`ports`], keeping this layer testable without a modem.

pub mod events;
pub mod ports;
pub mod service;
