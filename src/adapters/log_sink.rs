//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured link events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{Functionality, LinkEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`LinkEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            LinkEvent::Health {
                subsystem,
                functionality,
                detail,
            } => {
                if *functionality == Functionality::Offline {
                    warn!("HEALTH | {} | {} | {}", subsystem.tag(), functionality, detail);
                } else {
                    info!("HEALTH | {} | {} | {}", subsystem.tag(), functionality, detail);
                }
            }
            LinkEvent::ClockSynced(vt) => {
                info!("CLOCK | synced | {} | unix={}", vt, vt.unix_seconds());
            }
            LinkEvent::ClockRejected => {
                warn!("CLOCK | rejected | keeping previous anchor");
            }
            LinkEvent::ConnectionRefreshed { reason } => {
                warn!("LINK | refreshed | {}", reason);
            }
        }
    }
}
