//! Port traits: the hexagonal boundary between link logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ModemService (domain)
//! ```
//!
//! Driven adapters (AT driver, power key, clock, secured channels, event
//! sinks, storage) implement these traits.  The
//! [`ModemService`](super::service::ModemService) consumes them via generics,
//! so the link core never touches a UART or GPIO directly.

use crate::config::ModemConfig;
use crate::gsm_time::VerificationTime;

// ───────────────────────────────────────────────────────────────
// Modem driver port (driven adapter: domain → AT command set)
// ───────────────────────────────────────────────────────────────

/// SIM card presence as reported by the modem (`AT+CPIN?`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCard {
    Ready,
    /// PIN or PUK required.
    Locked,
    Missing,
}

/// The command surface of a cellular modem.
///
/// Every call is blocking and returns once the modem has answered or its
/// own command timeout elapsed.  `bool` results mean "modem answered OK".
pub trait ModemDriver {
    /// Open the serial link at `baud` and run the first handshake.
    fn begin(&mut self, baud: u32) -> bool;

    /// Liveness probe (`AT` → `OK`).
    fn test_at(&mut self) -> bool;

    /// Soft restart.  The link must be probed again afterwards.
    fn restart(&mut self) -> bool;

    /// Orderly power-off command.
    fn power_off(&mut self) -> bool;

    fn is_network_connected(&mut self) -> bool;

    fn is_gprs_connected(&mut self) -> bool;

    /// Block until registered on a network or `timeout_ms` elapses.
    fn wait_for_network(&mut self, timeout_ms: u32) -> bool;

    fn set_network_mode(&mut self, mode: u8) -> bool;

    fn set_preferred_mode(&mut self, mode: u8) -> bool;

    /// Bring up the packet-data bearer on `apn`.
    fn gprs_connect(&mut self, apn: &str) -> bool;

    fn sim_status(&mut self) -> SimCard;

    fn modem_name(&mut self) -> heapless::String<32>;

    /// Raw network time string, `None` when the modem has none.
    fn gsm_date_time(&mut self) -> Option<heapless::String<32>>;

    /// `0` minimum, `1` full, `4` radio off.
    fn set_phone_functionality(&mut self, level: u8) -> bool;

    /// Discard anything pending in the receive buffer.
    fn stream_clear(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Power key port
// ───────────────────────────────────────────────────────────────

/// The modem's PWRKEY line.
pub trait PowerKey {
    /// `false` on boards where the line is not routed to the MCU.
    fn is_wired(&self) -> bool;

    fn drive(&mut self, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time and cooperative waiting.
///
/// All link waits (availability polls, settle delays) go through here so
/// tests can run them against a virtual clock.
pub trait Clock {
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds, yielding to the
    /// scheduler.
    fn sleep_ms(&mut self, ms: u32);
}

/// Everything the lifecycle needs from the board in one bound.
pub trait ModemHardware: ModemDriver + PowerKey + Clock {}

impl<T: ModemDriver + PowerKey + Clock> ModemHardware for T {}

// ───────────────────────────────────────────────────────────────
// Stream sink / secured channel ports
// ───────────────────────────────────────────────────────────────

/// Byte sink with a latched error code, modelled on Arduino's `Print`.
pub trait StreamSink {
    /// Write as much of `buf` as the sink accepts.  Returns bytes taken.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Non-zero once a write has failed.  Stays set until cleared.
    fn write_error(&self) -> i32;
}

/// A TLS-wrapped client session multiplexed over the modem.
pub trait SecureChannel: StreamSink {
    fn connected(&self) -> bool;

    fn clear_write_error(&mut self);

    /// Drop the current session.
    fn stop(&mut self);

    /// Anchor certificate lifetime checks to the given instant.
    fn set_verification_time(&mut self, time: VerificationTime);

    fn verification_time(&self) -> Option<VerificationTime>;
}

/// The device's two secured endpoints, sharing one modem.
#[derive(Debug, Default)]
pub struct ChannelPair<D, W> {
    /// Telemetry upload endpoint.
    pub data: D,
    /// Weather lookup endpoint.
    pub weather: W,
}

impl<D: SecureChannel, W: SecureChannel> ChannelPair<D, W> {
    pub fn new(data: D, weather: W) -> Self {
        Self { data, weather }
    }

    pub fn stop_all(&mut self) {
        self.data.stop();
        self.weather.stop();
    }

    pub fn clear_write_errors(&mut self) {
        self.data.clear_write_error();
        self.weather.clear_write_error();
    }

    pub fn set_verification_time(&mut self, time: VerificationTime) {
        self.data.set_verification_time(time);
        self.weather.set_verification_time(time);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The link core emits structured [`LinkEvent`](super::events::LinkEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LinkEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists link configuration.
///
/// Implementations MUST call [`ModemConfig::validate`] before persisting.
pub trait ConfigPort {
    /// Returns [`ModemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ModemConfig, ConfigError>;

    fn save(&self, config: &ModemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
