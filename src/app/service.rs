//! Connectivity facade: the hexagonal core of the link.
//!
//! [`ModemService`] owns the [`ModemSession`] and the streamer.  It exposes
//! the operations the rest of the firmware calls: bring the modem up, take
//! turns on it, push bodies through it, recover it, and anchor the secured
//! channels to network time.  All I/O flows through port traits injected at
//! call sites, so the whole service runs against mocks on the host.
//!
//! ```text
//!  ModemHardware ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                    │        ModemService          │
//!  ChannelPair   ◀──│ lifecycle · arbiter · stream │
//!                    └─────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::ModemConfig;
use crate::error::{Error, Result, TimeSyncError};
use crate::gsm_time::{VerificationTime, parse_verification_time};
use crate::modem::{ModemSession, ModemState, SimStatus};
use crate::stream::ByteSource;
use crate::stream::chunked::{ChunkedStreamer, SendReport};

use super::events::{Functionality, LinkEvent, Subsystem};
use super::ports::{ChannelPair, EventSink, ModemHardware, SecureChannel, StreamSink};

// ───────────────────────────────────────────────────────────────
// ModemService
// ───────────────────────────────────────────────────────────────

pub struct ModemService {
    session: ModemSession,
    config: ModemConfig,
    streamer: ChunkedStreamer,
}

impl ModemService {
    pub fn new(config: ModemConfig) -> Self {
        let session = ModemSession::new(config.availability_poll_ms);
        let streamer = ChunkedStreamer::from_config(&config);
        Self {
            session,
            config,
            streamer,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Power up, probe AT and check the SIM.  See [`ModemSession::setup`].
    pub fn setup(&mut self, hw: &mut impl ModemHardware, sink: &mut impl EventSink) -> SimStatus {
        self.session.setup(hw, &self.config, sink)
    }

    pub fn connect_to_internet(
        &mut self,
        prefer_lte_m: bool,
        hw: &mut impl ModemHardware,
        sink: &mut impl EventSink,
    ) -> SimStatus {
        self.session
            .connect_to_internet(prefer_lte_m, hw, &self.config, sink)
    }

    pub fn power_down(
        &mut self,
        restart: bool,
        hw: &mut impl ModemHardware,
        sink: &mut impl EventSink,
    ) -> bool {
        self.session.power_down(restart, hw, &self.config, sink)
    }

    // ── Arbitration ───────────────────────────────────────────

    /// Take the modem for `owner`, running setup first if the session has
    /// never come up.  See [`Arbiter::wait_until_available`](crate::arbiter::Arbiter::wait_until_available).
    pub fn wait_until_available(
        &mut self,
        owner: &'static str,
        timeout_ms: u32,
        hw: &mut impl ModemHardware,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.session.is_initialized() {
            info!("ModemService: {} found modem down, running setup", owner);
            self.setup(hw, sink);
        }
        self.session
            .arbiter()
            .wait_until_available(owner, timeout_ms, hw)
    }

    /// [`wait_until_available`](Self::wait_until_available) with the
    /// configured default timeout.
    pub fn acquire(
        &mut self,
        owner: &'static str,
        hw: &mut impl ModemHardware,
        sink: &mut impl EventSink,
    ) -> bool {
        let timeout = self.config.acquire_timeout_ms;
        self.wait_until_available(owner, timeout, hw, sink)
    }

    pub fn set_available(&self, available: bool) {
        self.session.arbiter().set_available(available);
    }

    // ── Data path ─────────────────────────────────────────────

    /// Stream `source` into `channel` in modem-sized chunks.
    ///
    /// On error the channel is left dirty; call
    /// [`refresh_connection`](Self::refresh_connection) before retrying.
    pub fn send(
        &self,
        source: &mut impl ByteSource,
        channel: &mut impl StreamSink,
    ) -> Result<SendReport> {
        self.streamer.send(source, channel).map_err(|e| {
            warn!("ModemService: send aborted: {}", e);
            Error::from(e)
        })
    }

    /// Tear both channel sessions down and flush the modem.
    ///
    /// The link is unusable until this returns.
    pub fn refresh_connection<D: SecureChannel, W: SecureChannel>(
        &mut self,
        reason: &'static str,
        hw: &mut impl ModemHardware,
        channels: &mut ChannelPair<D, W>,
        sink: &mut impl EventSink,
    ) {
        warn!("Refreshing connection because {}", reason);
        sink.emit(&LinkEvent::ConnectionRefreshed { reason });

        hw.sleep_ms(self.config.refresh_pre_settle_ms);
        channels.stop_all();
        hw.stream_clear();
        channels.clear_write_errors();
        hw.sleep_ms(self.config.refresh_post_settle_ms);
    }

    /// Post-request health check for one endpoint.
    ///
    /// A dropped session or latched write error triggers a refresh and
    /// returns `false`.
    pub fn check_channel<D: SecureChannel, W: SecureChannel>(
        &mut self,
        endpoint: Subsystem,
        hw: &mut impl ModemHardware,
        channels: &mut ChannelPair<D, W>,
        sink: &mut impl EventSink,
    ) -> bool {
        let (connected, code) = match endpoint {
            Subsystem::WeatherEndpoint => {
                (channels.weather.connected(), channels.weather.write_error())
            }
            _ => (channels.data.connected(), channels.data.write_error()),
        };
        if connected && code == 0 {
            return true;
        }

        warn!(
            "{}: channel unhealthy (connected={}, write_error={})",
            endpoint.tag(),
            connected,
            code
        );
        sink.emit(&LinkEvent::Health {
            subsystem: endpoint,
            functionality: Functionality::Offline,
            detail: "Lost connection mid-request.",
        });
        self.refresh_connection("the request did not reach the server", hw, channels, sink);
        false
    }

    // ── Time ──────────────────────────────────────────────────

    /// Anchor both channels' certificate checks to cell-tower time.
    ///
    /// Connects first if no bearer is up.  On failure the channels keep
    /// their previous verification time.
    pub fn update_clock_from_network<D: SecureChannel, W: SecureChannel>(
        &mut self,
        hw: &mut impl ModemHardware,
        channels: &mut ChannelPair<D, W>,
        sink: &mut impl EventSink,
    ) -> Result<VerificationTime> {
        if !hw.is_gprs_connected() {
            self.connect_to_internet(false, hw, sink);
        }

        let parsed = hw
            .gsm_date_time()
            .ok_or(TimeSyncError::NoTimestamp)
            .and_then(|raw| parse_verification_time(&raw));

        match parsed {
            Ok(vt) => {
                channels.set_verification_time(vt);
                self.session.mark_clock_synced();
                info!(
                    "ModemService: verification time set to {} (unix {})",
                    vt,
                    vt.unix_seconds()
                );
                sink.emit(&LinkEvent::ClockSynced(vt));
                Ok(vt)
            }
            Err(e) => {
                warn!("ModemService: network time rejected: {}", e);
                sink.emit(&LinkEvent::ClockRejected);
                sink.emit(&LinkEvent::Health {
                    subsystem: Subsystem::Controller,
                    functionality: Functionality::Partial,
                    detail: "Network time unavailable.",
                });
                Err(e.into())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ModemState {
        self.session.state()
    }

    pub fn session(&self) -> &ModemSession {
        &self.session
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn is_internet_connected(&self, hw: &mut impl ModemHardware) -> bool {
        hw.is_gprs_connected()
    }
}
