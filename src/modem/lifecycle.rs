//! Modem power, AT probing and network attach.
//!
//! Every step is a method on [`ModemSession`] taking the board through the
//! [`ModemHardware`] bundle.  Nothing here retries without bound: the AT
//! ladder stops after three probes and a connect makes at most two bearer
//! attempts.

use log::{debug, info, warn};

use super::{ModemSession, ModemState, SimStatus};
use crate::app::events::{Functionality, LinkEvent, Subsystem};
use crate::app::ports::{EventSink, ModemHardware, SimCard};
use crate::config::{ModemConfig, RadioModes};
use crate::error::{InitError, Result};

/// Full phone functionality (`AT+CFUN=1`).
const CFUN_FULL: u8 = 1;

/// Total probes in the AT ladder.
const AT_PROBES: u8 = 3;

fn modem_health(sink: &mut impl EventSink, functionality: Functionality, detail: &'static str) {
    sink.emit(&LinkEvent::Health {
        subsystem: Subsystem::Modem,
        functionality,
        detail,
    });
}

impl ModemSession {
    /// Power the modem on and establish the AT link.
    ///
    /// A session that is already initialized, or a modem that already
    /// reports a network, is adopted as-is.
    pub fn initialize(
        &mut self,
        hw: &mut impl ModemHardware,
        cfg: &ModemConfig,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if self.initialized {
            debug!("Modem: already initialized");
            return Ok(());
        }
        if hw.is_network_connected() {
            info!("Modem: already registered on a network, adopting session");
            self.mark_up(sink);
            return Ok(());
        }

        self.attempts.reset();
        self.transition(ModemState::PoweringOn, sink);
        toggle_power_key(hw, cfg);

        self.transition(ModemState::ProbingAt, sink);
        let mut baud = cfg.primary_baud;
        loop {
            debug!(
                "Modem: AT probe {} at {} baud",
                self.attempts.get() + 1,
                baud
            );
            if hw.begin(baud) {
                break;
            }

            if self.attempts.is_last() {
                warn!("Modem: no AT response after {} probes", AT_PROBES);
                modem_health(sink, Functionality::Offline, "Offline.");
                self.transition(ModemState::Offline, sink);
                return Err(InitError::AtProbeExhausted {
                    attempts: AT_PROBES,
                }
                .into());
            }

            // First miss retries at the same baud; the second drops to the
            // fallback.
            match self.attempts.escalate() {
                1 => warn!("Modem: no AT response, trying once more"),
                _ => {
                    warn!(
                        "Modem: silent at {} baud, trying {}",
                        baud, cfg.fallback_baud
                    );
                    modem_health(sink, Functionality::Offline, "Offline.");
                    baud = cfg.fallback_baud;
                }
            }
            hw.restart();
        }

        info!("Modem: AT link up at {} baud", baud);
        self.mark_up(sink);
        Ok(())
    }

    fn mark_up(&mut self, sink: &mut impl EventSink) {
        self.initialized = true;
        if !self.state.has_at_link() {
            self.transition(ModemState::SimCheck, sink);
        }
        self.arbiter.set_available(true);
    }

    /// Shut the modem down (or soft-restart it) and close the session.
    ///
    /// Always returns `true`.
    pub fn power_down(
        &mut self,
        restart: bool,
        hw: &mut impl ModemHardware,
        cfg: &ModemConfig,
        sink: &mut impl EventSink,
    ) -> bool {
        if restart {
            warn!("Modem: restarting");
            hw.restart();
        } else {
            warn!("Modem: powering down");
            hw.power_off();
            hw.sleep_ms(cfg.power_off_settle_ms);
            if hw.is_wired() {
                hw.drive(false);
            }
        }
        hw.sleep_ms(cfg.power_down_settle_ms);

        self.attempts.reset();
        self.initialized = false;
        self.clock_synced = false;
        self.arbiter.set_available(false);
        self.transition(ModemState::Uninitialized, sink);
        modem_health(sink, Functionality::Offline, "Powered down.");
        true
    }

    /// Initialize, identify the modem and check the SIM.
    ///
    /// Returns [`SimStatus::NoNetwork`] on success: attaching is a separate
    /// step.
    pub fn setup(
        &mut self,
        hw: &mut impl ModemHardware,
        cfg: &ModemConfig,
        sink: &mut impl EventSink,
    ) -> SimStatus {
        if let Err(e) = self.initialize(hw, cfg, sink) {
            warn!("Modem: setup failed: {}", e);
            modem_health(sink, Functionality::Offline, "FAILED TO AT.");
            self.transition(ModemState::Offline, sink);
            return SimStatus::FailedToAt;
        }

        let name = hw.modem_name();
        info!("Modem: name {}", name);
        modem_health(sink, Functionality::Partial, "Modem identified.");

        if let Err(status) = self.check_sim(hw, sink) {
            return status;
        }

        hw.set_phone_functionality(CFUN_FULL);
        self.transition(ModemState::NetworkAttach, sink);
        SimStatus::NoNetwork
    }

    fn check_sim(
        &mut self,
        hw: &mut impl ModemHardware,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), SimStatus> {
        match hw.sim_status() {
            SimCard::Ready => Ok(()),
            other => {
                warn!("Modem: SIM not ready ({:?})", other);
                modem_health(sink, Functionality::Offline, "NO SIM CARD.");
                self.transition(ModemState::Offline, sink);
                Err(SimStatus::NoSimCard)
            }
        }
    }

    /// Bring up the data bearer.
    ///
    /// Issues at most two `gprs_connect` calls: the requested mode pair
    /// first, LTE-M second.
    pub fn connect_to_internet(
        &mut self,
        prefer_lte_m: bool,
        hw: &mut impl ModemHardware,
        cfg: &ModemConfig,
        sink: &mut impl EventSink,
    ) -> SimStatus {
        if !self.initialized || !hw.test_at() {
            warn!("Modem: cannot connect, AT link down ({})", self.state);
            return SimStatus::FailedToAt;
        }
        // An initialized session only goes Offline over the SIM.
        if matches!(self.state, ModemState::SimCheck | ModemState::Offline) {
            if let Err(status) = self.check_sim(hw, sink) {
                return status;
            }
            self.transition(ModemState::NetworkAttach, sink);
        }
        hw.set_phone_functionality(CFUN_FULL);

        if hw.is_gprs_connected() {
            return self.mark_online(sink, "Connected.");
        }
        self.transition(ModemState::NetworkAttach, sink);

        if !hw.is_network_connected() && !hw.wait_for_network(cfg.network_attach_timeout_ms) {
            warn!(
                "Modem: no network after {} ms",
                cfg.network_attach_timeout_ms
            );
            modem_health(
                sink,
                Functionality::Partial,
                "No network available. Trying again...",
            );
            return SimStatus::NoNetwork;
        }

        let modes = if prefer_lte_m {
            warn!("Modem: preferring LTE-M");
            cfg.lte_m_modes
        } else {
            cfg.balanced_modes
        };
        apply_modes(hw, modes);
        if hw.gprs_connect(&cfg.apn) {
            return self.mark_online(sink, "Connected.");
        }

        warn!("Modem: bearer failed, retrying in LTE-M mode");
        apply_modes(hw, cfg.lte_m_modes);
        if hw.gprs_connect(&cfg.apn) {
            return self.mark_online(sink, "Connected on LTE-M.");
        }

        warn!("Modem: no internet on {}", cfg.apn);
        SimStatus::NoInternet
    }

    fn mark_online(&mut self, sink: &mut impl EventSink, detail: &'static str) -> SimStatus {
        self.transition(ModemState::InternetReady, sink);
        modem_health(sink, Functionality::Full, detail);
        self.arbiter.set_available(true);
        SimStatus::InternetReady
    }
}

fn apply_modes(hw: &mut impl ModemHardware, modes: RadioModes) {
    debug!(
        "Modem: network mode {}, preferred mode {}",
        modes.network_mode, modes.preferred_mode
    );
    hw.set_network_mode(modes.network_mode);
    hw.set_preferred_mode(modes.preferred_mode);
}

/// Pulse PWRKEY.  Boards without the line wired skip straight to probing.
fn toggle_power_key(hw: &mut impl ModemHardware, cfg: &ModemConfig) {
    if !hw.is_wired() {
        debug!("Modem: power key not wired, skipping toggle");
        return;
    }
    let [before, low, pulse, after] = cfg.power_key_settle_ms;
    hw.sleep_ms(before);
    hw.drive(false);
    hw.sleep_ms(low);
    hw.drive(true);
    hw.sleep_ms(pulse);
    hw.drive(false);
    hw.sleep_ms(after);
}
