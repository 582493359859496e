//! Hardware adapter: bridges the modem peripherals to the domain ports.
//!
//! Owns the AT driver, the PWRKEY line and the clock, exposing them as one
//! [`ModemHardware`](crate::app::ports::ModemHardware) value so the
//! service can take the whole board through a single `&mut`.

use crate::app::ports::{Clock, ModemDriver, PowerKey, SimCard};

/// Concrete adapter that combines the modem hardware behind port traits.
pub struct ModemHardwareAdapter<D, K, C> {
    driver: D,
    key: K,
    clock: C,
}

impl<D: ModemDriver, K: PowerKey, C: Clock> ModemHardwareAdapter<D, K, C> {
    pub fn new(driver: D, key: K, clock: C) -> Self {
        Self { driver, key, clock }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }
}

// ── ModemDriver implementation ────────────────────────────────

impl<D: ModemDriver, K, C> ModemDriver for ModemHardwareAdapter<D, K, C> {
    fn begin(&mut self, baud: u32) -> bool {
        self.driver.begin(baud)
    }

    fn test_at(&mut self) -> bool {
        self.driver.test_at()
    }

    fn restart(&mut self) -> bool {
        self.driver.restart()
    }

    fn power_off(&mut self) -> bool {
        self.driver.power_off()
    }

    fn is_network_connected(&mut self) -> bool {
        self.driver.is_network_connected()
    }

    fn is_gprs_connected(&mut self) -> bool {
        self.driver.is_gprs_connected()
    }

    fn wait_for_network(&mut self, timeout_ms: u32) -> bool {
        self.driver.wait_for_network(timeout_ms)
    }

    fn set_network_mode(&mut self, mode: u8) -> bool {
        self.driver.set_network_mode(mode)
    }

    fn set_preferred_mode(&mut self, mode: u8) -> bool {
        self.driver.set_preferred_mode(mode)
    }

    fn gprs_connect(&mut self, apn: &str) -> bool {
        self.driver.gprs_connect(apn)
    }

    fn sim_status(&mut self) -> SimCard {
        self.driver.sim_status()
    }

    fn modem_name(&mut self) -> heapless::String<32> {
        self.driver.modem_name()
    }

    fn gsm_date_time(&mut self) -> Option<heapless::String<32>> {
        self.driver.gsm_date_time()
    }

    fn set_phone_functionality(&mut self, level: u8) -> bool {
        self.driver.set_phone_functionality(level)
    }

    fn stream_clear(&mut self) {
        self.driver.stream_clear();
    }
}

// ── PowerKey implementation ───────────────────────────────────

impl<D, K: PowerKey, C> PowerKey for ModemHardwareAdapter<D, K, C> {
    fn is_wired(&self) -> bool {
        self.key.is_wired()
    }

    fn drive(&mut self, high: bool) {
        self.key.drive(high);
    }
}

// ── Clock implementation ──────────────────────────────────────

impl<D, K, C: Clock> Clock for ModemHardwareAdapter<D, K, C> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.clock.sleep_ms(ms);
    }
}
