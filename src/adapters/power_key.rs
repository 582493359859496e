//! Modem PWRKEY adapters.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::PowerKey;

/// PWRKEY driven from an MCU GPIO.
pub struct GpioPowerKey<P> {
    pin: P,
}

impl<P: OutputPin> GpioPowerKey<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> PowerKey for GpioPowerKey<P> {
    fn is_wired(&self) -> bool {
        true
    }

    fn drive(&mut self, high: bool) {
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = res {
            warn!("PowerKey: GPIO write failed: {:?}", e);
        }
    }
}

/// Boards where PWRKEY is tied off and the modem powers up on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPowerKey;

impl PowerKey for NoPowerKey {
    fn is_wired(&self) -> bool {
        false
    }

    fn drive(&mut self, _high: bool) {}
}
