//! SIMCom AT command driver (SIM7000 / SIM7070 / SIM7600 family).
//!
//! Implements [`ModemDriver`] on top of an `atat` blocking client.  The
//! client owns the TX half of the serial link and waits on a response slot;
//! an [`Ingress`] fed from the RX half digests replies and URCs into it.
//! [`LineControl`] covers what the AT layer cannot reach: the local UART
//! baud rate and its receive FIFO.
//!
//! ```text
//!  ──▶ AT+CPIN?\r\n
//!  ◀── \r\n+CPIN: READY\r\n\r\nOK\r\n
//! ```

pub mod commands;
pub mod responses;
pub mod urc;

use atat::blocking::{AtatClient, Client};
use atat::{AtatCmd, DefaultDigester, Ingress, ResponseSlot, UrcChannel};
use log::{debug, warn};

use crate::app::ports::{Clock, ModemDriver, SimCard};
use commands::{
    At, EchoOff, GetAttachState, GetClock, GetModelId, GetNetworkRegistration, GetPinStatus,
    PowerOff, Reset, SetAttachState, SetErrorReporting, SetFunctionality, SetNetworkMode,
    SetPdpActivation, SetPdpContext, SetPreferredMode,
};
use responses::PinStatusCode;
use urc::Urc;

/// Size of the ingress buffer and of the largest response the client holds.
pub const INGRESS_BUF_SIZE: usize = 256;
pub const URC_CAPACITY: usize = 4;
pub const URC_SUBSCRIBERS: usize = 1;

pub type SimcomIngress<'a> =
    Ingress<'a, DefaultDigester<Urc>, Urc, INGRESS_BUF_SIZE, URC_CAPACITY, URC_SUBSCRIBERS>;
pub type SimcomClient<'a, W> = Client<'a, W, INGRESS_BUF_SIZE>;
pub type SimcomResponseSlot = ResponseSlot<INGRESS_BUF_SIZE>;
pub type SimcomUrcChannel = UrcChannel<Urc, URC_CAPACITY, URC_SUBSCRIBERS>;

/// Build the ingress side that pairs with a [`SimcomClient`] on `res_slot`.
pub fn ingress<'a>(
    buf: &'a mut [u8; INGRESS_BUF_SIZE],
    res_slot: &'a SimcomResponseSlot,
    urc_channel: &'a SimcomUrcChannel,
) -> SimcomIngress<'a> {
    Ingress::new(DefaultDigester::<Urc>::default(), buf, res_slot, urc_channel)
}

/// Local side of the serial line.
pub trait LineControl {
    /// Reconfigure the local UART.  The modem auto-bauds on the next `AT`.
    fn set_baud(&mut self, baud: u32) -> bool;

    /// Drop received bytes nobody asked for.  Returns how many went.
    fn discard_input(&mut self) -> usize;
}

// Network registration status codes
const REGISTERED_HOME: u8 = 1;
const REGISTERED_ROAMING: u8 = 5;

/// Time for the modem to reboot after `AT+CRESET` before it answers again.
const RESTART_SETTLE_MS: u32 = 5_000;
const REGISTRATION_POLL_MS: u32 = 250;
/// `AT` attempts made by `test_at` before giving up.
const TEST_AT_TRIES: u8 = 3;
/// Verbose `+CME ERROR` text.
const CMEE_VERBOSE: u8 = 2;
const PDP_CID: u8 = 1;

pub struct SimcomModem<A, L, C> {
    client: A,
    line: L,
    clock: C,
}

impl<A: AtatClient, L: LineControl, C: Clock> SimcomModem<A, L, C> {
    pub fn new(client: A, line: L, clock: C) -> Self {
        Self {
            client,
            line,
            clock,
        }
    }

    pub fn line(&mut self) -> &mut L {
        &mut self.line
    }

    fn send<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> Option<Cmd::Response> {
        match self.client.send(cmd) {
            Ok(resp) => Some(resp),
            Err(e) => {
                debug!("SIMCOM: command failed: {:?}", e);
                None
            }
        }
    }

    fn ok<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> bool {
        self.send(cmd).is_some()
    }
}

impl<A: AtatClient, L: LineControl, C: Clock> ModemDriver for SimcomModem<A, L, C> {
    fn begin(&mut self, baud: u32) -> bool {
        if !self.line.set_baud(baud) {
            warn!("SIMCOM: UART rejected {} baud", baud);
            return false;
        }
        self.line.discard_input();
        if !self.test_at() {
            return false;
        }
        // Not fatal.
        self.ok(&EchoOff);
        self.ok(&SetErrorReporting { mode: CMEE_VERBOSE });
        true
    }

    fn test_at(&mut self) -> bool {
        (0..TEST_AT_TRIES).any(|_| self.ok(&At))
    }

    fn restart(&mut self) -> bool {
        if !self.ok(&Reset) {
            warn!("SIMCOM: reset command not acknowledged");
        }
        self.clock.sleep_ms(RESTART_SETTLE_MS);
        self.line.discard_input();
        self.test_at()
    }

    fn power_off(&mut self) -> bool {
        self.ok(&PowerOff)
    }

    fn is_network_connected(&mut self) -> bool {
        self.send(&GetNetworkRegistration)
            .is_some_and(|r| matches!(r.stat, REGISTERED_HOME | REGISTERED_ROAMING))
    }

    fn is_gprs_connected(&mut self) -> bool {
        self.send(&GetAttachState).is_some_and(|a| a.state == 1)
    }

    fn wait_for_network(&mut self, timeout_ms: u32) -> bool {
        let started = self.clock.now_ms();
        loop {
            if self.is_network_connected() {
                return true;
            }
            if self.clock.now_ms().saturating_sub(started) >= u64::from(timeout_ms) {
                return false;
            }
            self.clock.sleep_ms(REGISTRATION_POLL_MS);
        }
    }

    fn set_network_mode(&mut self, mode: u8) -> bool {
        self.ok(&SetNetworkMode { mode })
    }

    fn set_preferred_mode(&mut self, mode: u8) -> bool {
        self.ok(&SetPreferredMode { mode })
    }

    fn gprs_connect(&mut self, apn: &str) -> bool {
        let Some(context) = SetPdpContext::ip(PDP_CID, apn) else {
            warn!("SIMCOM: APN too long");
            return false;
        };
        self.ok(&context)
            && self.ok(&SetAttachState { state: 1 })
            && self.ok(&SetPdpActivation {
                state: 1,
                cid: PDP_CID,
            })
            && self.is_gprs_connected()
    }

    fn sim_status(&mut self) -> SimCard {
        match self.send(&GetPinStatus).map(|s| s.code) {
            Some(PinStatusCode::Ready) => SimCard::Ready,
            Some(PinStatusCode::NotInserted | PinStatusCode::NotReady) | None => SimCard::Missing,
            Some(_) => SimCard::Locked,
        }
    }

    fn modem_name(&mut self) -> heapless::String<32> {
        match self.send(&GetModelId) {
            Some(id) if !id.model.is_empty() => id.model,
            _ => {
                let mut name = heapless::String::new();
                let _ = name.push_str("SIMCOM");
                name
            }
        }
    }

    fn gsm_date_time(&mut self) -> Option<heapless::String<32>> {
        self.send(&GetClock).map(|t| t.time)
    }

    fn set_phone_functionality(&mut self, level: u8) -> bool {
        self.ok(&SetFunctionality { fun: level })
    }

    fn stream_clear(&mut self) {
        let n = self.line.discard_input();
        if n > 0 {
            debug!("SIMCOM: discarded {} pending bytes", n);
        }
    }
}
