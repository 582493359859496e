//! Mock modem hardware for integration tests.
//!
//! Records every driver, power-key and sleep call so tests can assert on
//! the full command history without a UART.  Time is virtual: `sleep_ms`
//! and blocking driver calls advance it instantly.

use std::collections::VecDeque;

use simlink::app::events::LinkEvent;
use simlink::app::ports::{
    Clock, EventSink, ModemDriver, PowerKey, SecureChannel, SimCard, StreamSink,
};
use simlink::gsm_time::VerificationTime;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ModemCall {
    Begin(u32),
    TestAt,
    Restart,
    PowerOff,
    WaitForNetwork(u32),
    SetNetworkMode(u8),
    SetPreferredMode(u8),
    GprsConnect(String),
    SetPhoneFunctionality(u8),
    StreamClear,
    Drive(bool),
    Sleep(u32),
}

// ── MockModem ─────────────────────────────────────────────────

pub struct MockModem {
    pub calls: Vec<ModemCall>,
    pub now_ms: u64,
    pub wired: bool,

    /// Scripted `begin` results; an empty queue answers `true`.
    pub begin_results: VecDeque<bool>,
    pub at_alive: bool,
    pub sim: SimCard,
    pub network_connected: bool,
    pub network_arrives: bool,
    pub gprs_connected: bool,
    /// Scripted `gprs_connect` results; an empty queue answers `false`.
    pub gprs_results: VecDeque<bool>,
    pub date_time: Option<&'static str>,
    pub pending_rx: usize,
}

#[allow(dead_code)]
impl MockModem {
    /// A healthy modem with a SIM, not yet registered.
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            now_ms: 0,
            wired: true,
            begin_results: VecDeque::new(),
            at_alive: true,
            sim: SimCard::Ready,
            network_connected: false,
            network_arrives: true,
            gprs_connected: false,
            gprs_results: VecDeque::new(),
            date_time: Some("23/02/16,16:03:23+04"),
            pending_rx: 0,
        }
    }

    pub fn count(&self, call: &ModemCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn count_where(&self, f: impl Fn(&ModemCall) -> bool) -> usize {
        self.calls.iter().filter(|c| f(c)).count()
    }

    pub fn restarts(&self) -> usize {
        self.count(&ModemCall::Restart)
    }

    pub fn gprs_attempts(&self) -> usize {
        self.count_where(|c| matches!(c, ModemCall::GprsConnect(_)))
    }

    pub fn position(&self, call: &ModemCall) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    /// Calls recorded after the first occurrence of `call`.
    pub fn calls_after(&self, call: &ModemCall) -> &[ModemCall] {
        match self.position(call) {
            Some(i) => &self.calls[i + 1..],
            None => &[],
        }
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockModem {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemDriver for MockModem {
    fn begin(&mut self, baud: u32) -> bool {
        self.calls.push(ModemCall::Begin(baud));
        self.begin_results.pop_front().unwrap_or(true)
    }

    fn test_at(&mut self) -> bool {
        self.calls.push(ModemCall::TestAt);
        self.at_alive
    }

    fn restart(&mut self) -> bool {
        self.calls.push(ModemCall::Restart);
        true
    }

    fn power_off(&mut self) -> bool {
        self.calls.push(ModemCall::PowerOff);
        self.network_connected = false;
        self.gprs_connected = false;
        true
    }

    fn is_network_connected(&mut self) -> bool {
        self.network_connected
    }

    fn is_gprs_connected(&mut self) -> bool {
        self.gprs_connected
    }

    fn wait_for_network(&mut self, timeout_ms: u32) -> bool {
        self.calls.push(ModemCall::WaitForNetwork(timeout_ms));
        if self.network_arrives {
            self.network_connected = true;
            self.now_ms += 1_000;
        } else {
            self.now_ms += u64::from(timeout_ms);
        }
        self.network_arrives
    }

    fn set_network_mode(&mut self, mode: u8) -> bool {
        self.calls.push(ModemCall::SetNetworkMode(mode));
        true
    }

    fn set_preferred_mode(&mut self, mode: u8) -> bool {
        self.calls.push(ModemCall::SetPreferredMode(mode));
        true
    }

    fn gprs_connect(&mut self, apn: &str) -> bool {
        self.calls.push(ModemCall::GprsConnect(apn.to_string()));
        let ok = self.gprs_results.pop_front().unwrap_or(false);
        self.gprs_connected = ok;
        ok
    }

    fn sim_status(&mut self) -> SimCard {
        self.sim
    }

    fn modem_name(&mut self) -> heapless::String<32> {
        let mut s = heapless::String::new();
        s.push_str("SIMCOM_SIM7000G").unwrap();
        s
    }

    fn gsm_date_time(&mut self) -> Option<heapless::String<32>> {
        self.date_time.map(|t| {
            let mut s = heapless::String::new();
            s.push_str(t).unwrap();
            s
        })
    }

    fn set_phone_functionality(&mut self, level: u8) -> bool {
        self.calls.push(ModemCall::SetPhoneFunctionality(level));
        true
    }

    fn stream_clear(&mut self) {
        self.calls.push(ModemCall::StreamClear);
        self.pending_rx = 0;
    }
}

impl PowerKey for MockModem {
    fn is_wired(&self) -> bool {
        self.wired
    }

    fn drive(&mut self, high: bool) {
        self.calls.push(ModemCall::Drive(high));
    }
}

impl Clock for MockModem {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.calls.push(ModemCall::Sleep(ms));
        self.now_ms += u64::from(ms);
    }
}

// ── MockChannel ───────────────────────────────────────────────

/// Secured channel double: records writes and can be told to fail.
pub struct MockChannel {
    pub written: Vec<u8>,
    pub writes: usize,
    pub connected: bool,
    pub write_error: i32,
    pub stops: usize,
    pub verification: Option<VerificationTime>,
    /// Latch this error code on the write with this index.
    pub fail_on_write: Option<(usize, i32)>,
}

#[allow(dead_code)]
impl MockChannel {
    pub fn new() -> Self {
        Self {
            written: Vec::new(),
            writes: 0,
            connected: true,
            write_error: 0,
            stops: 0,
            verification: None,
            fail_on_write: None,
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink for MockChannel {
    fn write(&mut self, buf: &[u8]) -> usize {
        if let Some((idx, code)) = self.fail_on_write {
            if idx == self.writes {
                self.write_error = code;
            }
        }
        self.writes += 1;
        self.written.extend_from_slice(buf);
        buf.len()
    }

    fn write_error(&self) -> i32 {
        self.write_error
    }
}

impl SecureChannel for MockChannel {
    fn connected(&self) -> bool {
        self.connected
    }

    fn clear_write_error(&mut self) {
        self.write_error = 0;
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.connected = false;
    }

    fn set_verification_time(&mut self, time: VerificationTime) {
        self.verification = Some(time);
    }

    fn verification_time(&self) -> Option<VerificationTime> {
        self.verification
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<LinkEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, f: impl Fn(&LinkEvent) -> bool) -> bool {
        self.events.iter().any(f)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LinkEvent) {
        self.events.push(event.clone());
    }
}
