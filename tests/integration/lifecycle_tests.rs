//! Modem lifecycle against the recording mock: power key, AT ladder, SIM
//! check, bearer attach and power down.

use simlink::app::events::{Functionality, LinkEvent, Subsystem};
use simlink::app::ports::SimCard;
use simlink::config::ModemConfig;
use simlink::error::{Error, InitError};
use simlink::modem::{ModemSession, ModemState, SimStatus};

use crate::mock_hw::{MockModem, ModemCall, RecordingSink};

fn session() -> (ModemSession, ModemConfig, MockModem, RecordingSink) {
    (
        ModemSession::default(),
        ModemConfig::default(),
        MockModem::new(),
        RecordingSink::new(),
    )
}

// ── AT ladder ─────────────────────────────────────────────────

#[test]
fn probe_succeeds_first_time() {
    let (mut s, cfg, mut hw, mut sink) = session();

    assert_eq!(s.initialize(&mut hw, &cfg, &mut sink), Ok(()));
    assert!(s.is_initialized());
    assert_eq!(s.attempts().get(), 0);
    assert_eq!(hw.restarts(), 0);
    assert_eq!(s.state(), ModemState::SimCheck);
    assert!(s.arbiter().is_available());
}

fn probed_bauds(hw: &MockModem) -> Vec<u32> {
    hw.calls
        .iter()
        .filter_map(|c| match c {
            ModemCall::Begin(b) => Some(*b),
            _ => None,
        })
        .collect()
}

fn reported_offline(sink: &RecordingSink) -> bool {
    sink.contains(|e| {
        matches!(
            e,
            LinkEvent::Health {
                subsystem: Subsystem::Modem,
                functionality: Functionality::Offline,
                ..
            }
        )
    })
}

#[test]
fn probe_succeeds_on_second_attempt_after_one_restart() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.begin_results = [false, true].into();

    assert_eq!(s.initialize(&mut hw, &cfg, &mut sink), Ok(()));
    assert_eq!(s.attempts().get(), 1);
    assert_eq!(hw.restarts(), 1);

    // One restart is not enough to give up on the primary rate.
    assert_eq!(probed_bauds(&hw), vec![cfg.primary_baud, cfg.primary_baud]);
    assert!(!reported_offline(&sink));
}

#[test]
fn third_probe_uses_fallback_baud() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.begin_results = [false, false, true].into();

    assert_eq!(s.initialize(&mut hw, &cfg, &mut sink), Ok(()));
    assert_eq!(hw.restarts(), 2);
    assert_eq!(
        probed_bauds(&hw),
        vec![cfg.primary_baud, cfg.primary_baud, cfg.fallback_baud]
    );
    // Offline is reported on the way down to the fallback rate.
    assert!(reported_offline(&sink));
    assert!(s.is_initialized());
}

#[test]
fn three_silent_probes_fail_offline() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.begin_results = [false, false, false].into();

    let err = s.initialize(&mut hw, &cfg, &mut sink).unwrap_err();
    assert_eq!(
        err,
        Error::Init(InitError::AtProbeExhausted { attempts: 3 })
    );
    assert_eq!(
        probed_bauds(&hw),
        vec![cfg.primary_baud, cfg.primary_baud, cfg.fallback_baud]
    );
    assert_eq!(hw.restarts(), 2);
    assert_eq!(s.state(), ModemState::Offline);
    assert!(!s.is_initialized());
    assert!(!s.arbiter().is_available());
    assert!(reported_offline(&sink));
}

#[test]
fn initialize_is_idempotent() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.initialize(&mut hw, &cfg, &mut sink).unwrap();
    hw.clear_calls();

    s.initialize(&mut hw, &cfg, &mut sink).unwrap();
    assert!(hw.calls.is_empty());
}

#[test]
fn registered_modem_is_adopted_without_probing() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.network_connected = true;

    s.initialize(&mut hw, &cfg, &mut sink).unwrap();
    assert!(s.is_initialized());
    assert_eq!(hw.count_where(|c| matches!(c, ModemCall::Begin(_))), 0);
    assert_eq!(hw.count_where(|c| matches!(c, ModemCall::Drive(_))), 0);
}

// ── Power key ─────────────────────────────────────────────────

#[test]
fn power_key_pulse_precedes_first_probe() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.initialize(&mut hw, &cfg, &mut sink).unwrap();

    assert_eq!(
        &hw.calls[..8],
        &[
            ModemCall::Sleep(2000),
            ModemCall::Drive(false),
            ModemCall::Sleep(2000),
            ModemCall::Drive(true),
            ModemCall::Sleep(1000),
            ModemCall::Drive(false),
            ModemCall::Sleep(1000),
            ModemCall::Begin(cfg.primary_baud),
        ]
    );
}

#[test]
fn unwired_power_key_goes_straight_to_probe() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.wired = false;
    s.initialize(&mut hw, &cfg, &mut sink).unwrap();

    assert_eq!(hw.calls[0], ModemCall::Begin(cfg.primary_baud));
}

// ── Setup ─────────────────────────────────────────────────────

#[test]
fn setup_reports_no_network_when_ready_to_attach() {
    let (mut s, cfg, mut hw, mut sink) = session();

    assert_eq!(s.setup(&mut hw, &cfg, &mut sink), SimStatus::NoNetwork);
    assert_eq!(s.state(), ModemState::NetworkAttach);
    assert_eq!(hw.count(&ModemCall::SetPhoneFunctionality(1)), 1);
}

#[test]
fn setup_reports_failed_to_at() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.begin_results = [false, false, false].into();

    assert_eq!(s.setup(&mut hw, &cfg, &mut sink), SimStatus::FailedToAt);
    assert_eq!(s.state(), ModemState::Offline);
}

#[test]
fn setup_reports_missing_or_locked_sim() {
    for card in [SimCard::Missing, SimCard::Locked] {
        let (mut s, cfg, mut hw, mut sink) = session();
        hw.sim = card;

        assert_eq!(s.setup(&mut hw, &cfg, &mut sink), SimStatus::NoSimCard);
        assert_eq!(s.state(), ModemState::Offline);
        assert_eq!(hw.count(&ModemCall::SetPhoneFunctionality(1)), 0);
    }
}

#[test]
fn connect_rechecks_sim_after_setup_found_none() {
    let (mut s, cfg, mut hw, mut sink) = session();
    hw.sim = SimCard::Missing;
    assert_eq!(s.setup(&mut hw, &cfg, &mut sink), SimStatus::NoSimCard);
    hw.clear_calls();

    // Still no SIM: the AT link is fine, so the SIM is what gets reported.
    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::NoSimCard
    );
    assert_eq!(hw.count(&ModemCall::TestAt), 1);
    assert_eq!(hw.gprs_attempts(), 0);

    // SIM inserted since: connect carries on to the bearer.
    hw.sim = SimCard::Ready;
    hw.gprs_results = [true].into();
    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::InternetReady
    );
    assert_eq!(s.state(), ModemState::InternetReady);
}

// ── Connect ───────────────────────────────────────────────────

#[test]
fn connect_without_at_link_fails_fast() {
    let (mut s, cfg, mut hw, mut sink) = session();

    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::FailedToAt
    );
    assert_eq!(hw.gprs_attempts(), 0);
}

#[test]
fn connect_reaches_internet_on_first_bearer() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    hw.gprs_results = [true].into();

    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::InternetReady
    );
    assert_eq!(s.state(), ModemState::InternetReady);
    assert_eq!(hw.gprs_attempts(), 1);
    assert_eq!(hw.count(&ModemCall::SetNetworkMode(2)), 1);
    assert!(s.arbiter().is_available());
}

#[test]
fn connect_falls_back_to_lte_m_once() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    hw.gprs_results = [false, true].into();

    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::InternetReady
    );
    assert_eq!(hw.gprs_attempts(), 2);

    let first = hw
        .position(&ModemCall::GprsConnect(cfg.apn.to_string()))
        .unwrap();
    let lte_m = &hw.calls[first + 1..];
    assert!(lte_m.contains(&ModemCall::SetNetworkMode(cfg.lte_m_modes.network_mode)));
    assert!(lte_m.contains(&ModemCall::SetPreferredMode(
        cfg.lte_m_modes.preferred_mode
    )));
}

#[test]
fn connect_makes_at_most_two_bearer_attempts() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);

    assert_eq!(
        s.connect_to_internet(true, &mut hw, &cfg, &mut sink),
        SimStatus::NoInternet
    );
    assert_eq!(hw.gprs_attempts(), 2);
    assert_ne!(s.state(), ModemState::InternetReady);
}

#[test]
fn connect_times_out_waiting_for_network() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    hw.network_arrives = false;
    let before = hw.now_ms;

    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::NoNetwork
    );
    assert_eq!(
        hw.count(&ModemCall::WaitForNetwork(cfg.network_attach_timeout_ms)),
        1
    );
    assert_eq!(hw.gprs_attempts(), 0);
    assert!(hw.now_ms - before >= u64::from(cfg.network_attach_timeout_ms));
    assert!(sink.contains(|e| matches!(
        e,
        LinkEvent::Health {
            subsystem: Subsystem::Modem,
            functionality: Functionality::Partial,
            ..
        }
    )));
}

#[test]
fn connect_with_live_bearer_skips_attach() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    hw.gprs_connected = true;

    assert_eq!(
        s.connect_to_internet(false, &mut hw, &cfg, &mut sink),
        SimStatus::InternetReady
    );
    assert_eq!(hw.gprs_attempts(), 0);
}

// ── Power down ────────────────────────────────────────────────

#[test]
fn power_down_closes_session() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    hw.clear_calls();

    assert!(s.power_down(false, &mut hw, &cfg, &mut sink));
    assert_eq!(
        hw.calls,
        vec![
            ModemCall::PowerOff,
            ModemCall::Sleep(500),
            ModemCall::Drive(false),
            ModemCall::Sleep(1000),
        ]
    );
    assert_eq!(s.state(), ModemState::Uninitialized);
    assert!(!s.is_initialized());
    assert!(!s.arbiter().is_available());
}

#[test]
fn power_down_restart_variant() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    hw.clear_calls();

    assert!(s.power_down(true, &mut hw, &cfg, &mut sink));
    assert_eq!(hw.calls, vec![ModemCall::Restart, ModemCall::Sleep(1000)]);
}

#[test]
fn setup_after_power_down_probes_again() {
    let (mut s, cfg, mut hw, mut sink) = session();
    s.setup(&mut hw, &cfg, &mut sink);
    s.power_down(false, &mut hw, &cfg, &mut sink);
    hw.clear_calls();

    assert_eq!(s.setup(&mut hw, &cfg, &mut sink), SimStatus::NoNetwork);
    assert_eq!(hw.count(&ModemCall::Begin(cfg.primary_baud)), 1);
}
