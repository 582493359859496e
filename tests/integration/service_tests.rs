//! ModemService flows: arbitration, recovery and clock anchoring.

use simlink::app::events::{Functionality, LinkEvent, Subsystem};
use simlink::app::ports::{ChannelPair, StreamSink};
use simlink::app::service::ModemService;
use simlink::config::ModemConfig;
use simlink::error::{Error, TimeSyncError};
use simlink::gsm_time::VerificationTime;
use simlink::modem::{ModemState, SimStatus};

use crate::mock_hw::{MockChannel, MockModem, ModemCall, RecordingSink};

fn channels() -> ChannelPair<MockChannel, MockChannel> {
    ChannelPair::new(MockChannel::new(), MockChannel::new())
}

fn online() -> (ModemService, MockModem, RecordingSink) {
    let mut svc = ModemService::new(ModemConfig::default());
    let mut hw = MockModem::new();
    let mut sink = RecordingSink::new();
    hw.gprs_results = [true].into();
    svc.setup(&mut hw, &mut sink);
    assert_eq!(
        svc.connect_to_internet(false, &mut hw, &mut sink),
        SimStatus::InternetReady
    );
    hw.clear_calls();
    (svc, hw, sink)
}

// ── Arbitration ───────────────────────────────────────────────

#[test]
fn wait_until_available_brings_modem_up() {
    let mut svc = ModemService::new(ModemConfig::default());
    let mut hw = MockModem::new();
    let mut sink = RecordingSink::new();

    assert!(svc.wait_until_available("telemetry", 1_000, &mut hw, &mut sink));
    assert!(svc.session().is_initialized());
    assert_eq!(svc.state(), ModemState::NetworkAttach);
    assert_eq!(svc.session().arbiter().snapshot().owner, Some("telemetry"));
}

#[test]
fn second_owner_times_out_until_release() {
    let (mut svc, mut hw, mut sink) = online();

    assert!(svc.acquire("telemetry", &mut hw, &mut sink));
    let before = hw.now_ms;
    assert!(!svc.wait_until_available("weather", 1_000, &mut hw, &mut sink));
    assert!(hw.now_ms - before >= 1_000);
    assert_eq!(svc.session().arbiter().snapshot().owner, Some("telemetry"));

    svc.set_available(true);
    assert!(svc.wait_until_available("weather", 1_000, &mut hw, &mut sink));
}

#[test]
fn failed_setup_leaves_modem_closed() {
    let mut svc = ModemService::new(ModemConfig::default());
    let mut hw = MockModem::new();
    hw.begin_results = [false, false, false].into();
    let mut sink = RecordingSink::new();

    assert!(!svc.wait_until_available("telemetry", 500, &mut hw, &mut sink));
    assert_eq!(svc.state(), ModemState::Offline);
}

// ── Recovery ──────────────────────────────────────────────────

#[test]
fn refresh_stops_channels_clears_errors_and_settles() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();
    ch.data.write_error = -76;
    ch.weather.write_error = -1;
    let before = hw.now_ms;

    svc.refresh_connection("test", &mut hw, &mut ch, &mut sink);

    assert_eq!(ch.data.stops, 1);
    assert_eq!(ch.weather.stops, 1);
    assert_eq!(ch.data.write_error(), 0);
    assert_eq!(ch.weather.write_error(), 0);
    assert_eq!(
        hw.calls,
        vec![
            ModemCall::Sleep(500),
            ModemCall::StreamClear,
            ModemCall::Sleep(1500),
        ]
    );
    assert!(hw.now_ms - before >= 2_000);
    assert!(sink.contains(|e| *e == LinkEvent::ConnectionRefreshed { reason: "test" }));
}

#[test]
fn healthy_channel_passes_check() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();

    assert!(svc.check_channel(Subsystem::DataEndpoint, &mut hw, &mut ch, &mut sink));
    assert!(hw.calls.is_empty());
    assert_eq!(ch.data.stops, 0);
}

#[test]
fn broken_channel_triggers_refresh() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();
    ch.weather.write_error = -80;

    assert!(!svc.check_channel(Subsystem::WeatherEndpoint, &mut hw, &mut ch, &mut sink));
    assert_eq!(ch.weather.stops, 1);
    assert_eq!(ch.weather.write_error(), 0);
    assert_eq!(hw.count(&ModemCall::StreamClear), 1);
    assert!(sink.contains(|e| matches!(
        e,
        LinkEvent::Health {
            subsystem: Subsystem::WeatherEndpoint,
            functionality: Functionality::Offline,
            ..
        }
    )));
}

#[test]
fn disconnected_channel_triggers_refresh() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();
    ch.data.connected = false;

    assert!(!svc.check_channel(Subsystem::DataEndpoint, &mut hw, &mut ch, &mut sink));
    assert_eq!(ch.data.stops, 1);
}

// ── Clock ─────────────────────────────────────────────────────

#[test]
fn clock_sync_sets_both_channels() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();

    let vt = svc
        .update_clock_from_network(&mut hw, &mut ch, &mut sink)
        .unwrap();

    assert_eq!(vt.unix_seconds(), 1_676_559_803);
    assert_eq!(ch.data.verification, Some(vt));
    assert_eq!(ch.weather.verification, Some(vt));
    assert!(svc.session().is_clock_synced());
    assert!(sink.contains(|e| *e == LinkEvent::ClockSynced(vt)));
}

#[test]
fn rejected_timestamp_keeps_previous_time() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();
    let prior = VerificationTime {
        epoch_days: 19_000,
        seconds_of_day: 42,
    };
    ch.set_verification_time(prior);
    hw.date_time = Some("60/01/06,00:00:00+00");

    let err = svc
        .update_clock_from_network(&mut hw, &mut ch, &mut sink)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::TimeSync(TimeSyncError::ImplausibleYear(_))
    ));
    assert_eq!(ch.data.verification, Some(prior));
    assert_eq!(ch.weather.verification, Some(prior));
    assert!(!svc.session().is_clock_synced());
    assert!(sink.contains(|e| *e == LinkEvent::ClockRejected));
}

#[test]
fn missing_timestamp_is_reported() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();
    hw.date_time = None;

    assert_eq!(
        svc.update_clock_from_network(&mut hw, &mut ch, &mut sink),
        Err(Error::TimeSync(TimeSyncError::NoTimestamp))
    );
    assert_eq!(ch.data.verification, None);
}

#[test]
fn clock_sync_connects_first_when_bearer_down() {
    let mut svc = ModemService::new(ModemConfig::default());
    let mut hw = MockModem::new();
    let mut sink = RecordingSink::new();
    hw.gprs_results = [true].into();
    svc.setup(&mut hw, &mut sink);
    let mut ch = channels();

    svc.update_clock_from_network(&mut hw, &mut ch, &mut sink)
        .unwrap();
    assert_eq!(hw.gprs_attempts(), 1);
    assert_eq!(svc.state(), ModemState::InternetReady);
}

#[test]
fn power_down_forgets_clock_sync() {
    let (mut svc, mut hw, mut sink) = online();
    let mut ch = channels();
    svc.update_clock_from_network(&mut hw, &mut ch, &mut sink)
        .unwrap();

    svc.power_down(false, &mut hw, &mut sink);
    assert!(!svc.session().is_clock_synced());
    assert!(!svc.is_internet_connected(&mut hw));
}
