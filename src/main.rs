//! SimLink Firmware: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimcomModem<atat>      GpioPowerKey  Esp32Clock  NvsAdapter │
//! │  ModemChannel ×2        LogEventSink                         │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            ModemService (pure logic)                   │  │
//! │  │  lifecycle · arbiter · chunked streamer · GSM time     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use simlink::adapters::hardware::ModemHardwareAdapter;
use simlink::adapters::log_sink::LogEventSink;
use simlink::adapters::nvs::NvsAdapter;
use simlink::adapters::power_key::GpioPowerKey;
use simlink::adapters::secure_channel::ModemChannel;
use simlink::adapters::simcom::SimcomModem;
use simlink::adapters::time::Esp32Clock;
use simlink::adapters::uart::open_at_link;
use simlink::app::ports::{ChannelPair, Clock, ConfigPort};
use simlink::app::service::ModemService;
use simlink::config::ModemConfig;
use simlink::modem::SimStatus;
use simlink::pins;
use simlink::transport::NullTransport;

/// Delay between connect attempts while waiting for a bearer.
const CONNECT_RETRY_MS: u32 = 2_000;
/// Interval of the link heartbeat.
const HEARTBEAT_MS: u32 = 60_000;

/// Stored config, with a pending provisioning JSON applied first.
fn load_config() -> ModemConfig {
    let nvs = match NvsAdapter::new() {
        Ok(nvs) => nvs,
        Err(e) => {
            warn!("NVS unavailable ({}), using defaults", e);
            return ModemConfig::default();
        }
    };
    match nvs.apply_provisioning() {
        Ok(Some(cfg)) => return cfg,
        Ok(None) => {}
        Err(e) => error!("Provisioning rejected: {}", e),
    }
    nvs.load().unwrap_or_else(|e| {
        warn!("NVS config unavailable ({}), using defaults", e);
        ModemConfig::default()
    })
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SimLink v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = load_config();

    // ── 3. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    info!(
        "Modem on UART{} (rx={}, tx={}, pwrkey={})",
        pins::SIM_UART_NUM,
        pins::SIM_RX_GPIO,
        pins::SIM_TX_GPIO,
        pins::SIM_POWER_GPIO
    );
    // SAFETY: these GPIOs are claimed nowhere else; `peripherals.pins` is
    // never touched.
    let (tx, rx, pwrkey) = unsafe {
        (
            AnyIOPin::new(pins::SIM_TX_GPIO),
            AnyIOPin::new(pins::SIM_RX_GPIO),
            AnyOutputPin::new(pins::SIM_POWER_GPIO),
        )
    };
    let uart = UartDriver::new(
        peripherals.uart1,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(config.primary_baud)),
    )?;
    let (client, line) = open_at_link(uart, config.primary_baud)?;
    let pwrkey = PinDriver::output(pwrkey)?;

    let mut hw = ModemHardwareAdapter::new(
        SimcomModem::new(client, line, Esp32Clock::new()),
        GpioPowerKey::new(pwrkey),
        Esp32Clock::new(),
    );
    let mut sink = LogEventSink::new();

    // The TLS engines attach their sessions here; until then the channels
    // only carry the verification-time anchor.
    let mut channels = ChannelPair::new(
        ModemChannel::new("data", NullTransport),
        ModemChannel::new("weather", NullTransport),
    );

    let mut service = ModemService::new(config);

    // ── 4. Bring the modem up ─────────────────────────────────
    match service.setup(&mut hw, &mut sink) {
        status @ (SimStatus::FailedToAt | SimStatus::NoSimCard) => {
            error!("Modem setup failed: {}. Powering down and halting.", status);
            service.power_down(false, &mut hw, &mut sink);
            loop {
                hw.sleep_ms(HEARTBEAT_MS);
            }
        }
        status => info!("Modem setup: {}", status),
    }

    while service.connect_to_internet(false, &mut hw, &mut sink) != SimStatus::InternetReady {
        warn!("Modem: no bearer yet, retrying");
        hw.sleep_ms(CONNECT_RETRY_MS);
    }

    if let Err(e) = service.update_clock_from_network(&mut hw, &mut channels, &mut sink) {
        warn!("Clock sync deferred: {}", e);
    }

    info!("Link ready. Entering heartbeat loop.");

    // ── 5. Heartbeat ──────────────────────────────────────────
    loop {
        hw.sleep_ms(HEARTBEAT_MS);

        if !service.acquire("heartbeat", &mut hw, &mut sink) {
            warn!("Heartbeat: modem busy, skipping");
            continue;
        }
        if !service.is_internet_connected(&mut hw) {
            let status = service.connect_to_internet(false, &mut hw, &mut sink);
            info!("Heartbeat: reconnect -> {}", status);
        }
        if !service.session().is_clock_synced() {
            if let Err(e) = service.update_clock_from_network(&mut hw, &mut channels, &mut sink) {
                warn!("Heartbeat: clock sync failed: {}", e);
            }
        }
        service.set_available(true);
    }
}
