//! ESP32 UART link to the modem.
//!
//! The UART driver is split: the TX half becomes the writer of the `atat`
//! client, the RX half feeds the [`SimcomIngress`] from a reader thread.
//! [`UartLine`] keeps the port number for baud switching and RX flushes.

use std::thread::{self, JoinHandle};

use atat::{AtatIngress, Config};
use esp_idf_hal::delay::TickType;
use esp_idf_hal::uart::{UartDriver, UartRxDriver, UartTxDriver};
use esp_idf_svc::sys::{
    esp, uart_flush_input, uart_get_buffered_data_len, uart_port_t, uart_set_baudrate,
};
use log::{info, warn};

use super::simcom::{
    INGRESS_BUF_SIZE, LineControl, SimcomClient, SimcomIngress, SimcomResponseSlot,
    SimcomUrcChannel, ingress,
};

/// How long one RX read waits for the first byte.
const RX_WAIT_MS: u64 = 20;
const INGRESS_STACK_SIZE: usize = 4096;

static RES_SLOT: SimcomResponseSlot = SimcomResponseSlot::new();
static URC_CHANNEL: SimcomUrcChannel = SimcomUrcChannel::new();

pub struct UartLine {
    port: uart_port_t,
    baud: u32,
}

impl UartLine {
    pub fn baud(&self) -> u32 {
        self.baud
    }
}

impl LineControl for UartLine {
    fn set_baud(&mut self, baud: u32) -> bool {
        if baud == self.baud {
            return true;
        }
        // SAFETY: the port was installed by the `UartDriver` this line came from.
        match esp!(unsafe { uart_set_baudrate(self.port, baud) }) {
            Ok(()) => {
                info!("UART: {} -> {} baud", self.baud, baud);
                self.baud = baud;
                true
            }
            Err(e) => {
                warn!("UART: baud change to {} failed: {}", baud, e);
                false
            }
        }
    }

    fn discard_input(&mut self) -> usize {
        let mut pending: usize = 0;
        // SAFETY: as above; `pending` outlives the call.
        unsafe {
            uart_get_buffered_data_len(self.port, &mut pending);
            uart_flush_input(self.port);
        }
        pending
    }
}

/// Split `uart` into the AT client and its line control, and start the
/// reader thread that feeds replies back to the client.
///
/// Call once: the response slot and URC channel are process-wide.
pub fn open_at_link(
    uart: UartDriver<'static>,
    baud: u32,
) -> anyhow::Result<(SimcomClient<'static, UartTxDriver<'static>>, UartLine)> {
    let line = UartLine {
        port: uart.port(),
        baud,
    };
    let (tx, rx) = uart.into_split();

    let ingress_buf = Box::leak(Box::new([0u8; INGRESS_BUF_SIZE]));
    let client_buf = Box::leak(Box::new([0u8; INGRESS_BUF_SIZE]));

    spawn_ingress(rx, ingress(ingress_buf, &RES_SLOT, &URC_CHANNEL))?;
    let client = SimcomClient::new(tx, &RES_SLOT, client_buf, Config::default());
    Ok((client, line))
}

fn spawn_ingress(
    rx: UartRxDriver<'static>,
    ingress: SimcomIngress<'static>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("at-ingress".into())
        .stack_size(INGRESS_STACK_SIZE)
        .spawn(move || pump(rx, ingress))
}

fn pump(rx: UartRxDriver<'static>, mut ingress: SimcomIngress<'static>) {
    let ticks = TickType::new_millis(RX_WAIT_MS).ticks();
    loop {
        let buf = ingress.write_buf();
        match rx.read(buf, ticks) {
            Ok(0) => {}
            Ok(n) => {
                if let Err(e) = ingress.try_advance(n) {
                    warn!("UART: ingress rejected {} bytes: {:?}", n, e);
                }
            }
            Err(e) => warn!("UART: read failed: {}", e),
        }
    }
}
