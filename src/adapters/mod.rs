//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements          | Connects to                 |
//! |------------------|---------------------|-----------------------------|
//! | `hardware`       | ModemDriver         | bundled driver, key, clock  |
//! |                  | PowerKey, Clock     |                             |
//! | `log_sink`       | EventSink           | Serial log output           |
//! | `nvs`            | ConfigPort          | NVS / in-memory store       |
//! | `power_key`      | PowerKey            | embedded-hal output pin     |
//! | `secure_channel` | SecureChannel       | TLS session over Transport  |
//! | `simcom`         | ModemDriver         | SIMCom AT commands via atat |
//! | `time`           | Clock               | ESP32 system timer          |
//! | `uart`           | LineControl         | ESP32 UART (device only)    |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod power_key;
pub mod secure_channel;
pub mod simcom;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
