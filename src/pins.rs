//! GPIO / peripheral pin assignments for the SimLink modem board.
//!
//! Single source of truth: the binary references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Modem UART (ESP32 side)
// ---------------------------------------------------------------------------

/// ESP32 RX, wired to the modem's TXD.
pub const SIM_RX_GPIO: i32 = 33;
/// ESP32 TX, wired to the modem's RXD.
pub const SIM_TX_GPIO: i32 = 32;
/// UART peripheral dedicated to the modem.
pub const SIM_UART_NUM: u8 = 1;

// ---------------------------------------------------------------------------
// Modem power
// ---------------------------------------------------------------------------

/// PWRKEY, through an NPN so the line idles low.
pub const SIM_POWER_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Reserved
// ---------------------------------------------------------------------------

/// Strapping pin left floating; never drive it.
pub const RESERVED_NOISE_GPIO: i32 = 0;

/// Serial monitor baud rate.
pub const MONITOR_BAUD: u32 = 115_200;
