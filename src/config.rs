//! Link configuration parameters
//!
//! All tunable parameters for the modem link.
//! Values can be overridden via NVS or a JSON provisioning blob.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::stream::chunked::MAX_CHUNK_BYTES;

/// Network-mode / preferred-mode pair handed to the modem before a data
/// connect (`AT+CNMP` / `AT+CMNB` on SIMCom parts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioModes {
    pub network_mode: u8,
    pub preferred_mode: u8,
}

/// Core link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    // --- Serial ---
    /// Baud rate the AT link is opened at
    pub primary_baud: u32,
    /// Baud rate tried once the modem ignores the primary one
    pub fallback_baud: u32,

    // --- Network ---
    /// Access point name for the data bearer
    pub apn: heapless::String<32>,
    /// Modes used when LTE-M is preferred (also the fallback pair)
    pub lte_m_modes: RadioModes,
    /// Modes used for a balanced GPRS/LTE attach
    pub balanced_modes: RadioModes,
    /// Upper bound on waiting for network registration (milliseconds)
    pub network_attach_timeout_ms: u32,

    // --- Arbiter ---
    /// Availability poll interval (milliseconds)
    pub availability_poll_ms: u32,
    /// Default acquisition timeout (milliseconds)
    pub acquire_timeout_ms: u32,

    // --- Streaming ---
    /// Chunk size for in-memory bodies (transport write buffer)
    pub buffered_chunk_bytes: u16,
    /// Chunk size for incrementally produced bodies (source throughput)
    pub streaming_chunk_bytes: u16,

    // --- Settle delays (milliseconds) ---
    pub power_key_settle_ms: [u32; 4],
    pub power_off_settle_ms: u32,
    pub power_down_settle_ms: u32,
    pub refresh_pre_settle_ms: u32,
    pub refresh_post_settle_ms: u32,
}

impl Default for ModemConfig {
    fn default() -> Self {
        let mut apn = heapless::String::new();
        let _ = apn.push_str("em");

        Self {
            // Serial
            primary_baud: 115_200,
            fallback_baud: 9_600,

            // Network
            apn,
            lte_m_modes: RadioModes {
                network_mode: 38, // LTE only
                preferred_mode: 1, // CAT-M
            },
            balanced_modes: RadioModes {
                network_mode: 2, // automatic
                preferred_mode: 3, // CAT-M + NB-IoT
            },
            network_attach_timeout_ms: 3 * 60_000,

            // Arbiter
            availability_poll_ms: 100,
            acquire_timeout_ms: 30_000,

            // Streaming
            buffered_chunk_bytes: 1024,
            streaming_chunk_bytes: 1360,

            // Settle delays
            power_key_settle_ms: [2000, 2000, 1000, 1000],
            power_off_settle_ms: 500,
            power_down_settle_ms: 1000,
            refresh_pre_settle_ms: 500,
            refresh_post_settle_ms: 1500,
        }
    }
}

impl ModemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const BAUDS: [u32; 7] = [9_600, 19_200, 38_400, 57_600, 115_200, 230_400, 460_800];
        if !BAUDS.contains(&self.primary_baud) {
            return Err(ConfigError::ValidationFailed("primary_baud is not a standard rate"));
        }
        if !BAUDS.contains(&self.fallback_baud) {
            return Err(ConfigError::ValidationFailed("fallback_baud is not a standard rate"));
        }
        if self.apn.is_empty() {
            return Err(ConfigError::ValidationFailed("apn must not be empty"));
        }
        if !(10_000..=600_000).contains(&self.network_attach_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "network_attach_timeout_ms must be 10 000–600 000",
            ));
        }
        if !(10..=1_000).contains(&self.availability_poll_ms) {
            return Err(ConfigError::ValidationFailed("availability_poll_ms must be 10–1000"));
        }
        if self.acquire_timeout_ms < self.availability_poll_ms {
            return Err(ConfigError::ValidationFailed(
                "acquire_timeout_ms must cover at least one poll",
            ));
        }
        for chunk in [self.buffered_chunk_bytes, self.streaming_chunk_bytes] {
            if chunk == 0 || chunk as usize > MAX_CHUNK_BYTES {
                return Err(ConfigError::ValidationFailed("chunk sizes must be 1–1360 bytes"));
            }
        }
        // Holding the key high past ~1.2 s is read as a power-down request.
        if self.power_key_settle_ms[2] >= 1_200 {
            return Err(ConfigError::ValidationFailed("power key pulse must stay under 1200 ms"));
        }
        Ok(())
    }

    /// Parse a JSON provisioning blob and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
