//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] by keeping the postcard-encoded
//! [`ModemConfig`] as one blob in the `simlink` namespace.
//!
//! - Validation: [`ModemConfig::validate`] runs before every save, and a
//!   stored blob that no longer validates is treated as corrupted.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Provisioning: a JSON config written to the `provision` string key
//!   (by the factory tool or `nvs_partition_gen`) is validated, persisted
//!   as the blob and erased on the next boot.
//! - Host builds keep the blob in memory.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ModemConfig;
use crate::error::Error;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &[u8] = b"simlink\0";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &[u8] = b"modemcfg\0";
#[cfg(target_os = "espidf")]
const PROVISION_KEY: &[u8] = b"provision\0";

const MAX_BLOB_SIZE: usize = 512;
/// Largest provisioning JSON accepted, terminator included.
#[cfg(target_os = "espidf")]
const MAX_PROVISION_SIZE: usize = 1024;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
    #[cfg(not(target_os = "espidf"))]
    provision: std::cell::RefCell<Option<String>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: std::cell::RefCell::new(None),
            #[cfg(not(target_os = "espidf"))]
            provision: std::cell::RefCell::new(None),
        })
    }

    /// Apply a pending provisioning JSON.
    ///
    /// `Ok(None)` when nothing is pending.  The pending entry is consumed
    /// whether or not it validates, so a bad one is reported once.
    pub fn apply_provisioning(&self) -> crate::error::Result<Option<ModemConfig>> {
        let Some(json) = self.take_provisioning()? else {
            return Ok(None);
        };
        let cfg = ModemConfig::from_json(&json)?;
        self.save(&cfg)?;
        info!("NvsAdapter: provisioning applied (apn {})", cfg.apn);
        Ok(Some(cfg))
    }

    /// Stage a provisioning JSON the way the factory tool would.
    #[cfg(not(target_os = "espidf"))]
    pub fn stage_provisioning(&self, json: &str) {
        *self.provision.borrow_mut() = Some(json.to_owned());
    }

    #[cfg(not(target_os = "espidf"))]
    fn take_provisioning(&self) -> crate::error::Result<Option<String>> {
        Ok(self.provision.borrow_mut().take())
    }

    #[cfg(target_os = "espidf")]
    fn take_provisioning(&self) -> crate::error::Result<Option<String>> {
        let read = Self::with_handle(true, |handle| {
            let mut buf = vec![0u8; MAX_PROVISION_SIZE];
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_str(
                    handle,
                    PROVISION_KEY.as_ptr().cast(),
                    buf.as_mut_ptr().cast(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            // Drop the NUL terminator.
            buf.truncate(size.saturating_sub(1));
            let erased = unsafe { nvs_erase_key(handle, PROVISION_KEY.as_ptr().cast()) };
            if erased != ESP_OK || unsafe { nvs_commit(handle) } != ESP_OK {
                warn!("NvsAdapter: could not erase provisioning entry");
            }
            Ok(buf)
        });
        match read {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| Error::Config("provisioning is not UTF-8")),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: provisioning read error {}", e);
                Err(ConfigError::IoError.into())
            }
        }
    }

    fn decode(bytes: &[u8]) -> Result<ModemConfig, ConfigError> {
        let cfg: ModemConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate().map_err(|_| ConfigError::Corrupted)?;
        Ok(cfg)
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(
        write: bool,
        f: impl FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    ) -> Result<T, esp_err_t> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob() -> Result<Option<Vec<u8>>, esp_err_t> {
        let result = Self::with_handle(false, |handle| {
            let mut buf = vec![0u8; MAX_BLOB_SIZE];
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    CONFIG_KEY.as_ptr().cast(),
                    buf.as_mut_ptr().cast(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // A namespace that was never written cannot be opened read-only.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(bytes: &[u8]) -> Result<(), esp_err_t> {
        Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    CONFIG_KEY.as_ptr().cast(),
                    bytes.as_ptr().cast(),
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            match unsafe { nvs_commit(handle) } {
                ESP_OK => Ok(()),
                e => Err(e),
            }
        })
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ModemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        let stored = self.blob.borrow().clone();

        #[cfg(target_os = "espidf")]
        let stored = match Self::read_blob() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}, using defaults", e);
                None
            }
        };

        match stored {
            Some(bytes) => {
                let cfg = Self::decode(&bytes)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(ModemConfig::default())
            }
        }
    }

    fn save(&self, config: &ModemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            warn!("NvsAdapter: config blob too large ({} bytes)", bytes.len());
            return Err(ConfigError::IoError);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            *self.blob.borrow_mut() = Some(bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            match Self::write_blob(&bytes) {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
