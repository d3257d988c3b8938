//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`BaselineStore`] and [`ConfigPort`] for the CO monitor.
//!
//! | Namespace | Key           | Contents                          |
//! |-----------|---------------|-----------------------------------|
//! | `envmon`  | `mq7_r0`      | R0 in ohms, `f32` little-endian   |
//! | `envmon`  | `monitor_cfg` | [`MonitorConfig`] as postcard     |
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Degraded mode: if the partition cannot be initialised the adapter is
//!   built [`detached`](NvsAdapter::detached); every write fails with
//!   [`StorageError::Unavailable`] and reads behave as "nothing stored",
//!   so the monitor keeps running on in-session state.

use core::ffi::CStr;

use log::{info, warn};

use crate::app::ports::{BaselineStore, ConfigError, ConfigPort, StorageError};
use crate::config::MonitorConfig;

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
use std::collections::HashMap;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use esp_idf_svc::sys::*;

const NAMESPACE: &CStr = c"envmon";
const BASELINE_KEY: &CStr = c"mq7_r0";
const CONFIG_KEY: &CStr = c"monitor_cfg";

#[cfg(all(target_os = "espidf", feature = "espidf"))]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    available: bool,
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(all(target_os = "espidf", feature = "espidf"))]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as esp_err_t {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            available: true,
            #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// An adapter with no backing partition (in-session operation only).
    pub fn detached() -> Self {
        warn!("NvsAdapter: storage unavailable, calibration will not survive reboot");
        Self {
            available: false,
            #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
            store: std::cell::RefCell::new(HashMap::new()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    // ── Blob primitives ──────────────────────────────────────

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn composite_key(namespace: &CStr, key: &CStr) -> String {
        format!("{}::{}", namespace.to_string_lossy(), key.to_string_lossy())
    }

    /// Overwrite a raw blob, bypassing encoding (host simulation only).
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    pub fn sim_write_raw(&mut self, key: &CStr, bytes: &[u8]) {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(NAMESPACE, key), bytes.to_vec());
    }

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn read_blob(&self, key: &CStr) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        Ok(self
            .store
            .borrow()
            .get(&Self::composite_key(NAMESPACE, key))
            .cloned())
    }

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn write_blob(&mut self, key: &CStr, bytes: &[u8]) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        self.sim_write_raw(key, bytes);
        Ok(())
    }

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn erase_blob(&mut self, key: &CStr) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        self.store
            .borrow_mut()
            .remove(&Self::composite_key(NAMESPACE, key));
        Ok(())
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, esp_err_t>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: NAMESPACE is a NUL-terminated literal; handle is a valid
        // out-pointer for the duration of the call.
        let ret = unsafe { nvs_open(NAMESPACE.as_ptr(), mode, &mut handle) };
        if ret != ESP_OK as esp_err_t {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn map_err(ret: esp_err_t) -> StorageError {
        if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }

    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn read_blob(&self, key: &CStr) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        let not_found = ESP_ERR_NVS_NOT_FOUND as esp_err_t;
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr(), core::ptr::null_mut(), &mut size)
            };
            if ret == not_found {
                return Ok(None);
            }
            if ret != ESP_OK as esp_err_t || size > MAX_BLOB_SIZE {
                return Err(ret);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(Some(buf))
        });

        match result {
            Ok(bytes) => Ok(bytes),
            // Namespace never written: read-only open fails with NOT_FOUND.
            Err(e) if e == not_found => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: read {:?} failed ({})", key, e);
                Err(Self::map_err(e))
            }
        }
    }

    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn write_blob(&mut self, key: &CStr, bytes: &[u8]) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr(), bytes.as_ptr().cast(), bytes.len())
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsAdapter: write {:?} failed ({})", key, e);
            Self::map_err(e)
        })
    }

    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn erase_blob(&mut self, key: &CStr) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        let not_found = ESP_ERR_NVS_NOT_FOUND as esp_err_t;
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe { nvs_erase_key(handle, key.as_ptr()) };
            if ret != ESP_OK as esp_err_t && ret != not_found {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsAdapter: erase {:?} failed ({})", key, e);
            Self::map_err(e)
        })
    }

    fn read_baseline(&self) -> Option<f32> {
        match self.read_blob(BASELINE_KEY) {
            Ok(Some(bytes)) => match <[u8; 4]>::try_from(bytes.as_slice()) {
                Ok(raw) => Some(f32::from_le_bytes(raw)),
                Err(_) => {
                    warn!("NvsAdapter: R0 blob has {} bytes, ignoring", bytes.len());
                    None
                }
            },
            Ok(None) | Err(_) => None,
        }
    }
}

// ── BaselineStore ─────────────────────────────────────────────

impl BaselineStore for NvsAdapter {
    fn load(&self, fallback: f32) -> f32 {
        self.read_baseline().unwrap_or(fallback)
    }

    fn save(&mut self, r0_ohms: f32) -> Result<(), StorageError> {
        self.write_blob(BASELINE_KEY, &r0_ohms.to_le_bytes())?;
        info!("NvsAdapter: R0 saved ({:.0} ohm)", r0_ohms);
        Ok(())
    }

    fn has_value(&self) -> bool {
        self.read_baseline().is_some()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.erase_blob(BASELINE_KEY)?;
        info!("NvsAdapter: R0 cleared");
        Ok(())
    }
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load_config(&self) -> Result<MonitorConfig, ConfigError> {
        match self.read_blob(CONFIG_KEY)? {
            Some(bytes) => {
                let cfg: MonitorConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(MonitorConfig::default())
            }
        }
    }

    fn save_config(&mut self, config: &MonitorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config)
            .map_err(|_| ConfigError::Storage(StorageError::IoError))?;
        self.write_blob(CONFIG_KEY, &bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
