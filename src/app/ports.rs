//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (ADC, buzzer, event sinks, NVS) implement these traits.
//! The [`MonitorService`](super::service::MonitorService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Blocking pauses between ADC reads go through
//! [`embedded_hal::delay::DelayNs`]; they stall the single control loop
//! on purpose and are bounded by the sample counts in the config.

use crate::alarm::AlarmLevel;
use crate::config::MonitorConfig;

// ───────────────────────────────────────────────────────────────
// Analog port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One-shot analog acquisition of the CO sensing node.
pub trait AnalogPort {
    /// Read one raw conversion in `0..=adc_max_code`.
    fn read_raw(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Buzzer port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Audible output.  The domain only states intent; adapters decide
/// whether that means a GPIO level or a tone frequency.
pub trait BuzzerPort {
    /// Sound the buzzer for the given alarm level.
    fn set_level(&mut self, level: AlarmLevel);

    /// Silence the buzzer.
    fn set_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Baseline store (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent home of the calibrated baseline resistance R0.
///
/// An empty store is the normal first-boot state, not an error.
pub trait BaselineStore {
    /// Stored baseline, or `fallback` when nothing is stored or the store
    /// is unreadable.
    fn load(&self, fallback: f32) -> f32;

    /// Persist a new baseline atomically.
    fn save(&mut self, r0_ohms: f32) -> Result<(), StorageError>;

    /// Whether a baseline has ever been saved.
    fn has_value(&self) -> bool;

    /// Forget the stored baseline.  Succeeds if nothing was stored.
    fn clear(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`MonitorEvent`](super::events::MonitorEvent)s
/// through this port.  Adapters decide where they go (serial log, display,
/// SD card, HTTP upload).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::MonitorEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the monitor configuration.
///
/// Implementations MUST call [`MonitorConfig::validate`] before persisting;
/// invalid values are rejected, not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`MonitorConfig::default()`] if no stored config exists.
    fn load_config(&self) -> Result<MonitorConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save_config(&mut self, config: &MonitorConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage failed.
    Storage(StorageError),
}

/// Errors from the persistent key/value backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage partition could not be initialised; running in-session only.
    Unavailable,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage unavailable"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
