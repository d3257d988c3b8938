//! CO alarm classification.
//!
//! A pure function of `(warmup_done, calibrated, ratio)`.  The ratio is
//! Rs/R0: a *lower* ratio means *more* CO, so the thresholds are
//! "strictly below" comparisons.
//!
//! | Condition                                   | Level     |
//! |---------------------------------------------|-----------|
//! | warming up, uncalibrated, or ratio undefined| `Unknown` |
//! | ratio < danger                              | `Danger`  |
//! | danger <= ratio < warn                      | `Warn`    |
//! | ratio >= warn                               | `Ok`      |

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::sensors::co::SensorSample;

/// Alarm level, ordered from least to most severe.
///
/// The discriminant is the ordinal used in telemetry and log records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum AlarmLevel {
    #[default]
    Unknown = 0,
    Ok = 1,
    Warn = 2,
    Danger = 3,
}

impl AlarmLevel {
    /// Ordinal for serialized records (0 = Unknown … 3 = Danger).
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Inverse of [`ordinal`](Self::ordinal).
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Unknown),
            1 => Some(Self::Ok),
            2 => Some(Self::Warn),
            3 => Some(Self::Danger),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Danger => "DANGER",
        }
    }

    /// Whether this level drives the buzzer at all.
    pub const fn is_audible(self) -> bool {
        matches!(self, Self::Warn | Self::Danger)
    }
}

impl core::fmt::Display for AlarmLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ratio thresholds.  `danger_below < warn_below` (checked by
/// [`MonitorConfig::validate`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmThresholds {
    pub danger_below: f32,
    pub warn_below: f32,
}

impl AlarmThresholds {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            danger_below: config.ratio_danger_below,
            warn_below: config.ratio_warn_below,
        }
    }

    /// Classify a raw triple.  Non-finite ratios count as undefined.
    pub fn classify(&self, warmup_done: bool, calibrated: bool, ratio: Option<f32>) -> AlarmLevel {
        let ratio = match ratio {
            Some(r) if warmup_done && calibrated && r.is_finite() => r,
            _ => return AlarmLevel::Unknown,
        };
        if ratio < self.danger_below {
            AlarmLevel::Danger
        } else if ratio < self.warn_below {
            AlarmLevel::Warn
        } else {
            AlarmLevel::Ok
        }
    }

    /// Classify a pipeline sample using the flags recorded at sample time.
    pub fn classify_sample(&self, sample: &SensorSample) -> AlarmLevel {
        self.classify(sample.warmup_done, sample.calibrated, sample.ratio)
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}
