//! Calibration error type.
//!
//! Port failures live next to their traits in
//! [`app::ports`](crate::app::ports); this module holds the one domain
//! error the core reports to operators.  It is `Copy` so it can be handed
//! to event sinks without allocation.
//!
//! Numeric results outside their physical domain are *not* errors: they
//! are carried as `None` in [`SensorSample`](crate::sensors::co::SensorSample).

use core::fmt;

// ---------------------------------------------------------------------------
// Calibration rejections
// ---------------------------------------------------------------------------

/// Why a calibration run was refused.  A rejection never touches the
/// previous baseline or the calibrated flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// Requested before the warm-up deadline.  No sample was taken.
    WarmupIncomplete { remaining_ms: u64 },
    /// Batch size below 2 or above the configured maximum.  No sample was taken.
    InvalidSampleCount { requested: u8, max: u8 },
    /// Fewer than two readings produced a defined, positive resistance.
    InsufficientSamples { valid: u8 },
    /// Mean of the valid readings was not positive.
    NonPositiveMean,
    /// Readings too noisy to be clean air.
    Unstable { rel_stddev: f32, limit: f32 },
}

impl CalibrationError {
    /// Short, human-readable reason category for the operator console.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::WarmupIncomplete { .. } => "warm-up",
            Self::InvalidSampleCount { .. } => "sample count",
            Self::InsufficientSamples { .. } => "insufficient samples",
            Self::NonPositiveMean => "invalid mean",
            Self::Unstable { .. } => "unstable",
        }
    }

    /// True if the request was refused before any sample was taken.
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::WarmupIncomplete { .. } | Self::InvalidSampleCount { .. }
        )
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WarmupIncomplete { remaining_ms } => {
                write!(f, "warm-up not complete ({}s left)", remaining_ms / 1000)
            }
            Self::InvalidSampleCount { requested, max } => {
                write!(f, "sample count {requested} outside 2..={max}")
            }
            Self::InsufficientSamples { valid } => {
                write!(f, "only {valid} valid readings (need 2)")
            }
            Self::NonPositiveMean => write!(f, "mean resistance not positive"),
            Self::Unstable { rel_stddev, limit } => write!(
                f,
                "unstable signal (rel stddev {:.1}% > {:.1}%)",
                rel_stddev * 100.0,
                limit * 100.0
            ),
        }
    }
}
