//! Clean-air baseline (R0) calibration.
//!
//! The operator triggers a calibration while the sensor sits in clean
//! air.  The engine takes a batch of Rs readings through the same
//! averaging path as normal sampling and only accepts the batch if it is
//! statistically stable: relative standard deviation (population stddev /
//! mean) at or below the configured limit.  Operator judgement alone is
//! never trusted.
//!
//! ## Lifecycle
//!
//! 1. [`CalibrationEngine::begin`] loads a persisted R0 (if any) and fixes
//!    the warm-up deadline.
//! 2. [`CalibrationEngine::calibrate`] checks preconditions, samples,
//!    tests stability and on success commits + persists the new R0.
//! 3. [`CalibrationEngine::reset`] forgets R0 and restores the fallback.
//!
//! A rejected run leaves baseline and calibrated flag untouched.  A store
//! failure never fails the operation: the new state simply lives for this
//! session only.
//!
//! The run blocks the control loop for roughly
//! `samples * (avg_reads * avg_read_delay_ms + sample_delay_ms)`.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{info, warn};

use crate::app::ports::{AnalogPort, BaselineStore};
use crate::config::{MAX_CALIBRATION_SAMPLES, MonitorConfig};
use crate::error::CalibrationError;
use crate::sensors::co::Acquirer;
use crate::sensors::warmup::WarmupGate;

/// Session calibration state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    pub baseline_ohms: f32,
    pub is_calibrated: bool,
}

/// Spread of a batch of resistance readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityStats {
    pub count: u8,
    pub mean: f32,
    /// Population standard deviation.
    pub stddev: f32,
    /// `stddev / mean`.
    pub rel_stddev: f32,
}

/// Mean and population stddev.  `None` with fewer than two values.
pub fn stability(values: &[f32]) -> Option<StabilityStats> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let var = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f32>()
        / n;
    let stddev = var.sqrt();
    Some(StabilityStats {
        count: values.len().min(u8::MAX as usize) as u8,
        mean,
        stddev,
        rel_stddev: stddev / mean,
    })
}

/// Outcome of an accepted calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReport {
    pub baseline_ohms: f32,
    pub requested: u8,
    pub stats: StabilityStats,
    /// False if the store refused the write (in-session only).
    pub persisted: bool,
}

pub struct CalibrationEngine {
    state: CalibrationState,
    warmup: WarmupGate,
    fallback_ohms: f32,
    max_samples: u8,
    sample_delay_ms: u32,
    max_rel_stddev: f32,
}

impl CalibrationEngine {
    /// Restore R0 from the store and arm the warm-up deadline at `now_ms`.
    pub fn begin(config: &MonitorConfig, now_ms: u64, store: &impl BaselineStore) -> Self {
        let fallback = config.r0_fallback_ohms;
        let mut calibrated = store.has_value();
        let mut r0 = store.load(fallback);

        if !(r0.is_finite() && r0 > 0.0) {
            warn!("MQ7: stored R0 {} is unusable, using fallback {:.0} ohm", r0, fallback);
            r0 = fallback;
            calibrated = false;
        }

        if calibrated {
            info!("MQ7: R0 restored from NVS: {:.0} ohm", r0);
        } else {
            info!("MQ7: no stored R0, fallback {:.0} ohm (uncalibrated)", r0);
        }

        Self::with_state(config, now_ms, r0, calibrated)
    }

    /// Build an engine with an explicit state (no store involved).
    pub fn with_state(config: &MonitorConfig, start_ms: u64, baseline_ohms: f32, calibrated: bool) -> Self {
        Self {
            state: CalibrationState {
                baseline_ohms,
                is_calibrated: calibrated,
            },
            warmup: WarmupGate::new(start_ms, config.warmup_ms),
            fallback_ohms: config.r0_fallback_ohms,
            max_samples: config
                .calibration_max_samples
                .min(MAX_CALIBRATION_SAMPLES as u8),
            sample_delay_ms: config.calibration_sample_delay_ms,
            max_rel_stddev: config.calibration_max_rel_stddev,
        }
    }

    /// Run a blocking calibration of `requested` samples.
    ///
    /// Warm-up is checked once, at entry.
    pub fn calibrate<H: AnalogPort + DelayNs>(
        &mut self,
        requested: u8,
        now_ms: u64,
        hw: &mut H,
        acquirer: &Acquirer,
        store: &mut impl BaselineStore,
    ) -> Result<CalibrationReport, CalibrationError> {
        if !self.warmup.is_elapsed(now_ms) {
            return Err(CalibrationError::WarmupIncomplete {
                remaining_ms: self.warmup.remaining_ms(now_ms),
            });
        }
        if requested < 2 || requested > self.max_samples {
            return Err(CalibrationError::InvalidSampleCount {
                requested,
                max: self.max_samples,
            });
        }

        info!("MQ7: calibrating with {} samples", requested);
        let mut values: Vec<f32, MAX_CALIBRATION_SAMPLES> = Vec::new();
        for _ in 0..requested {
            let acq = acquirer.acquire(hw);
            if let Some(rs) = acq.sensor_resistance.filter(|rs| *rs > 0.0) {
                if values.push(rs).is_err() {
                    break;
                }
            }
            hw.delay_ms(self.sample_delay_ms);
        }

        let stats = stability(&values).ok_or(CalibrationError::InsufficientSamples {
            valid: values.len() as u8,
        })?;

        if stats.mean.is_nan() || stats.mean <= 0.0 {
            return Err(CalibrationError::NonPositiveMean);
        }
        if stats.rel_stddev.is_nan() || stats.rel_stddev > self.max_rel_stddev {
            return Err(CalibrationError::Unstable {
                rel_stddev: stats.rel_stddev,
                limit: self.max_rel_stddev,
            });
        }

        self.state = CalibrationState {
            baseline_ohms: stats.mean,
            is_calibrated: true,
        };
        let persisted = match store.save(stats.mean) {
            Ok(()) => true,
            Err(e) => {
                warn!("MQ7: R0 not persisted ({}), kept for this session", e);
                false
            }
        };
        info!(
            "MQ7: calibration accepted, R0={:.0} ohm (n={}, rel stddev {:.2}%)",
            stats.mean,
            stats.count,
            stats.rel_stddev * 100.0
        );

        Ok(CalibrationReport {
            baseline_ohms: stats.mean,
            requested,
            stats,
            persisted,
        })
    }

    /// Forget R0, both persisted and in-session.  Never fails.
    pub fn reset(&mut self, store: &mut impl BaselineStore) {
        if let Err(e) = store.clear() {
            warn!("MQ7: could not clear stored R0 ({})", e);
        }
        self.state = CalibrationState {
            baseline_ohms: self.fallback_ohms,
            is_calibrated: false,
        };
        info!("MQ7: calibration reset, fallback R0={:.0} ohm", self.fallback_ohms);
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn baseline_ohms(&self) -> f32 {
        self.state.baseline_ohms
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.is_calibrated
    }

    pub fn warmup(&self) -> &WarmupGate {
        &self.warmup
    }
}
