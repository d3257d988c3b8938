//! Monitor configuration parameters
//!
//! Every fixed constant of the CO sensing chain, the calibration acceptance
//! test, the alarm thresholds and the buzzer cadence lives here.
//! Values can be overridden via NVS (see [`ConfigPort`](crate::app::ports::ConfigPort)).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Hard upper bound on calibration batch size (stack buffer capacity).
pub const MAX_CALIBRATION_SAMPLES: usize = 32;

/// Core monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    // --- Acquisition ---
    /// Consecutive ADC reads averaged into one raw code
    pub avg_reads: u8,
    /// Pause between two averaged reads (milliseconds)
    pub avg_read_delay_ms: u32,
    /// Minimum spacing between two pipeline samples (milliseconds)
    pub sample_period_ms: u32,
    /// ADC full-scale code (12-bit → 4095)
    pub adc_max_code: u16,
    /// Assumed ADC reference voltage (0 dB attenuation ≈ 1.1 V)
    pub adc_vref: f32,

    // --- Sensor physics (MQ-7 on a load resistor, then a divider) ---
    /// Gain that undoes the resistive divider in front of the ADC
    pub divider_gain: f32,
    /// Sensor circuit supply voltage (Vc)
    pub vcc_sensor: f32,
    /// Load resistor RL (ohms)
    pub load_resistance_ohms: f32,
    /// Power-law coefficient A in `ppm = A * ratio^B`
    pub co_curve_a: f32,
    /// Power-law exponent B in `ppm = A * ratio^B`
    pub co_curve_b: f32,

    // --- Calibration ---
    /// Baseline R0 used until a calibration succeeds (ohms)
    pub r0_fallback_ohms: f32,
    /// Warm-up period after power-on during which readings are not trusted
    pub warmup_ms: u32,
    /// Batch size used by the operator "calibrate now" command
    pub calibration_samples: u8,
    /// Largest batch size a calibration request may ask for
    pub calibration_max_samples: u8,
    /// Pause between two calibration samples (milliseconds)
    pub calibration_sample_delay_ms: u32,
    /// Maximum accepted relative standard deviation (stddev / mean)
    pub calibration_max_rel_stddev: f32,

    // --- Alarm thresholds (Rs/R0; lower ratio = more CO) ---
    /// Ratio strictly below this is `Danger`
    pub ratio_danger_below: f32,
    /// Ratio strictly below this (and not danger) is `Warn`
    pub ratio_warn_below: f32,

    // --- Buzzer ---
    /// Drive a tone (LEDC frequency) instead of a plain GPIO level
    pub buzzer_use_tone: bool,
    /// GPIO polarity for the binary buzzer output
    pub buzzer_active_high: bool,
    pub buzzer_warn_on_ms: u32,
    pub buzzer_warn_period_ms: u32,
    pub buzzer_danger_on_ms: u32,
    pub buzzer_danger_off_ms: u32,
    pub buzzer_warn_freq_hz: u32,
    pub buzzer_danger_freq_hz: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Telemetry record interval (milliseconds)
    pub telemetry_interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            avg_reads: 20,
            avg_read_delay_ms: 3,
            sample_period_ms: 1000,
            adc_max_code: 4095,
            adc_vref: 1.1,

            // Sensor physics
            divider_gain: 5.0,
            vcc_sensor: 5.0,
            load_resistance_ohms: 10_000.0,
            co_curve_a: 99.042,
            co_curve_b: -1.518,

            // Calibration
            r0_fallback_ohms: 10_000.0,
            warmup_ms: 10 * 60 * 1000, // 10 min
            calibration_samples: 20,
            calibration_max_samples: MAX_CALIBRATION_SAMPLES as u8,
            calibration_sample_delay_ms: 10,
            calibration_max_rel_stddev: 0.05,

            // Alarm thresholds
            ratio_danger_below: 0.4,
            ratio_warn_below: 0.8,

            // Buzzer
            buzzer_use_tone: false,
            buzzer_active_high: true,
            buzzer_warn_on_ms: 150,
            buzzer_warn_period_ms: 1000,
            buzzer_danger_on_ms: 100,
            buzzer_danger_off_ms: 100,
            buzzer_warn_freq_hz: 2000,
            buzzer_danger_freq_hz: 3000,

            // Timing
            control_loop_interval_ms: 250,   // 4 Hz
            telemetry_interval_ms: 15_000,   // every 15 s
        }
    }
}

impl MonitorConfig {
    /// Range-check every field and the cross-field invariants.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.avg_reads == 0 || self.avg_reads > 64 {
            return Err(ConfigError::ValidationFailed("avg_reads must be 1–64"));
        }
        if self.avg_read_delay_ms > 50 {
            return Err(ConfigError::ValidationFailed("avg_read_delay_ms must be 0–50"));
        }
        if !(100..=60_000).contains(&self.sample_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "sample_period_ms must be 100–60000",
            ));
        }
        if self.adc_max_code == 0 {
            return Err(ConfigError::ValidationFailed("adc_max_code must be > 0"));
        }
        if !(self.adc_vref > 0.0 && self.divider_gain > 0.0 && self.vcc_sensor > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "adc_vref, divider_gain and vcc_sensor must be > 0",
            ));
        }
        if !(self.load_resistance_ohms > 0.0 && self.r0_fallback_ohms > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "load_resistance_ohms and r0_fallback_ohms must be > 0",
            ));
        }
        if !(self.co_curve_a > 0.0 && self.co_curve_b.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "co_curve_a must be > 0 and co_curve_b finite",
            ));
        }
        if self.calibration_samples < 2
            || self.calibration_samples > self.calibration_max_samples
            || self.calibration_max_samples as usize > MAX_CALIBRATION_SAMPLES
        {
            return Err(ConfigError::ValidationFailed(
                "need 2 <= calibration_samples <= calibration_max_samples <= 32",
            ));
        }
        if !(self.calibration_max_rel_stddev > 0.0 && self.calibration_max_rel_stddev < 1.0) {
            return Err(ConfigError::ValidationFailed(
                "calibration_max_rel_stddev must be in (0, 1)",
            ));
        }
        if !(self.ratio_danger_below > 0.0 && self.ratio_danger_below < self.ratio_warn_below) {
            return Err(ConfigError::ValidationFailed(
                "need 0 < ratio_danger_below < ratio_warn_below",
            ));
        }
        if self.buzzer_warn_on_ms == 0 || self.buzzer_warn_on_ms >= self.buzzer_warn_period_ms {
            return Err(ConfigError::ValidationFailed(
                "need 0 < buzzer_warn_on_ms < buzzer_warn_period_ms",
            ));
        }
        if self.buzzer_danger_on_ms == 0 || self.buzzer_danger_off_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "buzzer danger on/off durations must be > 0",
            ));
        }
        if !(50..=5000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 50–5000",
            ));
        }
        if self.telemetry_interval_ms < self.control_loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must be >= control_loop_interval_ms",
            ));
        }
        Ok(())
    }
}
