//! MQ-7 carbon-monoxide signal pipeline.
//!
//! The sensor sits on a load resistor RL; the RL voltage is divided down
//! before the ESP32 ADC (0 dB attenuation, ~1.1 V full scale).  Each
//! sample averages N one-shot reads, rebuilds the RL voltage, solves the
//! divider for the sensor resistance Rs and maps Rs/R0 onto the
//! datasheet power law `ppm = A * (Rs/R0)^B`.
//!
//! ```text
//!  raw ──▶ V_node = raw·Vref/FS ──▶ V_RL = V_node·gain ──▶ Rs = RL·(Vc−V_RL)/V_RL
//!                                                            │
//!                                      R0 (calibration) ──▶ ratio = Rs/R0 ──▶ ppm
//! ```
//!
//! Anything outside its physical domain is `None`, never a finite
//! placeholder, so the classifier falls back to `Unknown` on its own.

use embedded_hal::delay::DelayNs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::AnalogPort;
use crate::config::MonitorConfig;
use crate::scheduler::Cadence;
use crate::sensors::calibration::CalibrationEngine;

/// Below this RL voltage the divider relation blows up.
const MIN_LOAD_VOLTS: f32 = 0.0001;
/// RL voltage is clamped this far below Vc instead of reaching Rs = 0.
const SUPPLY_CLAMP_VOLTS: f32 = 0.0001;

/// One pipeline cycle.  Replaced wholesale every sampling period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSample {
    /// Averaged ADC code.
    pub raw: u16,
    /// Estimated voltage at the ADC node.
    pub node_voltage: Option<f32>,
    /// Reconstructed voltage across RL (before the divider).
    pub load_voltage: Option<f32>,
    /// Sensor resistance Rs (ohms).
    pub sensor_resistance: Option<f32>,
    /// Baseline R0 in force when the sample was taken (ohms).
    pub baseline_resistance: Option<f32>,
    /// Rs / R0.
    pub ratio: Option<f32>,
    /// Estimated CO concentration.
    pub ppm: Option<f32>,
    pub calibrated: bool,
    pub warmup_done: bool,
    /// Warm-up elapsed and ppm defined.
    pub valid: bool,
}

// ───────────────────────────────────────────────────────────────
// Conversion math
// ───────────────────────────────────────────────────────────────

/// Fixed physical constants of the sensing circuit and CO curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mq7Conversion {
    pub adc_max_code: f32,
    pub adc_vref: f32,
    pub divider_gain: f32,
    pub vcc: f32,
    pub load_resistance_ohms: f32,
    pub curve_a: f32,
    pub curve_b: f32,
}

impl Mq7Conversion {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            adc_max_code: f32::from(config.adc_max_code),
            adc_vref: config.adc_vref,
            divider_gain: config.divider_gain,
            vcc: config.vcc_sensor,
            load_resistance_ohms: config.load_resistance_ohms,
            curve_a: config.co_curve_a,
            curve_b: config.co_curve_b,
        }
    }

    /// ADC code → node voltage.  An estimate: Vref varies chip to chip.
    pub fn node_voltage(&self, raw: u16) -> f32 {
        f32::from(raw) * self.adc_vref / self.adc_max_code
    }

    /// Node voltage → RL voltage.
    pub fn load_voltage(&self, node_voltage: f32) -> f32 {
        node_voltage * self.divider_gain
    }

    /// Datasheet relation `Rs/RL = (Vc − V_RL) / V_RL`.
    pub fn sensor_resistance(&self, load_voltage: f32) -> Option<f32> {
        if load_voltage.is_nan() || load_voltage <= MIN_LOAD_VOLTS {
            return None;
        }
        let v_rl = if load_voltage >= self.vcc {
            self.vcc - SUPPLY_CLAMP_VOLTS
        } else {
            load_voltage
        };
        let rs = self.load_resistance_ohms * (self.vcc - v_rl) / v_rl;
        (rs.is_finite() && rs > 0.0).then_some(rs)
    }

    /// Full chain from one averaged code to Rs.
    pub fn resistance_from_raw(&self, raw: u16) -> Option<f32> {
        self.sensor_resistance(self.load_voltage(self.node_voltage(raw)))
    }

    /// Rs / R0, undefined unless both are positive.
    pub fn ratio(sensor_resistance: Option<f32>, baseline_ohms: f32) -> Option<f32> {
        match sensor_resistance {
            Some(rs) if rs > 0.0 && baseline_ohms > 0.0 && baseline_ohms.is_finite() => {
                Some(rs / baseline_ohms)
            }
            _ => None,
        }
    }

    /// `A * ratio^B`, undefined unless ratio is positive.
    pub fn ppm(&self, ratio: Option<f32>) -> Option<f32> {
        let ratio = ratio.filter(|r| *r > 0.0)?;
        let ppm = self.curve_a * ratio.powf(self.curve_b);
        ppm.is_finite().then_some(ppm)
    }
}

// ───────────────────────────────────────────────────────────────
// Acquisition
// ───────────────────────────────────────────────────────────────

/// One averaged acquisition, before any baseline is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acquisition {
    pub raw: u16,
    pub node_voltage: f32,
    pub load_voltage: f32,
    pub sensor_resistance: Option<f32>,
}

/// Averaging front end shared by periodic sampling and calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acquirer {
    conversion: Mq7Conversion,
    avg_reads: u8,
    avg_read_delay_ms: u32,
}

impl Acquirer {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            conversion: Mq7Conversion::from_config(config),
            avg_reads: config.avg_reads.max(1),
            avg_read_delay_ms: config.avg_read_delay_ms,
        }
    }

    /// Average `avg_reads` conversions, pausing between reads.
    ///
    /// Blocks the caller for `avg_reads * avg_read_delay_ms`.
    pub fn read_averaged<H: AnalogPort + DelayNs>(&self, hw: &mut H) -> u16 {
        let mut sum: u32 = 0;
        for _ in 0..self.avg_reads {
            sum += u32::from(hw.read_raw());
            hw.delay_ms(self.avg_read_delay_ms);
        }
        (sum / u32::from(self.avg_reads)) as u16
    }

    pub fn acquire<H: AnalogPort + DelayNs>(&self, hw: &mut H) -> Acquisition {
        let raw = self.read_averaged(hw);
        let node_voltage = self.conversion.node_voltage(raw);
        let load_voltage = self.conversion.load_voltage(node_voltage);
        Acquisition {
            raw,
            node_voltage,
            load_voltage,
            sensor_resistance: self.conversion.sensor_resistance(load_voltage),
        }
    }

    pub fn conversion(&self) -> &Mq7Conversion {
        &self.conversion
    }
}

// ───────────────────────────────────────────────────────────────
// Pipeline
// ───────────────────────────────────────────────────────────────

/// Time-gated sampler.  Owns the only copy of the latest sample.
pub struct GasPipeline {
    acquirer: Acquirer,
    cadence: Cadence,
    last: SensorSample,
    samples_taken: u32,
}

impl GasPipeline {
    /// The first sample is due at `start_ms`.
    pub fn new(config: &MonitorConfig, start_ms: u64) -> Self {
        Self {
            acquirer: Acquirer::from_config(config),
            cadence: Cadence::new(config.sample_period_ms, start_ms),
            last: SensorSample::default(),
            samples_taken: 0,
        }
    }

    /// Take a new sample if the sampling period has elapsed; otherwise
    /// return the previous sample unchanged.
    pub fn sample<H: AnalogPort + DelayNs>(
        &mut self,
        now_ms: u64,
        hw: &mut H,
        calibration: &CalibrationEngine,
    ) -> SensorSample {
        if !self.cadence.poll(now_ms) {
            return self.last;
        }

        let acq = self.acquirer.acquire(hw);
        let conversion = self.acquirer.conversion();
        let r0 = calibration.baseline_ohms();
        let ratio = Mq7Conversion::ratio(acq.sensor_resistance, r0);
        let ppm = conversion.ppm(ratio);
        let warmup_done = calibration.warmup().is_elapsed(now_ms);

        self.last = SensorSample {
            raw: acq.raw,
            node_voltage: Some(acq.node_voltage),
            load_voltage: Some(acq.load_voltage),
            sensor_resistance: acq.sensor_resistance,
            baseline_resistance: Some(r0),
            ratio,
            ppm,
            calibrated: calibration.is_calibrated(),
            warmup_done,
            valid: warmup_done && ppm.is_some(),
        };
        self.samples_taken = self.samples_taken.wrapping_add(1);
        debug!(
            "MQ7 sample #{}: raw={} Rs={:?} ratio={:?}",
            self.samples_taken, acq.raw, acq.sensor_resistance, ratio
        );
        self.last
    }

    /// Most recent completed sample (never blocks).
    pub fn latest(&self) -> &SensorSample {
        &self.last
    }

    pub fn acquirer(&self) -> &Acquirer {
        &self.acquirer
    }

    pub fn samples_taken(&self) -> u32 {
        self.samples_taken
    }
}
