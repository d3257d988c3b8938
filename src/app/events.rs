//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, append to a
//! CSV file, upload as JSON.

use core::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmLevel;
use crate::error::CalibrationError;
use crate::sensors::calibration::CalibrationReport;
use crate::sensors::co::SensorSample;

/// Structured events emitted by the monitor core.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// The service has started (carries the restored calibration state).
    Started {
        calibrated: bool,
        baseline_ohms: f32,
        warmup_remaining_ms: u64,
    },

    /// The first trusted sample after warm-up.
    WarmupComplete,

    /// The classified alarm level changed.
    AlarmChanged { from: AlarmLevel, to: AlarmLevel },

    /// Periodic telemetry snapshot.
    Reading(TelemetryRecord),

    /// A calibration run committed a new baseline.
    CalibrationAccepted(CalibrationReport),

    /// A calibration run was refused; the old baseline is still in force.
    CalibrationRejected(CalibrationError),

    /// The baseline was reset to the fallback.
    CalibrationReset,
}

/// Flat record of the latest sample for logging and upload.
///
/// Undefined values stay `None`: omitted from JSON, empty cells in CSV.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub uptime_ms: u64,
    pub raw: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_voltage: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_resistance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r0: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppm: Option<f32>,
    /// Warm-up elapsed and ppm defined.
    pub ok: bool,
    pub calibrated: bool,
    pub warmup_done: bool,
    /// [`AlarmLevel::ordinal`].
    pub level: u8,
}

/// Column order of [`TelemetryRecord::write_csv_row`].
pub const CSV_HEADER: &str =
    "uptime_ms,raw,node_v,rs_ohm,r0_ohm,ratio,ppm,ok,calibrated,warmup_done,level";

impl TelemetryRecord {
    pub fn from_sample(uptime_ms: u64, sample: &SensorSample, level: AlarmLevel) -> Self {
        Self {
            uptime_ms,
            raw: sample.raw,
            node_voltage: sample.node_voltage,
            sensor_resistance: sample.sensor_resistance,
            r0: sample.baseline_resistance,
            ratio: sample.ratio,
            ppm: sample.ppm,
            ok: sample.valid,
            calibrated: sample.calibrated,
            warmup_done: sample.warmup_done,
            level: level.ordinal(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// One CSV line matching [`CSV_HEADER`], without the line terminator.
    pub fn write_csv_row(&self, w: &mut impl Write) -> fmt::Result {
        write!(w, "{},{},", self.uptime_ms, self.raw)?;
        write_cell(w, self.node_voltage, 3)?;
        w.write_char(',')?;
        write_cell(w, self.sensor_resistance, 1)?;
        w.write_char(',')?;
        write_cell(w, self.r0, 1)?;
        w.write_char(',')?;
        write_cell(w, self.ratio, 4)?;
        w.write_char(',')?;
        write_cell(w, self.ppm, 1)?;
        write!(
            w,
            ",{},{},{},{}",
            u8::from(self.ok),
            u8::from(self.calibrated),
            u8::from(self.warmup_done),
            self.level
        )
    }
}

fn write_cell(w: &mut impl Write, value: Option<f32>, decimals: usize) -> fmt::Result {
    match value {
        Some(v) if v.is_finite() => write!(w, "{:.*}", decimals, v),
        _ => Ok(()),
    }
}
