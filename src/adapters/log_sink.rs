//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured monitor events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Undefined values print as `n/a`.

use core::fmt;

use log::{info, warn};

use crate::alarm::AlarmLevel;
use crate::app::events::{MonitorEvent, TelemetryRecord};
use crate::app::ports::EventSink;

/// Adapter that logs every [`MonitorEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `Option<f32>` with fixed decimals, or `n/a`.
struct Opt(Option<f32>, usize);

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) if v.is_finite() => write!(f, "{:.*}", self.1, v),
            _ => f.write_str("n/a"),
        }
    }
}

fn yn(flag: bool) -> char {
    if flag { 'Y' } else { 'N' }
}

/// One-line status record for a telemetry snapshot.
pub fn format_reading(t: &TelemetryRecord) -> String {
    let level = AlarmLevel::from_ordinal(t.level).unwrap_or_default();
    format!(
        "MQ7 | raw={} vNode={} Rs={} R0={} cal={} warm={} ratio={} CO~{}ppm | {}",
        t.raw,
        Opt(t.node_voltage, 3),
        Opt(t.sensor_resistance, 0),
        Opt(t.r0, 0),
        yn(t.calibrated),
        yn(t.warmup_done),
        Opt(t.ratio, 3),
        Opt(t.ppm, 0),
        level,
    )
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Reading(t) => {
                info!("{}", format_reading(t));
            }
            MonitorEvent::AlarmChanged { from, to } => {
                info!("ALARM | {} -> {}", from, to);
            }
            MonitorEvent::WarmupComplete => {
                info!("WARMUP | complete");
            }
            MonitorEvent::CalibrationAccepted(r) => {
                info!(
                    "CALIB | OK R0={:.0} ohm (n={}, stddev={:.1}, rel={:.2}%, persisted={})",
                    r.baseline_ohms,
                    r.stats.count,
                    r.stats.stddev,
                    r.stats.rel_stddev * 100.0,
                    yn(r.persisted),
                );
            }
            MonitorEvent::CalibrationRejected(e) => {
                warn!("CALIB | FAIL [{}] {}", e.category(), e);
            }
            MonitorEvent::CalibrationReset => {
                info!("CALIB | reset, fallback R0 restored");
            }
            MonitorEvent::Started {
                calibrated,
                baseline_ohms,
                warmup_remaining_ms,
            } => {
                info!(
                    "START | R0={:.0} ohm cal={} warm-up {}s left | 'c' = calibrate, 'r' = reset",
                    baseline_ohms,
                    yn(*calibrated),
                    warmup_remaining_ms / 1000,
                );
            }
        }
    }
}
