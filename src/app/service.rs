//! Monitor service: the hexagonal core.
//!
//! [`MonitorService`] owns the sampling pipeline, calibration engine,
//! alarm classifier and buzzer pattern state.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  AnalogPort + DelayNs ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                           │      MonitorService       │
//!           BuzzerPort  ◀── │ pipeline · R0 · alarm ·   │ ◀─▶ BaselineStore
//!                           │ buzzer pattern            │
//!                           └──────────────────────────┘
//! ```
//!
//! Time is injected as milliseconds since boot on every call; the service
//! never reads a clock itself.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::alarm::{AlarmLevel, AlarmThresholds};
use crate::config::MonitorConfig;
use crate::drivers::buzzer::{BuzzerDriver, BuzzerPattern, BuzzerState};
use crate::error::CalibrationError;
use crate::scheduler::Cadence;
use crate::sensors::calibration::{CalibrationEngine, CalibrationReport};
use crate::sensors::co::{GasPipeline, SensorSample};

use super::commands::MonitorCommand;
use super::events::{MonitorEvent, TelemetryRecord};
use super::ports::{AnalogPort, BaselineStore, BuzzerPort, EventSink};

/// Result of an operator command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    Calibrated(CalibrationReport),
    Rejected(CalibrationError),
    Reset,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService {
    config: MonitorConfig,
    pipeline: GasPipeline,
    calibration: CalibrationEngine,
    thresholds: AlarmThresholds,
    buzzer: BuzzerDriver,
    level: AlarmLevel,
    telemetry: Cadence,
    warmup_reported: bool,
    tick_count: u64,
}

impl MonitorService {
    /// Build the service at boot time `now_ms`.
    ///
    /// Restores R0 from `store` and fixes the warm-up deadline.  The first
    /// sample and the first telemetry record are due immediately.
    pub fn new(config: MonitorConfig, now_ms: u64, store: &impl BaselineStore) -> Self {
        let calibration = CalibrationEngine::begin(&config, now_ms, store);
        Self {
            pipeline: GasPipeline::new(&config, now_ms),
            calibration,
            thresholds: AlarmThresholds::from_config(&config),
            buzzer: BuzzerDriver::new(BuzzerPattern::from_config(&config)),
            level: AlarmLevel::Unknown,
            telemetry: Cadence::new(config.telemetry_interval_ms, now_ms),
            warmup_reported: false,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Silence the buzzer and announce the restored calibration state.
    pub fn start(&mut self, now_ms: u64, buzzer: &mut impl BuzzerPort, sink: &mut impl EventSink) {
        self.buzzer.silence(buzzer);
        let remaining = self.calibration.warmup().remaining_ms(now_ms);
        sink.emit(&MonitorEvent::Started {
            calibrated: self.calibration.is_calibrated(),
            baseline_ohms: self.calibration.baseline_ohms(),
            warmup_remaining_ms: remaining,
        });
        info!(
            "MonitorService started (R0={:.0} ohm, calibrated={}, warm-up {}s)",
            self.calibration.baseline_ohms(),
            self.calibration.is_calibrated(),
            remaining / 1000
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: sample (if due) → classify → buzzer →
    /// telemetry (if due).  Returns the current alarm level.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl AnalogPort + DelayNs),
        buzzer: &mut impl BuzzerPort,
        sink: &mut impl EventSink,
    ) -> AlarmLevel {
        self.tick_count += 1;

        let sample = self.pipeline.sample(now_ms, hw, &self.calibration);

        if sample.warmup_done && !self.warmup_reported {
            self.warmup_reported = true;
            info!("MQ7 warm-up complete, readings are now trusted");
            sink.emit(&MonitorEvent::WarmupComplete);
        }

        let level = self.thresholds.classify_sample(&sample);
        if level != self.level {
            if level > self.level && level.is_audible() {
                warn!("ALARM | {} -> {}", self.level, level);
            } else {
                info!("ALARM | {} -> {}", self.level, level);
            }
            sink.emit(&MonitorEvent::AlarmChanged {
                from: self.level,
                to: level,
            });
            self.level = level;
        }

        self.buzzer.tick(now_ms, level, buzzer);

        if self.telemetry.poll(now_ms) {
            sink.emit(&MonitorEvent::Reading(self.telemetry_record(now_ms)));
        }

        level
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command.
    ///
    /// Calibration blocks the caller for the whole sampling run.  The new
    /// baseline, or the uncalibrated state after a reset, shows up in the
    /// next scheduled sample: until then the alarm level and buzzer keep
    /// following the previous sample, for at most one sampling period.
    pub fn handle_command(
        &mut self,
        cmd: MonitorCommand,
        now_ms: u64,
        hw: &mut (impl AnalogPort + DelayNs),
        store: &mut impl BaselineStore,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        let samples = match cmd {
            MonitorCommand::ResetCalibration => {
                self.calibration.reset(store);
                sink.emit(&MonitorEvent::CalibrationReset);
                return CommandOutcome::Reset;
            }
            MonitorCommand::Calibrate => self.config.calibration_samples,
            MonitorCommand::CalibrateWith(n) => n,
        };

        match self
            .calibration
            .calibrate(samples, now_ms, hw, self.pipeline.acquirer(), store)
        {
            Ok(report) => {
                sink.emit(&MonitorEvent::CalibrationAccepted(report));
                CommandOutcome::Calibrated(report)
            }
            Err(e) => {
                warn!("MQ7 calibration rejected ({}): {}", e.category(), e);
                sink.emit(&MonitorEvent::CalibrationRejected(e));
                CommandOutcome::Rejected(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Telemetry view of the latest completed sample.
    pub fn telemetry_record(&self, now_ms: u64) -> TelemetryRecord {
        TelemetryRecord::from_sample(now_ms, self.pipeline.latest(), self.level)
    }

    /// Most recent completed sample (never blocks).
    pub fn latest(&self) -> &SensorSample {
        self.pipeline.latest()
    }

    pub fn alarm_level(&self) -> AlarmLevel {
        self.level
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    pub fn buzzer_state(&self) -> &BuzzerState {
        self.buzzer.state()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
