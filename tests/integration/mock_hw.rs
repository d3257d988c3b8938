//! Mock adapters for integration tests.
//!
//! The ADC replays a scripted sequence of codes and every buzzer/sink call
//! is recorded, so tests can assert on the full history without touching
//! real peripherals.

use std::collections::VecDeque;

use comonitor::alarm::AlarmLevel;
use comonitor::app::events::MonitorEvent;
use comonitor::app::ports::{AnalogPort, BaselineStore, BuzzerPort, EventSink, StorageError};
use embedded_hal::delay::DelayNs;

// ── MockHardware ──────────────────────────────────────────────

/// Scripted ADC.  Once the script runs out the last code repeats.
pub struct MockHardware {
    script: VecDeque<u16>,
    last: u16,
    pub reads: usize,
    pub delayed_ns: u64,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(code: u16) -> Self {
        Self {
            script: VecDeque::new(),
            last: code,
            reads: 0,
            delayed_ns: 0,
        }
    }

    /// Append `count` reads of `code` to the script.
    pub fn queue(&mut self, code: u16, count: usize) {
        self.script.extend(std::iter::repeat_n(code, count));
    }

    /// Drop the script and hold `code` from now on.
    pub fn hold(&mut self, code: u16) {
        self.script.clear();
        self.last = code;
    }

    pub fn delayed_ms(&self) -> u64 {
        self.delayed_ns / 1_000_000
    }
}

impl AnalogPort for MockHardware {
    fn read_raw(&mut self) -> u16 {
        self.reads += 1;
        if let Some(code) = self.script.pop_front() {
            self.last = code;
        }
        self.last
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
    }
}

// ── MockStore ─────────────────────────────────────────────────

/// In-memory R0 slot.  `failing` makes every write return an error.
#[derive(Default)]
pub struct MockStore {
    pub value: Option<f32>,
    pub failing: bool,
    pub saves: usize,
    pub clears: usize,
}

#[allow(dead_code)]
impl MockStore {
    pub fn with_value(r0: f32) -> Self {
        Self {
            value: Some(r0),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

impl BaselineStore for MockStore {
    fn load(&self, fallback: f32) -> f32 {
        self.value.unwrap_or(fallback)
    }

    fn save(&mut self, r0_ohms: f32) -> Result<(), StorageError> {
        self.saves += 1;
        if self.failing {
            return Err(StorageError::IoError);
        }
        self.value = Some(r0_ohms);
        Ok(())
    }

    fn has_value(&self) -> bool {
        self.value.is_some()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.clears += 1;
        if self.failing {
            return Err(StorageError::IoError);
        }
        self.value = None;
        Ok(())
    }
}

// ── RecordingBuzzer ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerCall {
    On(AlarmLevel),
    Off,
}

#[derive(Default)]
pub struct RecordingBuzzer {
    pub calls: Vec<BuzzerCall>,
}

#[allow(dead_code)]
impl RecordingBuzzer {
    pub fn is_on(&self) -> bool {
        matches!(self.calls.last(), Some(BuzzerCall::On(_)))
    }

    pub fn on_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BuzzerCall::On(_)))
            .count()
    }
}

impl BuzzerPort for RecordingBuzzer {
    fn set_level(&mut self, level: AlarmLevel) {
        self.calls.push(BuzzerCall::On(level));
    }

    fn set_off(&mut self) {
        self.calls.push(BuzzerCall::Off);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<MonitorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&MonitorEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn alarm_changes(&self) -> Vec<(AlarmLevel, AlarmLevel)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MonitorEvent::AlarmChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}
