//! Heater warm-up gate.
//!
//! The MQ-7 element needs minutes of heating before its resistance means
//! anything.  The deadline is fixed once at start-up and never moves.
//! Until it passes, samples are still produced (for diagnostics) but are
//! never trusted for alarms, telemetry "ok" flags, or calibration.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupGate {
    deadline_ms: u64,
}

impl WarmupGate {
    pub fn new(start_ms: u64, duration_ms: u32) -> Self {
        Self {
            deadline_ms: start_ms.saturating_add(u64::from(duration_ms)),
        }
    }

    pub fn is_elapsed(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// Milliseconds left before readings are trusted (0 once elapsed).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.deadline_ms.saturating_sub(now_ms)
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }
}
