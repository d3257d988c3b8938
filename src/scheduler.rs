//! Deadline-gated cadences for the cooperative control loop.
//!
//! The main loop wakes on a fixed period and polls every component.  Each
//! component owns a [`Cadence`] and only does work once its deadline has
//! passed, so a component that is not due costs one comparison and the
//! loop never waits on a timer.
//!
//! ```text
//!   loop every control_loop_interval_ms
//!     ├─ sampling   Cadence(sample_period_ms)     ──▶ GasPipeline::sample
//!     ├─ classify + buzzer (every tick, own deadline in BuzzerState)
//!     └─ telemetry  Cadence(telemetry_interval_ms) ──▶ MonitorEvent::Reading
//! ```
//!
//! Deadlines are re-armed relative to the poll time (`now + period`), not
//! to the previous deadline, so a long blocking calibration does not cause
//! a burst of catch-up work afterwards.

/// A "next due" deadline with a fixed re-arm period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period_ms: u64,
    next_due_ms: u64,
}

impl Cadence {
    /// First poll at or after `first_due_ms` fires.
    pub fn new(period_ms: u32, first_due_ms: u64) -> Self {
        Self {
            period_ms: u64::from(period_ms),
            next_due_ms: first_due_ms,
        }
    }

    /// Returns `true` (and re-arms) if the deadline has been reached.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        self.next_due_ms = now_ms.saturating_add(self.period_ms);
        true
    }

    /// Whether the next [`poll`](Self::poll) at `now_ms` would fire.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_due_ms
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }
}
