//! Buzzer pattern engine.
//!
//! Converts the current [`AlarmLevel`] into an on/off waveform.  The main
//! loop calls [`BuzzerDriver::tick`] every control cycle with the
//! classifier output; the driver decides whether the output changes and
//! pushes the intent through a [`BuzzerPort`].
//!
//! | Level            | Waveform                                      |
//! |------------------|-----------------------------------------------|
//! | Unknown / Ok     | forced off                                    |
//! | Warn             | `warn_on_ms` on, rest of `warn_period_ms` off |
//! | Danger           | `danger_on_ms` on / `danger_off_ms` off       |
//!
//! A level change silences the output and restarts the pattern on the
//! same tick.  Between deadlines a tick is a no-op.

use crate::alarm::AlarmLevel;
use crate::app::ports::BuzzerPort;
use crate::config::MonitorConfig;

/// Per-level timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerPattern {
    pub warn_on_ms: u32,
    pub warn_period_ms: u32,
    pub danger_on_ms: u32,
    pub danger_off_ms: u32,
}

impl BuzzerPattern {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            warn_on_ms: config.buzzer_warn_on_ms,
            warn_period_ms: config.buzzer_warn_period_ms,
            danger_on_ms: config.buzzer_danger_on_ms,
            danger_off_ms: config.buzzer_danger_off_ms,
        }
    }

    fn warn_off_ms(&self) -> u32 {
        self.warn_period_ms.saturating_sub(self.warn_on_ms)
    }
}

impl Default for BuzzerPattern {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuzzerState {
    /// Last level rendered.
    pub current_level: AlarmLevel,
    pub is_on: bool,
    pub next_toggle_at_ms: u64,
}

/// Owned pattern state machine.  One per physical buzzer.
pub struct BuzzerDriver {
    pattern: BuzzerPattern,
    state: BuzzerState,
}

impl BuzzerDriver {
    pub fn new(pattern: BuzzerPattern) -> Self {
        Self {
            pattern,
            state: BuzzerState::default(),
        }
    }

    /// Advance the pattern.  Returns whether the output is on afterwards.
    pub fn tick(&mut self, now_ms: u64, level: AlarmLevel, out: &mut impl BuzzerPort) -> bool {
        if level != self.state.current_level {
            self.state.current_level = level;
            self.set(false, out);
            self.state.next_toggle_at_ms = now_ms;
        }

        if !level.is_audible() {
            self.set(false, out);
            return false;
        }

        if now_ms < self.state.next_toggle_at_ms {
            return self.state.is_on;
        }

        let on = !self.state.is_on;
        let hold_ms = match (level, on) {
            (AlarmLevel::Warn, true) => self.pattern.warn_on_ms,
            (AlarmLevel::Warn, false) => self.pattern.warn_off_ms(),
            (_, true) => self.pattern.danger_on_ms,
            (_, false) => self.pattern.danger_off_ms,
        };
        self.set(on, out);
        self.state.next_toggle_at_ms = now_ms.saturating_add(u64::from(hold_ms));
        on
    }

    /// Silence the output and forget the current level.
    pub fn silence(&mut self, out: &mut impl BuzzerPort) {
        self.set(false, out);
        self.state = BuzzerState::default();
    }

    pub fn state(&self) -> &BuzzerState {
        &self.state
    }

    pub fn pattern(&self) -> &BuzzerPattern {
        &self.pattern
    }

    fn set(&mut self, on: bool, out: &mut impl BuzzerPort) {
        self.state.is_on = on;
        if on {
            out.set_level(self.state.current_level);
        } else {
            out.set_off();
        }
    }
}
