//! MQ-7 heater drive.
//!
//! The heater is switched through a MOSFET on an 8-bit LEDC channel.  The
//! driver only knows three intents; duty math stays here.
//!
//! | Mode | Heater voltage    | Duty    |
//! |------|-------------------|---------|
//! | High | 5.0 V             | 255     |
//! | Low  | ~1.4 V equivalent | 71      |
//! | Off  | 0 V               | 0       |
//!
//! The monitor runs the heater at `High` continuously; `Low` exists for
//! the datasheet's 60 s / 90 s cycling mode.

use log::debug;

use crate::drivers::hw_init;
use crate::pins;

const FULL_DUTY: u8 = pins::PWM_MAX_DUTY;
/// Full duty * 1.4 V / 5 V, truncated.
const LOW_DUTY: u8 = 71;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterMode {
    Off,
    High,
    Low,
}

impl HeaterMode {
    pub const fn duty(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::High => FULL_DUTY,
            Self::Low => LOW_DUTY,
        }
    }
}

pub struct HeaterDriver {
    mode: HeaterMode,
}

impl Default for HeaterDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterDriver {
    /// Starts with the heater off.
    pub fn new() -> Self {
        hw_init::ledc_set(hw_init::LEDC_CH_HEATER, HeaterMode::Off.duty());
        Self { mode: HeaterMode::Off }
    }

    pub fn set_mode(&mut self, mode: HeaterMode) {
        if mode == self.mode {
            return;
        }
        hw_init::ledc_set(hw_init::LEDC_CH_HEATER, mode.duty());
        debug!("heater: {:?} -> {:?} (duty {})", self.mode, mode, mode.duty());
        self.mode = mode;
    }

    pub fn set_high(&mut self) {
        self.set_mode(HeaterMode::High);
    }

    pub fn set_low(&mut self) {
        self.set_mode(HeaterMode::Low);
    }

    pub fn off(&mut self) {
        self.set_mode(HeaterMode::Off);
    }

    pub fn mode(&self) -> HeaterMode {
        self.mode
    }
}
