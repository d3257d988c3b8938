//! GPIO / peripheral pin assignments for the CO monitor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// MQ-7 CO sensor
// ---------------------------------------------------------------------------

/// Sensor load-resistor node, divided down to the ADC range.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const MQ7_ADC_GPIO: i32 = 4;
/// ADC1 channel number of [`MQ7_ADC_GPIO`].
pub const MQ7_ADC_CHANNEL: u32 = 3;

/// Heater drive (logic-level MOSFET), LEDC PWM.
pub const MQ7_HEATER_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

/// Active buzzer (binary) or passive piezo (LEDC tone).
pub const BUZZER_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// Full-on duty at [`PWM_RESOLUTION_BITS`].
pub const PWM_MAX_DUTY: u8 = ((1u32 << PWM_RESOLUTION_BITS) - 1) as u8;
/// Heater PWM frequency.  Thermal inertia makes the exact value uncritical.
pub const HEATER_PWM_FREQ_HZ: u32 = 2_000;
