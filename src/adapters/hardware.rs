//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! - [`HardwareAdapter`] combines the MQ-7 ADC channel with a blocking
//!   delay provider and implements [`AnalogPort`] + [`DelayNs`], the pair
//!   the sampling pipeline and calibration engine need.
//! - [`GpioBuzzer`] and [`ToneBuzzer`] implement [`BuzzerPort`] for an
//!   active buzzer on a plain output and a passive piezo on LEDC.
//!
//! This is the only module in the system that touches actual hardware.
//! On non-espidf targets the ADC reads an injectable value and the delay
//! sleeps the host thread.

use core::convert::Infallible;
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
use core::sync::atomic::{AtomicU16, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::warn;

use crate::alarm::AlarmLevel;
use crate::app::ports::{AnalogPort, BuzzerPort};
use crate::config::MonitorConfig;
use crate::drivers::hw_init;
use crate::pins;

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
static SIM_MQ7_ADC: AtomicU16 = AtomicU16::new(0);

/// Inject the raw code returned by [`Mq7Adc::read_raw`] on host builds.
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn sim_set_mq7_adc(raw: u16) {
    SIM_MQ7_ADC.store(raw, Ordering::Relaxed);
}

// ── ADC ───────────────────────────────────────────────────────

/// MQ-7 analog channel (ADC1, 0 dB attenuation, configured by hw_init).
pub struct Mq7Adc {
    channel: u32,
}

impl Default for Mq7Adc {
    fn default() -> Self {
        Self::new()
    }
}

impl Mq7Adc {
    pub fn new() -> Self {
        Self {
            channel: pins::MQ7_ADC_CHANNEL,
        }
    }

    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(self.channel)
    }

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn read_adc(&self) -> u16 {
        SIM_MQ7_ADC.load(Ordering::Relaxed)
    }

    /// ADC1 channel number.
    pub fn channel(&self) -> u32 {
        self.channel
    }
}

impl AnalogPort for Mq7Adc {
    fn read_raw(&mut self) -> u16 {
        self.read_adc()
    }
}

/// Blocking delay for host builds.  Stalls the calling thread.
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

/// ADC + delay, the acquisition side of the monitor.
pub struct HardwareAdapter<D: DelayNs> {
    adc: Mq7Adc,
    delay: D,
}

impl<D: DelayNs> HardwareAdapter<D> {
    pub fn new(adc: Mq7Adc, delay: D) -> Self {
        Self { adc, delay }
    }
}

impl<D: DelayNs> AnalogPort for HardwareAdapter<D> {
    fn read_raw(&mut self) -> u16 {
        self.adc.read_raw()
    }
}

impl<D: DelayNs> DelayNs for HardwareAdapter<D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

// ── Buzzer outputs ────────────────────────────────────────────

/// Raw GPIO output through hw_init (pin configured at boot).
pub struct RawOutputPin {
    gpio: i32,
}

impl RawOutputPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for RawOutputPin {
    type Error = Infallible;
}

impl OutputPin for RawOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

/// Active buzzer on a binary output with configurable polarity.
pub struct GpioBuzzer<P: OutputPin> {
    pin: P,
    active_high: bool,
}

impl<P: OutputPin> GpioBuzzer<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self { pin, active_high }
    }

    fn drive(&mut self, on: bool) {
        let high = on == self.active_high;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            warn!("buzzer: GPIO write failed: {:?}", e);
        }
    }
}

impl<P: OutputPin> BuzzerPort for GpioBuzzer<P> {
    fn set_level(&mut self, _level: AlarmLevel) {
        self.drive(true);
    }

    fn set_off(&mut self) {
        self.drive(false);
    }
}

/// Passive piezo on the LEDC buzzer channel; pitch encodes the level.
pub struct ToneBuzzer {
    warn_hz: u32,
    danger_hz: u32,
}

impl ToneBuzzer {
    pub fn new(warn_hz: u32, danger_hz: u32) -> Self {
        Self { warn_hz, danger_hz }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.buzzer_warn_freq_hz, config.buzzer_danger_freq_hz)
    }
}

impl BuzzerPort for ToneBuzzer {
    fn set_level(&mut self, level: AlarmLevel) {
        let hz = if level == AlarmLevel::Danger {
            self.danger_hz
        } else {
            self.warn_hz
        };
        hw_init::ledc_tone(hz);
    }

    fn set_off(&mut self) {
        hw_init::ledc_tone(0);
    }
}
