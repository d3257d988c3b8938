//! One-shot hardware peripheral initialization.
//!
//! Configures the MQ-7 ADC channel, the buzzer output and the LEDC
//! timers/channels using raw ESP-IDF sys calls.  Called once from `main()`
//! before the control loop starts.
//!
//! On host builds every accessor is a simulation stub; LEDC writes are
//! recorded in atomics so drivers can be tested without hardware.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use esp_idf_svc::sys::*;

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

/// How the buzzer pin is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerOutput {
    /// Plain GPIO level (active buzzer).
    Gpio,
    /// LEDC square wave (passive piezo), initial frequency in Hz.
    Tone(u32),
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use log::info;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use crate::pins;

pub const LEDC_CH_HEATER: u32 = 0;
pub const LEDC_CH_BUZZER: u32 = 1;
/// 50 % square wave on the buzzer channel.
pub const TONE_DUTY: u8 = crate::pins::PWM_MAX_DUTY / 2 + 1;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn init_peripherals(buzzer: BuzzerOutput) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_ledc(buzzer)?;
        if buzzer == BuzzerOutput::Gpio {
            init_buzzer_gpio()?;
        }
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn init_peripherals(buzzer: BuzzerOutput) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped (buzzer={:?})", buzzer);
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 0 dB: ~1.1 V full scale, matching the divider in front of the pin.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_0,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::MQ7_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!(
        "hw_init: ADC1 configured (CH{}=MQ7 on GPIO{}, 0 dB)",
        pins::MQ7_ADC_CHANNEL,
        pins::MQ7_ADC_GPIO
    );
    Ok(())
}

/// One raw conversion.  A failed read returns 0, which the pipeline
/// turns into an undefined resistance.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

// ── GPIO ─────────────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn init_buzzer_gpio() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUZZER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: buzzer GPIO{} configured as output", pins::BUZZER_GPIO);
    Ok(())
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
static SIM_GPIO_HIGH: AtomicBool = AtomicBool::new(false);

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn gpio_write(_pin: i32, high: bool) {
    SIM_GPIO_HIGH.store(high, Ordering::Relaxed);
}

/// Last level written through [`gpio_write`] (host simulation only).
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn sim_gpio_level() -> bool {
    SIM_GPIO_HIGH.load(Ordering::Relaxed)
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn init_ledc(buzzer: BuzzerOutput) -> Result<(), HwInitError> {
    // Timer 0: heater
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::PWM_RESOLUTION_BITS as ledc_timer_bit_t,
        freq_hz: pins::HEATER_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_CH_HEATER,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: pins::MQ7_HEATER_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    if let BuzzerOutput::Tone(freq_hz) = buzzer {
        // Timer 1: buzzer tone, frequency retuned per alarm level.
        let timer1 = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: ledc_timer_t_LEDC_TIMER_1,
            duty_resolution: pins::PWM_RESOLUTION_BITS as ledc_timer_bit_t,
            freq_hz,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        let ret = unsafe { ledc_timer_config(&timer1) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: LEDC_CH_BUZZER,
            timer_sel: ledc_timer_t_LEDC_TIMER_1,
            gpio_num: pins::BUZZER_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    }

    info!("hw_init: LEDC configured (heater=CH0, buzzer={:?})", buzzer);
    Ok(())
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); duty register
    // writes are race-free since only the main loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty as u32);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

/// Drive the buzzer channel at `freq_hz` with 50 % duty; 0 Hz silences it.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn ledc_tone(freq_hz: u32) {
    if freq_hz == 0 {
        ledc_set(LEDC_CH_BUZZER, 0);
        return;
    }
    // SAFETY: timer 1 is only configured when the tone buzzer is selected;
    // main-loop access only.
    unsafe {
        ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_timer_t_LEDC_TIMER_1, freq_hz);
    }
    ledc_set(LEDC_CH_BUZZER, TONE_DUTY);
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
static SIM_LEDC_DUTY: [AtomicU8; 2] = [AtomicU8::new(0), AtomicU8::new(0)];
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
static SIM_TONE_HZ: AtomicU32 = AtomicU32::new(0);

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn ledc_set(channel: u32, duty: u8) {
    if let Some(slot) = SIM_LEDC_DUTY.get(channel as usize) {
        slot.store(duty, Ordering::Relaxed);
    }
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn ledc_tone(freq_hz: u32) {
    SIM_TONE_HZ.store(freq_hz, Ordering::Relaxed);
    ledc_set(LEDC_CH_BUZZER, if freq_hz == 0 { 0 } else { TONE_DUTY });
}

/// Last duty written to `channel` (host simulation only).
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn sim_ledc_duty(channel: u32) -> u8 {
    SIM_LEDC_DUTY
        .get(channel as usize)
        .map_or(0, |slot| slot.load(Ordering::Relaxed))
}

/// Last buzzer tone frequency (host simulation only).
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn sim_tone_hz() -> u32 {
    SIM_TONE_HZ.load(Ordering::Relaxed)
}
