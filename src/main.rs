//! CO monitor firmware: main entry point.
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (ADC + delay)     (EventSink)    (R0 + cfg)   (clock)         │
//! │  GpioBuzzer / ToneBuzzer          console (stdin → queue)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  pipeline · warm-up · calibration · alarm · buzzer     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{anyhow, Result};
use esp_idf_hal::delay::{Delay, FreeRtos};
use log::{info, warn};

use comonitor::adapters::console::spawn_console_reader;
use comonitor::adapters::hardware::{GpioBuzzer, HardwareAdapter, Mq7Adc, RawOutputPin, ToneBuzzer};
use comonitor::adapters::log_sink::LogEventSink;
use comonitor::adapters::nvs::NvsAdapter;
use comonitor::adapters::time::Esp32TimeAdapter;
use comonitor::alarm::AlarmLevel;
use comonitor::app::ports::{BuzzerPort, ConfigPort};
use comonitor::app::service::{CommandOutcome, MonitorService};
use comonitor::config::MonitorConfig;
use comonitor::drivers::heater::HeaterDriver;
use comonitor::drivers::hw_init::{self, BuzzerOutput};
use comonitor::events::drain_events;
use comonitor::pins;

/// The buzzer flavour is a config choice made once at boot.
enum Buzzer {
    Gpio(GpioBuzzer<RawOutputPin>),
    Tone(ToneBuzzer),
}

impl BuzzerPort for Buzzer {
    fn set_level(&mut self, level: AlarmLevel) {
        match self {
            Self::Gpio(b) => b.set_level(level),
            Self::Tone(b) => b.set_level(level),
        }
    }

    fn set_off(&mut self) {
        match self {
            Self::Gpio(b) => b.set_off(),
            Self::Tone(b) => b.set_off(),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CO monitor v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            NvsAdapter::detached()
        }
    };
    let config = match nvs.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            MonitorConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let buzzer_output = if config.buzzer_use_tone {
        BuzzerOutput::Tone(config.buzzer_warn_freq_hz)
    } else {
        BuzzerOutput::Gpio
    };
    hw_init::init_peripherals(buzzer_output).map_err(|e| anyhow!("HAL init failed: {}", e))?;

    let mut heater = HeaterDriver::new();
    heater.set_high();

    let clock = Esp32TimeAdapter::new();
    let mut hw = HardwareAdapter::new(Mq7Adc::new(), Delay::new_default());
    let mut buzzer = match buzzer_output {
        BuzzerOutput::Tone(_) => Buzzer::Tone(ToneBuzzer::from_config(&config)),
        BuzzerOutput::Gpio => Buzzer::Gpio(GpioBuzzer::new(
            RawOutputPin::new(pins::BUZZER_GPIO),
            config.buzzer_active_high,
        )),
    };
    let mut sink = LogEventSink::new();

    // ── 4. Service ────────────────────────────────────────────
    let mut service = MonitorService::new(config.clone(), clock.uptime_ms(), &nvs);
    service.start(clock.uptime_ms(), &mut buzzer, &mut sink);

    if let Err(e) = spawn_console_reader() {
        warn!("Console reader not started ({}), operator commands disabled", e);
    }

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        drain_events(|event| {
            let outcome =
                service.handle_command(event.into(), clock.uptime_ms(), &mut hw, &mut nvs, &mut sink);
            match outcome {
                CommandOutcome::Calibrated(r) => info!("MQ7 calibrate: OK (R0={:.0} ohm)", r.baseline_ohms),
                CommandOutcome::Rejected(e) => info!("MQ7 calibrate: FAIL ({})", e.category()),
                CommandOutcome::Reset => info!("MQ7 calibration reset (R0 fallback restored)"),
            }
        });

        service.tick(clock.uptime_ms(), &mut hw, &mut buzzer, &mut sink);

        FreeRtos::delay_ms(config.control_loop_interval_ms);
    }
}
