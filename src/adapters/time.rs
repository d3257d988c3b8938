//! ESP32 time adapter.
//!
//! Provides the monotonic millisecond clock every domain call is fed with.
//!
//! - **ESP-IDF with the `espidf` feature**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **everything else**: uses `std::time::Instant` for
//!   host-side testing and simulation.

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a read of the RTC-backed counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since this adapter was created (monotonic).
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
