//! ESP32 time adapter.
//!
//! Provides monotonic time queries for every CabinGuard task.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** uses `std::time::Instant` for
//!   host-side testing and simulation.  The epoch is process-wide and
//!   fixed on first use, so every adapter (and the async timer driver)
//!   agrees on "now".

#[cfg(not(target_os = "espidf"))]
use std::sync::OnceLock;
#[cfg(not(target_os = "espidf"))]
use std::time::Instant;

use crate::app::ports::TimePort;

/// Simulated boot instant.
#[cfg(not(target_os = "espidf"))]
static HOST_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Time adapter for the ESP32-S3 platform.
#[derive(Debug, Clone, Copy)]
pub struct Esp32TimeAdapter {
    _private: (),
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        #[cfg(not(target_os = "espidf"))]
        HOST_EPOCH.get_or_init(Instant::now);
        Self { _private: () }
    }

    /// Seconds since boot (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        HOST_EPOCH.get_or_init(Instant::now).elapsed().as_micros() as u64
    }

    /// Milliseconds since boot, truncated for ISR-side timestamps.
    pub fn now_ms_u32(&self) -> u32 {
        self.now_ms() as u32
    }
}

impl TimePort for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_share_epoch() {
        let a = Esp32TimeAdapter::new();
        let b = a;
        std::thread::sleep(std::time::Duration::from_millis(5));
        let (ta, tb) = (a.now_ms(), b.now_ms());
        assert!(ta >= 5);
        assert!(ta.abs_diff(tb) <= 1);
    }

    #[test]
    fn separately_built_adapters_share_epoch() {
        let first = Esp32TimeAdapter::new();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = Esp32TimeAdapter::new();
        let (t1, t2) = (first.now_ms(), second.now_ms());
        assert!(t2 >= 20);
        assert!(t1.abs_diff(t2) <= 1);
    }
}
