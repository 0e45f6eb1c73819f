//! Environmental sensing: the DHT22 driver and the sampler that feeds
//! the engine.
//!
//! The sampler rate-limits physical reads, rejects implausible values,
//! and turns every attempt into an [`EnvSample`].  Failed reads become
//! `valid = false` samples; the engine keeps its last good reading.

pub mod dht;

use log::{debug, warn};

use crate::app::ports::{EnvReading, EnvironmentPort};
use crate::error::SensorError;
use crate::events::EnvSample;

/// Physical range of the DHT22.
const TEMP_RANGE_C: core::ops::RangeInclusive<f32> = -40.0..=80.0;
const HUMIDITY_RANGE_PCT: core::ops::RangeInclusive<f32> = 0.0..=100.0;

/// Warn once per this many consecutive failures.
const FAILURE_LOG_EVERY: u32 = 10;

pub struct EnvironmentSampler<E: EnvironmentPort> {
    port: E,
    min_interval_ms: u64,
    last_read_ms: Option<u64>,
    consecutive_failures: u32,
    total_failures: u32,
}

impl<E: EnvironmentPort> EnvironmentSampler<E> {
    pub fn new(port: E, min_interval_ms: u32) -> Self {
        Self {
            port,
            min_interval_ms: u64::from(min_interval_ms),
            last_read_ms: None,
            consecutive_failures: 0,
            total_failures: 0,
        }
    }

    /// Whether a read is allowed at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_read_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.min_interval_ms)
    }

    /// Read once if due.  `None` means the sensor is still resting.
    pub fn sample(&mut self, now_ms: u64) -> Option<EnvSample> {
        if !self.is_due(now_ms) {
            return None;
        }
        self.last_read_ms = Some(now_ms);

        match self.port.read().and_then(check_plausible) {
            Ok(r) => {
                if self.consecutive_failures > 0 {
                    debug!("Environment sensor recovered after {} failures", self.consecutive_failures);
                }
                self.consecutive_failures = 0;
                Some(EnvSample {
                    temperature_c: r.temperature_c,
                    humidity_pct: r.humidity_pct,
                    valid: true,
                    timestamp_ms: now_ms,
                })
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.total_failures = self.total_failures.wrapping_add(1);
                if self.consecutive_failures % FAILURE_LOG_EVERY == 1 {
                    warn!(
                        "Environment read failed: {} ({} in a row)",
                        e, self.consecutive_failures
                    );
                }
                Some(EnvSample::invalid(now_ms))
            }
        }
    }

    pub fn total_failures(&self) -> u32 {
        self.total_failures
    }
}

fn check_plausible(r: EnvReading) -> Result<EnvReading, SensorError> {
    if TEMP_RANGE_C.contains(&r.temperature_c) && HUMIDITY_RANGE_PCT.contains(&r.humidity_pct) {
        Ok(r)
    } else {
        Err(SensorError::OutOfRange)
    }
}
