//! System configuration parameters
//!
//! All tunable parameters for the CabinGuard monitor.  Defaults match the
//! production calibration.  On the host simulator they can be overridden
//! from a JSON document; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Persistence counter ---
    /// Saturation ceiling of the persistence counter.
    pub max_counter: u8,
    /// Period of the decay tick (milliseconds).
    pub decay_interval_ms: u32,
    /// Motion inside this window before a decay tick holds the counter (milliseconds).
    pub detection_window_ms: u32,

    // --- Feature toggles ---
    /// Scale thresholds down as the cabin heats up.
    pub temperature_adjustment: bool,
    /// Honor the emergency-stop button.
    pub stop_interlock: bool,

    // --- Thresholds ---
    pub thresholds: ThresholdConfig,

    // --- Timing ---
    /// Persistence engine cycle period (milliseconds).
    pub engine_cycle_ms: u32,
    /// Alert scheduler tick period (milliseconds).
    pub alert_tick_ms: u32,
    /// Minimum spacing between environmental sensor reads (milliseconds).
    pub env_sample_interval_ms: u32,
    /// Status log dump interval (seconds).
    pub status_log_interval_secs: u32,
}

/// Base escalation thresholds and the temperature zones that scale them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub base_slow: u8,
    pub base_medium: u8,
    pub base_fast: u8,
    pub base_critical: u8,
    pub base_stop: u8,

    /// At or below this temperature no adjustment is applied (°C).
    pub comfortable_temp_c: f32,
    /// Start of the hot zone (°C).
    pub hot_temp_c: f32,
    /// Start of the critical zone (°C).
    pub critical_temp_c: f32,

    /// Multiplier applied throughout the hot zone.
    pub hot_factor: f32,
    /// Multiplier applied at and above the critical temperature.
    pub critical_factor: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            base_slow: 5,
            base_medium: 8,
            base_fast: 12,
            base_critical: 16,
            base_stop: 5,

            comfortable_temp_c: 22.0,
            hot_temp_c: 30.0,
            critical_temp_c: 35.0,

            hot_factor: 0.5,      // 50% reduction
            critical_factor: 0.3, // 70% reduction
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Persistence counter
            max_counter: 20,
            decay_interval_ms: 6_000,
            detection_window_ms: 5_500,

            // Features
            temperature_adjustment: true,
            stop_interlock: true,

            thresholds: ThresholdConfig::default(),

            // Timing
            engine_cycle_ms: 50,            // 20 Hz
            alert_tick_ms: 10,              // 100 Hz blink clock
            env_sample_interval_ms: 2_000,  // DHT22 minimum
            status_log_interval_secs: 5,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values rather than clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_counter == 0 {
            return Err(ConfigError::ValidationFailed("max_counter must be > 0"));
        }
        if self.detection_window_ms == 0 || self.detection_window_ms >= self.decay_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "detection_window_ms must be in (0, decay_interval_ms)",
            ));
        }
        if !(20..=100).contains(&self.engine_cycle_ms) {
            return Err(ConfigError::ValidationFailed("engine_cycle_ms must be 20..=100"));
        }
        if self.alert_tick_ms == 0 || self.alert_tick_ms > 50 {
            return Err(ConfigError::ValidationFailed("alert_tick_ms must be 1..=50"));
        }
        if self.env_sample_interval_ms < 2_000 {
            return Err(ConfigError::ValidationFailed("env_sample_interval_ms must be >= 2000"));
        }
        if !(5..=10).contains(&self.status_log_interval_secs) {
            return Err(ConfigError::ValidationFailed("status_log_interval_secs must be 5..=10"));
        }
        self.thresholds.validate()
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self;
        if !(t.base_slow < t.base_medium && t.base_medium < t.base_fast && t.base_fast < t.base_critical) {
            return Err(ConfigError::ValidationFailed(
                "base thresholds must be strictly increasing",
            ));
        }
        if t.base_stop == 0 {
            return Err(ConfigError::ValidationFailed("base_stop must be > 0"));
        }
        let temps = [t.comfortable_temp_c, t.hot_temp_c, t.critical_temp_c];
        if temps.iter().any(|v| !v.is_finite())
            || !(t.comfortable_temp_c < t.hot_temp_c && t.hot_temp_c < t.critical_temp_c)
        {
            return Err(ConfigError::ValidationFailed(
                "zone temperatures must be finite and increasing",
            ));
        }
        if !(t.critical_factor > 0.0 && t.critical_factor <= t.hot_factor && t.hot_factor <= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "factors must satisfy 0 < critical <= hot <= 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.max_counter, 20);
        assert!(c.detection_window_ms < c.decay_interval_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2 = SystemConfig::from_json(&json).unwrap();
        assert_eq!(c.max_counter, c2.max_counter);
        assert_eq!(c.thresholds, c2.thresholds);
        assert_eq!(c.engine_cycle_ms, c2.engine_cycle_ms);
    }

    #[test]
    fn partial_document_uses_defaults() {
        let c = SystemConfig::from_json(r#"{ "stop_interlock": false, "engine_cycle_ms": 100 }"#)
            .unwrap();
        assert!(!c.stop_interlock);
        assert_eq!(c.engine_cycle_ms, 100);
        assert_eq!(c.decay_interval_ms, 6_000);
        assert_eq!(c.thresholds.base_critical, 16);
    }

    #[test]
    fn malformed_document_is_parse_error() {
        assert!(matches!(
            SystemConfig::from_json("{ nope"),
            Err(ConfigError::Parse)
        ));
    }

    #[test]
    fn engine_cycle_out_of_range_rejected() {
        let c = SystemConfig {
            engine_cycle_ms: 500,
            ..SystemConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn window_must_fit_inside_decay_interval() {
        let c = SystemConfig {
            detection_window_ms: 6_000,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn non_monotonic_bases_rejected() {
        let mut c = SystemConfig::default();
        c.thresholds.base_fast = c.thresholds.base_medium;
        assert!(c.validate().is_err());
    }

    #[test]
    fn factor_order_enforced() {
        let mut c = SystemConfig::default();
        c.thresholds.critical_factor = 0.8;
        assert!(c.validate().is_err());
    }
}
