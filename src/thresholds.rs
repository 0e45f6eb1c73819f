//! Temperature-adjusted threshold calculator.
//!
//! Converts a cabin temperature into the four escalation thresholds and
//! the stop threshold the persistence engine compares its counter
//! against.  Hotter cabins are more dangerous, so thresholds shrink as
//! the temperature climbs:
//!
//! ```text
//!  factor
//!   1.0 ┤━━━━━━━━━━━╮
//!       │            ╲  linear
//!   0.5 ┤             ╰━━━━━━━━━╮
//!   0.3 ┤                       ╰━━━━━━━━━
//!       └──────────┬───────────┬────────┬──▶ °C
//!                 22          30       35
//! ```
//!
//! Each base threshold is multiplied by the factor, truncated, then
//! clamped to its floor.  The computation is pure and may be called from
//! any task at any rate.

use crate::config::{SystemConfig, ThresholdConfig};
use crate::engine::AlertLevel;

/// Minimum value for each threshold after scaling.
pub const SLOW_FLOOR: u8 = 1;
pub const MEDIUM_FLOOR: u8 = 2;
pub const FAST_FLOOR: u8 = 3;
pub const CRITICAL_FLOOR: u8 = 4;
pub const STOP_FLOOR: u8 = 2;

/// One set of escalation thresholds, valid for a single temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSet {
    pub slow: u8,
    pub medium: u8,
    pub fast: u8,
    pub critical: u8,
    /// The stop button is honored only while the counter is above this.
    pub stop: u8,
}

impl ThresholdSet {
    /// Highest tier whose threshold the counter has reached.
    pub fn level_for(&self, counter: u8) -> AlertLevel {
        if counter >= self.critical {
            AlertLevel::Critical
        } else if counter >= self.fast {
            AlertLevel::Fast
        } else if counter >= self.medium {
            AlertLevel::Medium
        } else if counter >= self.slow {
            AlertLevel::Slow
        } else {
            AlertLevel::None
        }
    }

    /// Clamp to the floors and force strict ordering between tiers.
    ///
    /// The default calibration never needs the ordering pass; custom
    /// calibrations with tightly packed bases can.
    fn clamped(self) -> Self {
        let slow = self.slow.max(SLOW_FLOOR);
        let medium = self.medium.max(MEDIUM_FLOOR).max(slow.saturating_add(1));
        let fast = self.fast.max(FAST_FLOOR).max(medium.saturating_add(1));
        let critical = self.critical.max(CRITICAL_FLOOR).max(fast.saturating_add(1));
        Self {
            slow,
            medium,
            fast,
            critical,
            stop: self.stop.max(STOP_FLOOR),
        }
    }
}

/// Strategy seam for the engine: how a temperature becomes thresholds.
///
/// `None` means no trustworthy temperature has been seen yet.
pub trait ThresholdPolicy {
    fn thresholds(&self, temperature_c: Option<f32>) -> ThresholdSet;
}

/// The production threshold model.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdModel {
    config: ThresholdConfig,
    adaptive: bool,
}

impl Default for ThresholdModel {
    fn default() -> Self {
        Self::adaptive(ThresholdConfig::default())
    }
}

impl ThresholdModel {
    /// Temperature-adjusted thresholds.
    pub fn adaptive(config: ThresholdConfig) -> Self {
        Self { config, adaptive: true }
    }

    /// Base thresholds regardless of temperature.
    pub fn fixed(config: ThresholdConfig) -> Self {
        Self { config, adaptive: false }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            config: config.thresholds,
            adaptive: config.temperature_adjustment,
        }
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Multiplier for the given temperature.  Non-finite input gets 1.0.
    pub fn adjustment_factor(&self, temperature_c: f32) -> f32 {
        let c = &self.config;
        if !temperature_c.is_finite() {
            return 1.0;
        }
        if temperature_c >= c.critical_temp_c {
            c.critical_factor
        } else if temperature_c >= c.hot_temp_c {
            c.hot_factor
        } else if temperature_c > c.comfortable_temp_c {
            let span = c.hot_temp_c - c.comfortable_temp_c;
            let progress = (temperature_c - c.comfortable_temp_c) / span;
            1.0 - progress * (1.0 - c.hot_factor)
        } else {
            1.0
        }
    }

    /// Thresholds for one temperature reading.
    pub fn compute(&self, temperature_c: f32) -> ThresholdSet {
        if !self.adaptive {
            return self.base();
        }
        let factor = self.adjustment_factor(temperature_c);
        let scale = |base: u8| (f32::from(base) * factor) as u8;
        let c = &self.config;
        ThresholdSet {
            slow: scale(c.base_slow),
            medium: scale(c.base_medium),
            fast: scale(c.base_fast),
            critical: scale(c.base_critical),
            stop: scale(c.base_stop),
        }
        .clamped()
    }

    /// Unscaled thresholds (floors still apply).
    pub fn base(&self) -> ThresholdSet {
        let c = &self.config;
        ThresholdSet {
            slow: c.base_slow,
            medium: c.base_medium,
            fast: c.base_fast,
            critical: c.base_critical,
            stop: c.base_stop,
        }
        .clamped()
    }
}

impl ThresholdPolicy for ThresholdModel {
    fn thresholds(&self, temperature_c: Option<f32>) -> ThresholdSet {
        match temperature_c {
            Some(t) => self.compute(t),
            None => self.base(),
        }
    }
}

/// Thresholds for `temperature_c` under the default calibration.
pub fn calculate(temperature_c: f32) -> ThresholdSet {
    ThresholdModel::default().compute(temperature_c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(slow: u8, medium: u8, fast: u8, critical: u8, stop: u8) -> ThresholdSet {
        ThresholdSet { slow, medium, fast, critical, stop }
    }

    #[test]
    fn comfortable_cabin_uses_base_values() {
        assert_eq!(calculate(22.0), set(5, 8, 12, 16, 5));
        assert_eq!(calculate(-10.0), set(5, 8, 12, 16, 5));
    }

    #[test]
    fn hot_cabin_halves_thresholds() {
        assert_eq!(calculate(30.0), set(2, 4, 6, 8, 2));
        assert_eq!(calculate(34.9), set(2, 4, 6, 8, 2));
    }

    #[test]
    fn critical_cabin_hits_floors() {
        assert_eq!(calculate(35.0), set(1, 2, 3, 4, 2));
        assert_eq!(calculate(60.0), set(1, 2, 3, 4, 2));
    }

    #[test]
    fn interpolation_zone_is_linear() {
        let model = ThresholdModel::default();
        assert!((model.adjustment_factor(26.0) - 0.75).abs() < 1e-6);
        // 0.75 × (5, 8, 12, 16, 5) truncated
        assert_eq!(calculate(26.0), set(3, 6, 9, 12, 3));
    }

    #[test]
    fn non_finite_temperature_means_no_adjustment() {
        assert_eq!(calculate(f32::NAN), set(5, 8, 12, 16, 5));
        assert_eq!(calculate(f32::INFINITY), set(5, 8, 12, 16, 5));
    }

    #[test]
    fn fixed_model_ignores_temperature() {
        let model = ThresholdModel::fixed(ThresholdConfig::default());
        assert_eq!(model.compute(40.0), set(5, 8, 12, 16, 5));
        assert_eq!(model.thresholds(Some(40.0)), model.base());
    }

    #[test]
    fn policy_without_temperature_uses_base() {
        let model = ThresholdModel::default();
        assert_eq!(model.thresholds(None), set(5, 8, 12, 16, 5));
    }

    #[test]
    fn tight_custom_bases_stay_strictly_ordered() {
        let cfg = ThresholdConfig {
            base_slow: 2,
            base_medium: 3,
            base_fast: 4,
            base_critical: 5,
            ..ThresholdConfig::default()
        };
        let t = ThresholdModel::adaptive(cfg).compute(35.0);
        assert!(t.slow < t.medium && t.medium < t.fast && t.fast < t.critical);
    }

    #[test]
    fn level_for_picks_highest_tier() {
        let t = calculate(22.0);
        assert_eq!(t.level_for(0), AlertLevel::None);
        assert_eq!(t.level_for(4), AlertLevel::None);
        assert_eq!(t.level_for(5), AlertLevel::Slow);
        assert_eq!(t.level_for(8), AlertLevel::Medium);
        assert_eq!(t.level_for(12), AlertLevel::Fast);
        assert_eq!(t.level_for(16), AlertLevel::Critical);
        assert_eq!(t.level_for(20), AlertLevel::Critical);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn thresholds_monotonic_and_floored(temp in -40.0f32..90.0) {
            let t = calculate(temp);
            prop_assert!(t.slow < t.medium && t.medium < t.fast && t.fast < t.critical);
            prop_assert!(t.slow >= SLOW_FLOOR);
            prop_assert!(t.medium >= MEDIUM_FLOOR);
            prop_assert!(t.fast >= FAST_FLOOR);
            prop_assert!(t.critical >= CRITICAL_FLOOR);
            prop_assert!(t.stop >= STOP_FLOOR);
        }

        #[test]
        fn hotter_never_raises_thresholds(a in -40.0f32..90.0, b in -40.0f32..90.0) {
            let (cool, hot) = if a <= b { (a, b) } else { (b, a) };
            let tc = calculate(cool);
            let th = calculate(hot);
            prop_assert!(th.critical <= tc.critical);
            prop_assert!(th.slow <= tc.slow);
            prop_assert!(th.stop <= tc.stop);
        }
    }
}
