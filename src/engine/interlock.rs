//! Emergency-stop interlock.
//!
//! The stop button is inert unless the counter is strictly above the stop
//! threshold in force at the moment of the press.  Engaging it zeroes the
//! counter, so re-arming requires a full decay from zero.

use super::report::SystemMode;
use crate::thresholds::ThresholdSet;

/// Outcome of one stop press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Engaged,
    BelowThreshold { counter: u8, stop: u8 },
    Disabled,
    AlreadyStopped,
}

impl StopDecision {
    pub fn is_engaged(self) -> bool {
        self == Self::Engaged
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StopInterlock {
    enabled: bool,
    engagements: u32,
}

impl StopInterlock {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            engagements: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of times the interlock has engaged since boot.
    pub fn engagements(&self) -> u32 {
        self.engagements
    }

    /// Gate a press against the current state.  Does not mutate the
    /// engine; the caller applies the transition on `Engaged`.
    pub fn evaluate(&mut self, mode: SystemMode, counter: u8, thresholds: &ThresholdSet) -> StopDecision {
        if !self.enabled {
            return StopDecision::Disabled;
        }
        if mode == SystemMode::Stopped {
            return StopDecision::AlreadyStopped;
        }
        if counter <= thresholds.stop {
            return StopDecision::BelowThreshold {
                counter,
                stop: thresholds.stop,
            };
        }
        self.engagements = self.engagements.wrapping_add(1);
        StopDecision::Engaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::calculate;

    #[test]
    fn inert_at_or_below_stop_threshold() {
        let mut lock = StopInterlock::new(true);
        let t = calculate(22.0);
        assert_eq!(
            lock.evaluate(SystemMode::Active, 5, &t),
            StopDecision::BelowThreshold { counter: 5, stop: 5 }
        );
        assert_eq!(lock.engagements(), 0);
    }

    #[test]
    fn engages_above_stop_threshold() {
        let mut lock = StopInterlock::new(true);
        let t = calculate(35.0);
        assert!(lock.evaluate(SystemMode::Active, 3, &t).is_engaged());
        assert_eq!(lock.engagements(), 1);
    }

    #[test]
    fn disabled_interlock_ignores_everything() {
        let mut lock = StopInterlock::new(false);
        let t = calculate(35.0);
        assert_eq!(lock.evaluate(SystemMode::Active, 20, &t), StopDecision::Disabled);
    }

    #[test]
    fn second_press_while_stopped_is_ignored() {
        let mut lock = StopInterlock::new(true);
        let t = calculate(22.0);
        assert_eq!(
            lock.evaluate(SystemMode::Stopped, 0, &t),
            StopDecision::AlreadyStopped
        );
    }
}
