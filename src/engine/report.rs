//! Engine output values: one [`MotionReport`] and one [`AlertCommand`]
//! per cycle.  Both are plain `Copy` data so they move through the
//! pipeline queues without allocation.

use crate::thresholds::ThresholdSet;

/// Alert severity.  The discriminant doubles as the blink rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum AlertLevel {
    #[default]
    None = 0,
    Slow = 1,
    Medium = 2,
    Fast = 3,
    Critical = 4,
}

impl AlertLevel {
    /// Blink rate for the alert scheduler (0 = off, 4 = fastest).
    pub fn blink_rate(self) -> u8 {
        self as u8
    }

    /// Tier label shown once the counter is non-zero.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Motion Brief",
            Self::Slow => "Low",
            Self::Medium => "Medium",
            Self::Fast => "High",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemMode {
    #[default]
    Active,
    /// Entered by an honored stop press; left when the counter decays to 0.
    Stopped,
}

/// Last known-good environmental reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvSnapshot {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub timestamp_ms: u64,
}

/// Everything one engine cycle decided, frozen at emission time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReport {
    /// Monotonically increasing cycle number.
    pub seq: u32,
    pub timestamp_ms: u64,
    pub counter: u8,
    pub level: AlertLevel,
    pub mode: SystemMode,
    pub thresholds: ThresholdSet,
    pub env: Option<EnvSnapshot>,
    pub status: &'static str,
}

/// Instruction for the alert scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCommand {
    /// 0 = off, 1..=4 slow to critical.
    pub blink_rate: u8,
    pub active: bool,
    /// Restart the blink phase instead of carrying it over.
    pub force_update: bool,
}

impl AlertCommand {
    /// Emitted out-of-cycle when the stop interlock engages.
    pub const STOPPED: Self = Self {
        blink_rate: 0,
        active: false,
        force_update: true,
    };

    pub fn for_level(level: AlertLevel, force_update: bool) -> Self {
        Self {
            blink_rate: level.blink_rate(),
            active: level != AlertLevel::None,
            force_update,
        }
    }

    /// Fold a newer command over this one.
    ///
    /// Consumers that skip intermediate commands must not lose a resync
    /// request, so the force flag is sticky across the merge.
    #[must_use]
    pub fn merge(self, newer: Self) -> Self {
        Self {
            force_update: self.force_update || newer.force_update,
            ..newer
        }
    }
}

/// Human-readable status, derived from `(mode, counter, level)` only.
pub fn status_tag(mode: SystemMode, counter: u8, level: AlertLevel) -> &'static str {
    match (mode, counter) {
        (SystemMode::Stopped, _) => "ALERT STOPPED",
        (SystemMode::Active, 0) => "No Motion",
        (SystemMode::Active, _) => level.label(),
    }
}
