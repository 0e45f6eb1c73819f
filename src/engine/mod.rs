//! Persistence engine: the motion counter state machine.
//!
//! ```text
//!            motion (Active only)          decay tick, no recent motion
//!   counter ─────────────────────▶ +1 ≤ max ─────────────────────▶ −1 ≥ 0
//!
//!           stop, counter > stop                counter == 0 at decay tick
//!   Active ─────────────────────▶ Stopped ───────────────────────────▶ Active
//!                                 counter := 0
//! ```
//!
//! One [`PersistenceEngine::cycle`] call per engine period.  Inside a
//! cycle the order is fixed: environment, stop, motion, decay, recompute,
//! emit.  The engine owns all of its state; other tasks only ever see the
//! values it emits.

pub mod interlock;
pub mod report;

pub use interlock::{StopDecision, StopInterlock};
pub use report::{AlertCommand, AlertLevel, EnvSnapshot, MotionReport, SystemMode, status_tag};

use log::{debug, info};

use crate::config::SystemConfig;
use crate::events::{Edge, EnvSample};
use crate::thresholds::{ThresholdModel, ThresholdPolicy, ThresholdSet};

/// Everything drained for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleInputs {
    pub motion: Option<Edge>,
    pub stop: bool,
    pub env: Option<EnvSample>,
}

/// What one cycle emits.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutput {
    pub report: MotionReport,
    pub command: AlertCommand,
    /// Set only in the cycle the interlock engaged; dispatch before `command`.
    pub stop_command: Option<AlertCommand>,
}

#[derive(Debug, Clone, Copy)]
struct Timing {
    max_counter: u8,
    decay_interval_ms: u64,
    detection_window_ms: u64,
}

pub struct PersistenceEngine<P: ThresholdPolicy = ThresholdModel> {
    policy: P,
    interlock: StopInterlock,
    timing: Timing,

    counter: u8,
    mode: SystemMode,
    last_motion_ms: Option<u64>,
    last_decay_ms: u64,
    last_level: AlertLevel,
    last_env: Option<EnvSnapshot>,
    /// A stop engaged this cycle; the next emitted command must resync.
    force_pending: bool,
    seq: u32,
}

impl PersistenceEngine<ThresholdModel> {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self::with_policy(config, ThresholdModel::from_config(config))
    }
}

impl<P: ThresholdPolicy> PersistenceEngine<P> {
    pub fn with_policy(config: &SystemConfig, policy: P) -> Self {
        Self {
            policy,
            interlock: StopInterlock::new(config.stop_interlock),
            timing: Timing {
                max_counter: config.max_counter,
                decay_interval_ms: u64::from(config.decay_interval_ms),
                detection_window_ms: u64::from(config.detection_window_ms),
            },
            counter: 0,
            mode: SystemMode::Active,
            last_motion_ms: None,
            last_decay_ms: 0,
            last_level: AlertLevel::None,
            last_env: None,
            force_pending: false,
            seq: 0,
        }
    }

    /// Run one engine cycle.
    pub fn cycle(&mut self, inputs: CycleInputs, now_ms: u64) -> CycleOutput {
        if let Some(sample) = inputs.env {
            self.update_env(sample);
        }

        let stop_command = if inputs.stop && self.handle_stop().is_engaged() {
            Some(AlertCommand::STOPPED)
        } else {
            None
        };

        if let Some(edge) = inputs.motion {
            self.handle_motion(edge);
        }

        if now_ms.saturating_sub(self.last_decay_ms) >= self.timing.decay_interval_ms {
            self.decay_tick(now_ms);
        }

        let thresholds = self.thresholds();
        let level = match self.mode {
            SystemMode::Active => thresholds.level_for(self.counter),
            SystemMode::Stopped => AlertLevel::None,
        };

        let force_update = level != self.last_level || self.force_pending;
        if level != self.last_level {
            info!(
                "Alert level {:?} -> {:?} (counter={})",
                self.last_level, level, self.counter
            );
        }
        self.last_level = level;
        self.force_pending = false;

        self.seq = self.seq.wrapping_add(1);
        let report = MotionReport {
            seq: self.seq,
            timestamp_ms: now_ms,
            counter: self.counter,
            level,
            mode: self.mode,
            thresholds,
            env: self.last_env,
            status: status_tag(self.mode, self.counter, level),
        };

        CycleOutput {
            report,
            command: AlertCommand::for_level(level, force_update),
            stop_command,
        }
    }

    /// Gate a stop press and apply it if honored.
    pub fn handle_stop(&mut self) -> StopDecision {
        let thresholds = self.thresholds();
        let decision = self.interlock.evaluate(self.mode, self.counter, &thresholds);
        match decision {
            StopDecision::Engaged => {
                info!(
                    "Stop interlock engaged at counter={} (stop={}): Active -> Stopped",
                    self.counter, thresholds.stop
                );
                self.mode = SystemMode::Stopped;
                self.counter = 0;
                self.force_pending = true;
            }
            other => debug!("Stop press ignored: {:?}", other),
        }
        decision
    }

    fn handle_motion(&mut self, edge: Edge) {
        if self.mode == SystemMode::Stopped {
            debug!("Motion ignored while stopped");
            return;
        }
        self.counter = self.counter.saturating_add(1).min(self.timing.max_counter);
        self.last_motion_ms = Some(edge.timestamp_ms);
    }

    fn decay_tick(&mut self, now_ms: u64) {
        let recent_motion = self
            .last_motion_ms
            .is_some_and(|t| now_ms.saturating_sub(t) < self.timing.detection_window_ms);
        if !recent_motion {
            self.counter = self.counter.saturating_sub(1);
        }
        if self.mode == SystemMode::Stopped && self.counter == 0 {
            info!("Counter decayed to zero: Stopped -> Active");
            self.mode = SystemMode::Active;
        }
        self.last_decay_ms = now_ms;
    }

    fn update_env(&mut self, sample: EnvSample) {
        if sample.is_usable() {
            self.last_env = Some(EnvSnapshot {
                temperature_c: sample.temperature_c,
                humidity_pct: sample.humidity_pct,
                timestamp_ms: sample.timestamp_ms,
            });
        } else {
            debug!("Invalid environment sample ignored, keeping last known-good");
        }
    }

    /// Thresholds for the last known-good temperature.
    pub fn thresholds(&self) -> ThresholdSet {
        self.policy.thresholds(self.last_env.map(|e| e.temperature_c))
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    pub fn level(&self) -> AlertLevel {
        self.last_level
    }

    pub fn last_env(&self) -> Option<EnvSnapshot> {
        self.last_env
    }

    pub fn interlock(&self) -> &StopInterlock {
        &self.interlock
    }

    /// Sequence number of the most recent report.
    pub fn seq(&self) -> u32 {
        self.seq
    }
}
