//! Monitor service: the engine task's domain core.
//!
//! [`MonitorService`] owns the [`PersistenceEngine`].  Each tick it drains
//! the event sources, runs one engine cycle, and hands the results to an
//! [`EngineOutput`].  All I/O flows through port traits, so the whole
//! service runs under test with plain in-memory adapters.
//!
//! ```text
//!  MotionSource ──▶ ┌────────────────────┐
//!  StopSource   ──▶ │   MonitorService    │ ──▶ EngineOutput
//!  SampleSource ──▶ │  PersistenceEngine  │
//!                   └────────────────────┘
//! ```

use crate::config::SystemConfig;
use crate::engine::{CycleInputs, CycleOutput, PersistenceEngine, SystemMode};
use crate::thresholds::{ThresholdModel, ThresholdPolicy};

use super::ports::{EngineOutput, MotionSource, SampleSource, StopSource};

/// The three event sources the engine drains each cycle.
pub struct EngineInputs<M, S, E> {
    pub motion: M,
    pub stop: S,
    pub env: E,
}

impl<M: MotionSource, S: StopSource, E: SampleSource> EngineInputs<M, S, E> {
    pub fn new(motion: M, stop: S, env: E) -> Self {
        Self { motion, stop, env }
    }

    /// Drain every source once.
    pub fn drain(&mut self, now_ms: u64) -> CycleInputs {
        CycleInputs {
            motion: self.motion.take_motion(now_ms),
            stop: self.stop.take_press(now_ms),
            env: self.env.take_sample(),
        }
    }
}

pub struct MonitorService<P: ThresholdPolicy = ThresholdModel> {
    engine: PersistenceEngine<P>,
    cycles: u64,
    stops: u32,
}

impl MonitorService<ThresholdModel> {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_engine(PersistenceEngine::from_config(config))
    }
}

impl<P: ThresholdPolicy> MonitorService<P> {
    pub fn with_engine(engine: PersistenceEngine<P>) -> Self {
        Self {
            engine,
            cycles: 0,
            stops: 0,
        }
    }

    /// One engine period: drain → cycle → publish.
    ///
    /// An out-of-cycle stop command is published before the regular
    /// report and command so the LED goes dark first.
    pub fn tick<M, S, E>(
        &mut self,
        now_ms: u64,
        inputs: &mut EngineInputs<M, S, E>,
        out: &mut impl EngineOutput,
    ) -> CycleOutput
    where
        M: MotionSource,
        S: StopSource,
        E: SampleSource,
    {
        let drained = inputs.drain(now_ms);
        let cycle = self.engine.cycle(drained, now_ms);
        self.cycles += 1;

        if let Some(stop) = cycle.stop_command {
            self.stops += 1;
            out.publish_command(stop);
        }
        out.publish_report(&cycle.report);
        out.publish_command(cycle.command);
        cycle
    }

    pub fn engine(&self) -> &PersistenceEngine<P> {
        &self.engine
    }

    pub fn mode(&self) -> SystemMode {
        self.engine.mode()
    }

    /// Cycles run since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    /// Times the stop interlock has engaged since startup.
    pub fn stop_count(&self) -> u32 {
        self.stops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AlertCommand, MotionReport};
    use crate::events::{Edge, EnvSample};

    #[derive(Default)]
    struct Script {
        motion_at: Vec<u64>,
        press_at: Vec<u64>,
    }

    impl MotionSource for Script {
        fn take_motion(&mut self, now_ms: u64) -> Option<Edge> {
            self.motion_at
                .contains(&now_ms)
                .then_some(Edge { timestamp_ms: now_ms, count: 1 })
        }
    }

    impl StopSource for Script {
        fn take_press(&mut self, now_ms: u64) -> bool {
            self.press_at.contains(&now_ms)
        }
    }

    struct NoSamples;

    impl SampleSource for NoSamples {
        fn take_sample(&mut self) -> Option<EnvSample> {
            None
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<&'static str>,
        commands: Vec<AlertCommand>,
        reports: Vec<MotionReport>,
    }

    impl EngineOutput for Recorder {
        fn publish_report(&mut self, report: &MotionReport) {
            self.events.push("report");
            self.reports.push(*report);
        }

        fn publish_command(&mut self, command: AlertCommand) {
            self.events.push("command");
            self.commands.push(command);
        }
    }

    #[test]
    fn each_tick_publishes_report_then_command() {
        let mut svc = MonitorService::new(&SystemConfig::default());
        let mut inputs = EngineInputs::new(Script::default(), Script::default(), NoSamples);
        let mut out = Recorder::default();
        svc.tick(50, &mut inputs, &mut out);
        svc.tick(100, &mut inputs, &mut out);
        assert_eq!(out.events, vec!["report", "command", "report", "command"]);
        assert_eq!(out.reports[1].seq, 2);
        assert_eq!(svc.cycle_count(), 2);
    }

    #[test]
    fn stop_command_published_first() {
        let mut svc = MonitorService::new(&SystemConfig::default());
        let times: Vec<u64> = (1..=6).map(|i| i * 50).collect();
        let motion = Script { motion_at: times.clone(), ..Script::default() };
        let stop = Script { press_at: vec![350], ..Script::default() };
        let mut inputs = EngineInputs::new(motion, stop, NoSamples);
        let mut out = Recorder::default();

        for t in times {
            svc.tick(t, &mut inputs, &mut out);
        }
        out.events.clear();
        out.commands.clear();

        svc.tick(350, &mut inputs, &mut out);
        assert_eq!(out.events, vec!["command", "report", "command"]);
        assert_eq!(out.commands[0], AlertCommand::STOPPED);
        assert_eq!(svc.mode(), SystemMode::Stopped);
        assert_eq!(svc.stop_count(), 1);
    }
}
