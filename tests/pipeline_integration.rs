//! Engine → channels → alert task, wired the way the firmware wires them
//! but on leaked per-test channels and a synthetic clock.

#![cfg(not(target_os = "espidf"))]

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use cabinguard::app::ports::{MotionSource, SampleSource, StopSource};
use cabinguard::app::service::{EngineInputs, MonitorService};
use cabinguard::config::SystemConfig;
use cabinguard::drivers::button::ButtonDriver;
use cabinguard::engine::{AlertCommand, AlertLevel, SystemMode};
use cabinguard::events::{Edge, EdgeLatch, EnvSample, SampleCell};
use cabinguard::pipeline::channels::{AlertQueue, ChannelOutput, ReportQueue, StatusSignal};
use cabinguard::pipeline::tasks::AlertTask;

// ── Fixtures ──────────────────────────────────────────────────

struct Channels {
    reports: &'static ReportQueue,
    alerts: &'static AlertQueue,
    status: &'static StatusSignal,
}

impl Channels {
    fn leak() -> Self {
        Self {
            reports: Box::leak(Box::new(ReportQueue::new("report"))),
            alerts: Box::leak(Box::new(AlertQueue::new("alert"))),
            status: Box::leak(Box::new(StatusSignal::new())),
        }
    }

    fn output(&self) -> ChannelOutput {
        ChannelOutput::new(self.reports, self.alerts, self.status)
    }
}

/// Records every level written to it.
#[derive(Default)]
struct RecordingPin {
    levels: Vec<bool>,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.push(true);
        Ok(())
    }
}

struct Latches {
    motion: &'static EdgeLatch,
    stop: &'static EdgeLatch,
    env: &'static SampleCell,
}

impl Latches {
    fn leak() -> Self {
        Self {
            motion: Box::leak(Box::new(EdgeLatch::new())),
            stop: Box::leak(Box::new(EdgeLatch::new())),
            env: Box::leak(Box::new(SampleCell::new())),
        }
    }
}

fn inputs(l: &Latches) -> EngineInputs<impl MotionSource, impl StopSource, impl SampleSource> {
    EngineInputs::new(l.motion, ButtonDriver::with_latch(16, l.stop), l.env)
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn slow_display_sees_newest_reports() {
    let ch = Channels::leak();
    let mut out = ch.output();
    let latches = Latches::leak();
    let mut ins = inputs(&latches);
    let mut service = MonitorService::new(&SystemConfig::default());

    for i in 1..=10u64 {
        service.tick(i * 50, &mut ins, &mut out);
    }

    assert_eq!(ch.reports.dropped(), 6);
    let seqs: Vec<u32> = core::iter::from_fn(|| ch.reports.try_pop()).map(|r| r.seq).collect();
    assert_eq!(seqs, vec![7, 8, 9, 10]);

    let latest = ch.status.try_take().map(|r| r.seq);
    assert_eq!(latest, Some(10));
    assert!(ch.status.try_take().is_none());
}

#[test]
fn isr_edges_reach_the_engine() {
    let ch = Channels::leak();
    let mut out = ch.output();
    let latches = Latches::leak();
    let mut ins = inputs(&latches);
    let mut service = MonitorService::new(&SystemConfig::default());

    // Three raw edges inside one cycle count as one motion event.
    latches.motion.trigger(10);
    latches.motion.trigger(20);
    latches.motion.trigger(30);
    let cycle = service.tick(50, &mut ins, &mut out);
    assert_eq!(cycle.report.counter, 1);
    assert_eq!(latches.motion.coalesced(), 2);

    latches.env.publish(EnvSample {
        temperature_c: 35.0,
        humidity_pct: 40.0,
        valid: true,
        timestamp_ms: 60,
    });
    for t in [70, 120, 170] {
        latches.motion.trigger(t);
        service.tick(u64::from(t) + 30, &mut ins, &mut out);
    }
    assert_eq!(service.engine().counter(), 4);
    assert_eq!(service.engine().level(), AlertLevel::Critical);
}

#[test]
fn critical_alert_blinks_then_goes_dark_on_stop() {
    let ch = Channels::leak();
    let mut out = ch.output();
    let latches = Latches::leak();
    let mut ins = inputs(&latches);
    let mut service = MonitorService::new(&SystemConfig::default());
    let mut alert = AlertTask::new(RecordingPin::default(), ch.alerts);

    latches.env.publish(EnvSample {
        temperature_c: 35.0,
        humidity_pct: 40.0,
        valid: true,
        timestamp_ms: 0,
    });
    for i in 1..=4u32 {
        latches.motion.trigger(i * 50 - 10);
        service.tick(u64::from(i) * 50, &mut ins, &mut out);
    }
    assert_eq!(service.engine().level(), AlertLevel::Critical);

    // Critical toggles every 100 ms, starting lit.
    assert!(alert.step(200));
    assert!(alert.step(250));
    assert!(!alert.step(300));
    assert!(alert.step(400));
    assert_eq!(alert.scheduler().blink_rate(), 4);

    latches.stop.trigger(410);
    let cycle = service.tick(450, &mut ins, &mut out);
    assert_eq!(cycle.stop_command, Some(AlertCommand::STOPPED));
    assert_eq!(cycle.report.mode, SystemMode::Stopped);

    // Stop command and the cycle command fold into one dark state.
    assert!(!alert.step(450));
    assert!(!alert.step(600));
    assert!(alert.merged() >= 1);

    let pin = alert.into_pin();
    assert_eq!(pin.levels, vec![true, false, true, false]);
}

#[test]
fn edge_helpers_are_consistent() {
    let latch = EdgeLatch::new();
    assert!(!latch.is_pending());
    latch.trigger(5);
    assert!(latch.is_pending());
    assert_eq!(latch.take(10), Some(Edge { timestamp_ms: 5, count: 1 }));
    assert!(latch.take(20).is_none());
}
