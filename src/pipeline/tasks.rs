//! Task bodies.
//!
//! ```text
//!  ┌───────────────────────────────┐   ┌───────────────────────────────┐
//!  │ Core 1 (APP_CPU)              │   │ Core 0 (PRO_CPU)              │
//!  │                               │   │                               │
//!  │  engine   50 ms  drain/cycle  │   │  sampler  2 s   DHT22 read    │
//!  │  alert    10 ms  blink clock  │   │  sinks    async (edge-exec)   │
//!  │                               │   │   ├─ display  wake-on-report  │
//!  │                               │   │   └─ status   every 5 s       │
//!  └───────────────────────────────┘   └───────────────────────────────┘
//! ```
//!
//! The engine, alert and sampler loops are plain periodic threads.  The
//! sinks share one thread running an `edge-executor` with two futures:
//! the display wakes as soon as a report is queued, the status logger
//! sleeps on an `async-io-mini` reactor timer.

use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use super::channels::{AlertQueue, ChannelOutput, ReportQueue, StatusSignal};
use crate::adapters::status_log::log_status;
use crate::adapters::time::Esp32TimeAdapter;
use crate::alert::AlertScheduler;
use crate::app::ports::{DisplaySink, EnvironmentPort, MotionSource, SampleSource, StopSource, TimePort};
use crate::app::service::{EngineInputs, MonitorService};
use crate::diagnostics::RuntimeMetrics;
use crate::drivers::alert_led::AlertLed;
use crate::drivers::watchdog::Watchdog;
use crate::engine::{AlertCommand, MotionReport};
use crate::events::SampleCell;
use crate::sensors::EnvironmentSampler;

// ── Fixed-rate pacing ─────────────────────────────────────────

/// Sleeps to the next multiple of a period, without drift.
pub struct Ticker {
    period_ms: u64,
    next_ms: u64,
    overruns: u32,
}

impl Ticker {
    pub fn new(period_ms: u32, now_ms: u64) -> Self {
        Self {
            period_ms: u64::from(period_ms),
            next_ms: now_ms,
            overruns: 0,
        }
    }

    /// Advance the deadline and return how long to sleep for it.
    ///
    /// A deadline more than one period in the past is skipped rather than
    /// replayed in a burst.
    pub fn advance(&mut self, now_ms: u64) -> Duration {
        self.next_ms += self.period_ms;
        if now_ms >= self.next_ms + self.period_ms {
            self.overruns = self.overruns.wrapping_add(1);
            self.next_ms = now_ms;
            return Duration::ZERO;
        }
        Duration::from_millis(self.next_ms.saturating_sub(now_ms))
    }

    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    fn wait(&mut self, time: &impl TimePort) {
        let sleep = self.advance(time.now_ms());
        if !sleep.is_zero() {
            std::thread::sleep(sleep);
        }
    }
}

// ── Engine ────────────────────────────────────────────────────

/// Engine task body.  Never returns.
pub fn run_engine<M, S, E>(
    period_ms: u32,
    mut service: MonitorService,
    mut inputs: EngineInputs<M, S, E>,
    time: impl TimePort,
) where
    M: MotionSource,
    S: StopSource,
    E: SampleSource,
{
    // The TWDT subscribes the calling task, so this must run on the engine thread.
    let watchdog = Watchdog::new();
    let mut out = ChannelOutput::global();
    let mut ticker = Ticker::new(period_ms, time.now_ms());
    info!("Engine task running ({} ms cycle)", period_ms);

    loop {
        service.tick(time.now_ms(), &mut inputs, &mut out);
        watchdog.feed();
        let before = ticker.overruns();
        ticker.wait(&time);
        if ticker.overruns() != before {
            warn!("Engine cycle overran its {} ms period", period_ms);
        }
    }
}

// ── Alert ─────────────────────────────────────────────────────

/// Blink clock plus the LED it drives.
pub struct AlertTask<P: OutputPin> {
    scheduler: AlertScheduler,
    led: AlertLed<P>,
    queue: &'static AlertQueue,
    merged: u32,
    write_errors: u32,
}

impl<P: OutputPin> AlertTask<P> {
    pub fn new(pin: P, queue: &'static AlertQueue) -> Self {
        Self {
            scheduler: AlertScheduler::new(),
            led: AlertLed::new(pin),
            queue,
            merged: 0,
            write_errors: 0,
        }
    }

    /// One scheduler tick: fold pending commands, advance the clock,
    /// drive the LED.  Returns the LED state.
    pub fn step(&mut self, now_ms: u64) -> bool {
        let mut latest: Option<AlertCommand> = None;
        while let Some(cmd) = self.queue.try_pop() {
            latest = Some(match latest {
                Some(prev) => {
                    self.merged = self.merged.wrapping_add(1);
                    prev.merge(cmd)
                }
                None => cmd,
            });
        }
        if let Some(cmd) = latest {
            self.scheduler.apply(cmd, now_ms);
        }

        let on = self.scheduler.tick(now_ms);
        if self.led.set(on).is_err() {
            self.write_errors = self.write_errors.wrapping_add(1);
            if self.write_errors == 1 {
                warn!("Alert LED write failed");
            }
        }
        on
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    /// Commands folded into a newer one since boot.
    pub fn merged(&self) -> u32 {
        self.merged
    }

    pub fn into_pin(self) -> P {
        self.led.release()
    }
}

/// Alert task body.  Never returns.
pub fn run_alert<P: OutputPin>(tick_ms: u32, mut task: AlertTask<P>, time: impl TimePort) {
    let mut ticker = Ticker::new(tick_ms, time.now_ms());
    info!("Alert task running ({} ms tick)", tick_ms);
    loop {
        task.step(time.now_ms());
        ticker.wait(&time);
    }
}

// ── Environment sampler ───────────────────────────────────────

/// Sampler task body.  Never returns.
pub fn run_sampler<E: EnvironmentPort>(
    interval_ms: u32,
    mut sampler: EnvironmentSampler<E>,
    cell: &'static SampleCell,
    time: impl TimePort,
) {
    let mut ticker = Ticker::new(interval_ms, time.now_ms());
    info!("Sampler task running ({} ms interval)", interval_ms);
    loop {
        if let Some(sample) = sampler.sample(time.now_ms()) {
            cell.publish(sample);
        }
        ticker.wait(&time);
    }
}

// ── Sinks (async) ─────────────────────────────────────────────

/// Display consumer.  Wakes on every queued report.
pub async fn display_loop(mut display: impl DisplaySink, queue: &'static ReportQueue) {
    loop {
        let report = queue.pop().await;
        display.render(&report);
    }
}

/// Periodic status dump.  Every `interval`, `dump` gets the newest report
/// published so far (`None` before the first).
pub async fn status_loop(
    signal: &'static StatusSignal,
    interval: Duration,
    time: Esp32TimeAdapter,
    mut dump: impl FnMut(Option<&MotionReport>, &RuntimeMetrics),
) {
    let mut latest: Option<MotionReport> = None;
    loop {
        async_io_mini::Timer::after(interval).await;
        if let Some(report) = signal.try_take() {
            latest = Some(report);
        }
        dump(latest.as_ref(), &RuntimeMetrics::collect(time.uptime_secs()));
    }
}

/// Sinks thread body: both consumers on one local executor.
pub fn run_sinks(
    display: impl DisplaySink + 'static,
    reports: &'static ReportQueue,
    status: &'static StatusSignal,
    status_interval: Duration,
    time: Esp32TimeAdapter,
) {
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    executor.spawn(display_loop(display, reports)).detach();
    executor
        .spawn(status_loop(status, status_interval, time, log_status))
        .detach();

    info!("Sinks task running (display + status every {}s)", status_interval.as_secs());
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AlertLevel, SystemMode};
    use crate::thresholds::calculate;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::rc::Rc;

    struct NullPin;

    impl ErrorType for NullPin {
        type Error = Infallible;
    }

    impl OutputPin for NullPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    fn leak_queue() -> &'static AlertQueue {
        Box::leak(Box::new(AlertQueue::new("test-alert")))
    }

    #[test]
    fn ticker_paces_without_drift() {
        let mut t = Ticker::new(50, 0);
        assert_eq!(t.advance(10), Duration::from_millis(40));
        assert_eq!(t.advance(52), Duration::from_millis(48));
        assert_eq!(t.overruns(), 0);
    }

    #[test]
    fn ticker_skips_missed_deadlines() {
        let mut t = Ticker::new(50, 0);
        assert_eq!(t.advance(500), Duration::ZERO);
        assert_eq!(t.overruns(), 1);
        assert_eq!(t.advance(510), Duration::from_millis(40));
    }

    #[test]
    fn alert_task_keeps_force_from_skipped_command() {
        let queue = leak_queue();
        let mut task = AlertTask::new(NullPin, queue);
        queue.push(AlertCommand::for_level(AlertLevel::Slow, true));
        queue.push(AlertCommand::for_level(AlertLevel::Slow, false));
        assert!(task.step(0));
        assert_eq!(task.merged(), 1);
        assert_eq!(task.scheduler().blink_rate(), 1);
    }

    #[test]
    fn alert_task_goes_dark_on_stop() {
        let queue = leak_queue();
        let mut task = AlertTask::new(NullPin, queue);
        queue.push(AlertCommand::for_level(AlertLevel::Critical, true));
        assert!(task.step(0));
        queue.push(AlertCommand::STOPPED);
        assert!(!task.step(10));
        assert!(!task.step(200));
    }

    fn report(seq: u32) -> MotionReport {
        MotionReport {
            seq,
            timestamp_ms: u64::from(seq) * 50,
            counter: seq as u8,
            level: AlertLevel::None,
            mode: SystemMode::Active,
            thresholds: calculate(22.0),
            env: None,
            status: "Motion",
        }
    }

    /// Records the sequence number of every rendered report.
    #[derive(Clone, Default)]
    struct SeqDisplay(Rc<RefCell<Vec<u32>>>);

    impl DisplaySink for SeqDisplay {
        fn render(&mut self, report: &MotionReport) {
            self.0.borrow_mut().push(report.seq);
        }
    }

    #[test]
    fn sinks_render_queue_and_dump_newest_status() {
        let reports: &'static ReportQueue = Box::leak(Box::new(ReportQueue::new("test-report")));
        let status: &'static StatusSignal = Box::leak(Box::new(StatusSignal::new()));
        for seq in 1..=3 {
            reports.push(report(seq));
            status.signal(report(seq));
        }

        let display = SeqDisplay::default();
        let dumps: Rc<RefCell<Vec<Option<u32>>>> = Rc::default();
        let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
        executor.spawn(display_loop(display.clone(), reports)).detach();
        let seen = Rc::clone(&dumps);
        executor
            .spawn(status_loop(
                status,
                Duration::from_millis(20),
                Esp32TimeAdapter::new(),
                move |latest: Option<&MotionReport>, _: &RuntimeMetrics| {
                    seen.borrow_mut().push(latest.map(|r| r.seq));
                },
            ))
            .detach();

        futures_lite::future::block_on(executor.run(async_io_mini::Timer::after(Duration::from_millis(200))));

        assert_eq!(*display.0.borrow(), vec![1, 2, 3]);
        assert!(reports.is_empty());
        let dumps = dumps.borrow();
        assert!(!dumps.is_empty());
        assert!(dumps.iter().all(|d| *d == Some(3)), "{dumps:?}");
    }
}
