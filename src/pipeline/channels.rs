//! Static channels between the engine and its consumers.
//!
//! ```text
//!                      ┌──────────────┐  MotionReport  ┌──────────────┐
//!                  ┌──▶│ REPORT_QUEUE │───────────────▶│ Display task │
//!  ┌────────────┐  │   └──────────────┘                └──────────────┘
//!  │   Engine   │──┤   ┌──────────────┐  latest only   ┌──────────────┐
//!  │  (sync)    │  ├──▶│ STATUS_SIGNAL│───────────────▶│ Status log   │
//!  └────────────┘  │   └──────────────┘                └──────────────┘
//!                  │   ┌──────────────┐  AlertCommand  ┌──────────────┐
//!                  └──▶│ ALERT_QUEUE  │───────────────▶│ Alert task   │
//!                      └──────────────┘                └──────────────┘
//! ```
//!
//! Every queue is single-producer (the engine) and single-consumer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use super::queue::DropOldest;
use crate::app::ports::EngineOutput;
use crate::engine::{AlertCommand, MotionReport};

pub const REPORT_DEPTH: usize = 4;
pub const ALERT_DEPTH: usize = 4;

pub type ReportQueue = DropOldest<MotionReport, REPORT_DEPTH>;
pub type AlertQueue = DropOldest<AlertCommand, ALERT_DEPTH>;
pub type StatusSignal = Signal<CriticalSectionRawMutex, MotionReport>;

/// Engine → display.
pub static REPORT_QUEUE: ReportQueue = DropOldest::new("report");

/// Engine → alert scheduler.
pub static ALERT_QUEUE: AlertQueue = DropOldest::new("alert");

/// Engine → status log.  Holds only the newest report.
pub static STATUS_SIGNAL: StatusSignal = Signal::new();

/// [`EngineOutput`] that fans out onto a set of channels.
pub struct ChannelOutput {
    reports: &'static ReportQueue,
    alerts: &'static AlertQueue,
    status: &'static StatusSignal,
}

impl ChannelOutput {
    pub fn new(
        reports: &'static ReportQueue,
        alerts: &'static AlertQueue,
        status: &'static StatusSignal,
    ) -> Self {
        Self {
            reports,
            alerts,
            status,
        }
    }

    /// Output wired to the global channels.
    pub fn global() -> Self {
        Self::new(&REPORT_QUEUE, &ALERT_QUEUE, &STATUS_SIGNAL)
    }
}

impl EngineOutput for ChannelOutput {
    fn publish_report(&mut self, report: &MotionReport) {
        self.reports.push(*report);
        self.status.signal(*report);
    }

    fn publish_command(&mut self, command: AlertCommand) {
        self.alerts.push(command);
    }
}
