//! Periodic status dump.
//!
//! Informational only; nothing in the control path reads it.

use core::fmt;

use log::info;

use crate::diagnostics::RuntimeMetrics;
use crate::engine::MotionReport;

/// One status line, formatted lazily by the logger.
pub struct StatusLine<'a> {
    pub report: Option<&'a MotionReport>,
    pub metrics: &'a RuntimeMetrics,
}

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.report {
            Some(r) => {
                write!(
                    f,
                    "STATUS | seq={} counter={} mode={:?} level={:?} | ",
                    r.seq, r.counter, r.mode, r.level
                )?;
                match r.env {
                    Some(env) => write!(
                        f,
                        "T={:.1}\u{00b0}C RH={:.1}% | ",
                        env.temperature_c, env.humidity_pct
                    )?,
                    None => write!(f, "T=n/a | ")?,
                }
                let t = &r.thresholds;
                write!(
                    f,
                    "thr={}/{}/{}/{} stop={} | ",
                    t.slow, t.medium, t.fast, t.critical, t.stop
                )?;
            }
            None => write!(f, "STATUS | engine not reporting yet | ")?,
        }

        let m = self.metrics;
        let p = &m.pipeline;
        write!(
            f,
            "heap={}B (min {}B) | dropped rpt={} cmd={} | coalesced pir={} stop={} | up={}s",
            m.heap_free,
            m.heap_min_free,
            p.reports_dropped,
            p.commands_dropped,
            p.motion_coalesced,
            p.stop_coalesced,
            m.uptime_secs
        )
    }
}

/// Emit one status line at `info`.
pub fn log_status(report: Option<&MotionReport>, metrics: &RuntimeMetrics) {
    info!("{}", StatusLine { report, metrics });
}
