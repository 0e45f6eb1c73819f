//! Log-backed display sink.
//!
//! Renders each [`MotionReport`] as the two 16-column lines a character
//! LCD would show.  A physical display adapter would implement the same
//! [`DisplaySink`] trait and push these lines to the panel.
//!
//! Every report goes out at `debug`; a change of status line is repeated
//! at `info` so the default log level stays readable at 20 Hz.

use core::fmt::Write;

use heapless::String;
use log::{debug, info};

use crate::app::ports::DisplaySink;
use crate::engine::MotionReport;

pub const LCD_COLS: usize = 16;

pub type LcdLine = String<LCD_COLS>;

/// Top line: counter and temperature.  Bottom line: status tag.
pub fn lcd_lines(report: &MotionReport) -> (LcdLine, LcdLine) {
    let mut top = LcdLine::new();
    // Truncation on overflow is fine for a fixed-width panel.
    let _ = match report.env {
        Some(env) => write!(top, "Cnt:{:<2} T:{:.1}C", report.counter, env.temperature_c),
        None => write!(top, "Cnt:{:<2} T:--.-C", report.counter),
    };

    let mut bottom = LcdLine::new();
    for c in report.status.chars().take(LCD_COLS) {
        let _ = bottom.push(c);
    }
    (top, bottom)
}

pub struct LogDisplay {
    last_status: Option<&'static str>,
    rendered: u64,
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl LogDisplay {
    pub fn new() -> Self {
        Self {
            last_status: None,
            rendered: 0,
        }
    }

    /// Reports rendered since boot.
    pub fn rendered(&self) -> u64 {
        self.rendered
    }
}

impl DisplaySink for LogDisplay {
    fn render(&mut self, report: &MotionReport) {
        let (top, bottom) = lcd_lines(report);
        debug!("LCD | {:<16} | {:<16} | seq={}", top, bottom, report.seq);
        if self.last_status != Some(report.status) {
            info!("DISPLAY | {} | {}", top, bottom);
            self.last_status = Some(report.status);
        }
        self.rendered += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AlertLevel, EnvSnapshot, SystemMode};
    use crate::thresholds::calculate;

    fn report(counter: u8, status: &'static str, temp: Option<f32>) -> MotionReport {
        MotionReport {
            seq: 1,
            timestamp_ms: 0,
            counter,
            level: AlertLevel::None,
            mode: SystemMode::Active,
            thresholds: calculate(22.0),
            env: temp.map(|t| EnvSnapshot { temperature_c: t, humidity_pct: 40.0, timestamp_ms: 0 }),
            status,
        }
    }

    #[test]
    fn lines_fit_the_panel() {
        let (top, bottom) = lcd_lines(&report(18, "ALERT STOPPED", Some(35.0)));
        assert_eq!(top.as_str(), "Cnt:18 T:35.0C");
        assert_eq!(bottom.as_str(), "ALERT STOPPED");
    }

    #[test]
    fn missing_temperature_shows_placeholder() {
        let (top, _) = lcd_lines(&report(0, "No Motion", None));
        assert_eq!(top.as_str(), "Cnt:0  T:--.-C");
    }

    #[test]
    fn render_counts_reports() {
        let mut d = LogDisplay::new();
        d.render(&report(0, "No Motion", None));
        d.render(&report(0, "No Motion", None));
        assert_eq!(d.rendered(), 2);
    }
}
