//! Port traits: the boundary between the engine and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Event sources, the environmental sensor, and every consumer of engine
//! output implement these traits.  [`MonitorService`](super::service::MonitorService)
//! takes them as generics, so the engine never touches hardware directly.

use crate::engine::{AlertCommand, MotionReport};
use crate::error::SensorError;
use crate::events::{Edge, EdgeLatch, EnvSample, SampleCell};

// ───────────────────────────────────────────────────────────────
// Event sources (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Motion edges, drained once per engine cycle.
pub trait MotionSource {
    fn take_motion(&mut self, now_ms: u64) -> Option<Edge>;
}

/// Stop-button presses.  Gating is the engine's job, not the source's.
pub trait StopSource {
    fn take_press(&mut self, now_ms: u64) -> bool;
}

/// Environmental samples from the sampler task.
pub trait SampleSource {
    fn take_sample(&mut self) -> Option<EnvSample>;
}

impl MotionSource for &EdgeLatch {
    fn take_motion(&mut self, now_ms: u64) -> Option<Edge> {
        self.take(now_ms)
    }
}

impl SampleSource for &SampleCell {
    fn take_sample(&mut self) -> Option<EnvSample> {
        self.take()
    }
}

// ───────────────────────────────────────────────────────────────
// Environmental sensor (driven adapter: hardware → sampler)
// ───────────────────────────────────────────────────────────────

/// One physical temperature/humidity read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub trait EnvironmentPort {
    /// Perform one read.  Callers enforce the sensor's minimum spacing.
    fn read(&mut self) -> Result<EnvReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Sinks (driven adapter: domain → display / queues)
// ───────────────────────────────────────────────────────────────

/// Renders reports.  Fire-and-forget; no acknowledgement.
pub trait DisplaySink {
    fn render(&mut self, report: &MotionReport);
}

/// Where the engine's per-cycle output goes.
///
/// Implementations must not block.
pub trait EngineOutput {
    fn publish_report(&mut self, report: &MotionReport);
    fn publish_command(&mut self, command: AlertCommand);
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait TimePort {
    fn now_ms(&self) -> u64;
}
