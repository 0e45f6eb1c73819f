//! Inputs to the persistence engine.
//!
//! Motion and stop edges are produced in GPIO interrupt context and
//! drained once per engine cycle.  Environmental samples come from the
//! sampler task.
//!
//! ```text
//! ┌─────────────┐  trigger()  ┌─────────────┐
//! │ PIR ISR     │────────────▶│ MOTION_EDGE │──┐
//! └─────────────┘             └─────────────┘  │  take()
//! ┌─────────────┐             ┌─────────────┐  ├────────▶ engine cycle
//! │ Button ISR  │────────────▶│ STOP_EDGE   │──┤
//! └─────────────┘             └─────────────┘  │
//! ┌─────────────┐  publish()  ┌─────────────┐  │
//! │ Sampler     │────────────▶│ ENV_SAMPLE  │──┘
//! └─────────────┘             └─────────────┘
//! ```
//!
//! Several edges between two drains collapse into one [`Edge`] carrying
//! the newest timestamp and the number of raw edges it stands for.
//! Nothing is lost: every trigger after a drain is seen by the next one.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

// ── Edge latch ────────────────────────────────────────────────

/// One drained edge, possibly standing for several raw triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Time of the most recent raw trigger.
    pub timestamp_ms: u64,
    /// Raw triggers since the previous drain (always >= 1).
    pub count: u32,
}

/// Timestamped edge flag, written from ISR context.
///
/// Lock-free: the trigger side is a store plus one `fetch_add`, so it is
/// safe in interrupt handlers where the critical-section shim is not.
/// There must be a single consumer.  Timestamps are kept as wrapping
/// `u32` milliseconds and widened against the drain time.
pub struct EdgeLatch {
    stamp_ms: AtomicU32,
    count: AtomicU32,
    seen: AtomicU32,
    coalesced: AtomicU32,
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeLatch {
    pub const fn new() -> Self {
        Self {
            stamp_ms: AtomicU32::new(0),
            count: AtomicU32::new(0),
            seen: AtomicU32::new(0),
            coalesced: AtomicU32::new(0),
        }
    }

    /// Record an edge.  ISR-safe.
    pub fn trigger(&self, now_ms: u32) {
        self.stamp_ms.store(now_ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Release);
    }

    /// Drain everything since the last call.  Single consumer only.
    pub fn take(&self, now_ms: u64) -> Option<Edge> {
        let count = self.count.load(Ordering::Acquire);
        let prev = self.seen.swap(count, Ordering::Relaxed);
        let pending = count.wrapping_sub(prev);
        if pending == 0 {
            return None;
        }
        if pending > 1 {
            self.coalesced.fetch_add(pending - 1, Ordering::Relaxed);
        }

        let stamp = self.stamp_ms.load(Ordering::Relaxed);
        let mut age = (now_ms as u32).wrapping_sub(stamp);
        // Stamp written after `now_ms` was sampled.
        if age > i32::MAX as u32 {
            age = 0;
        }
        Some(Edge {
            timestamp_ms: now_ms.saturating_sub(u64::from(age)),
            count: pending,
        })
    }

    /// Whether an undrained edge is waiting.
    pub fn is_pending(&self) -> bool {
        self.count.load(Ordering::Acquire) != self.seen.load(Ordering::Relaxed)
    }

    /// Raw edges folded into another edge since boot.
    pub fn coalesced(&self) -> u32 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

/// PIR rising edges.
pub static MOTION_EDGE: EdgeLatch = EdgeLatch::new();

/// Debounced stop-button presses.
pub static STOP_EDGE: EdgeLatch = EdgeLatch::new();

// ── Environmental sample ──────────────────────────────────────

/// One environmental reading as delivered to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// `false` when the read failed; the other fields are then meaningless.
    pub valid: bool,
    pub timestamp_ms: u64,
}

impl EnvSample {
    pub fn invalid(timestamp_ms: u64) -> Self {
        Self {
            temperature_c: f32::NAN,
            humidity_pct: f32::NAN,
            valid: false,
            timestamp_ms,
        }
    }

    /// Valid flag set and both values finite.
    pub fn is_usable(&self) -> bool {
        self.valid && self.temperature_c.is_finite() && self.humidity_pct.is_finite()
    }
}

/// Single-slot mailbox between the sampler and the engine.
///
/// Temperature and humidity are written together under one critical
/// section, so the engine never observes a torn pair.
pub struct SampleCell {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<EnvSample>>>,
}

impl Default for SampleCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleCell {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Replace whatever is waiting with `sample`.
    pub fn publish(&self, sample: EnvSample) {
        self.slot.lock(|slot| slot.set(Some(sample)));
    }

    /// Take the newest sample, if one arrived since the last take.
    pub fn take(&self) -> Option<EnvSample> {
        self.slot.lock(Cell::take)
    }
}

pub static ENV_SAMPLE: SampleCell = SampleCell::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_latch_yields_nothing() {
        let latch = EdgeLatch::new();
        assert!(!latch.is_pending());
        assert_eq!(latch.take(1_000), None);
    }

    #[test]
    fn single_edge_drained_once() {
        let latch = EdgeLatch::new();
        latch.trigger(900);
        assert!(latch.is_pending());
        assert_eq!(
            latch.take(1_000),
            Some(Edge { timestamp_ms: 900, count: 1 })
        );
        assert_eq!(latch.take(1_050), None);
    }

    #[test]
    fn burst_coalesces_to_newest_timestamp() {
        let latch = EdgeLatch::new();
        latch.trigger(100);
        latch.trigger(120);
        latch.trigger(140);
        let edge = latch.take(150).unwrap();
        assert_eq!(edge.count, 3);
        assert_eq!(edge.timestamp_ms, 140);
        assert_eq!(latch.coalesced(), 2);
    }

    #[test]
    fn timestamp_widened_across_u32_wrap() {
        let latch = EdgeLatch::new();
        let now: u64 = (1u64 << 32) + 10;
        latch.trigger(u32::MAX - 4); // 15 ms before `now`
        assert_eq!(latch.take(now).unwrap().timestamp_ms, now - 15);
    }

    #[test]
    fn stamp_newer_than_drain_time_clamps_to_now() {
        let latch = EdgeLatch::new();
        latch.trigger(2_005);
        assert_eq!(latch.take(2_000).unwrap().timestamp_ms, 2_000);
    }

    #[test]
    fn sample_cell_keeps_newest_only() {
        let cell = SampleCell::new();
        assert_eq!(cell.take(), None);
        cell.publish(EnvSample { temperature_c: 25.0, humidity_pct: 40.0, valid: true, timestamp_ms: 1 });
        cell.publish(EnvSample { temperature_c: 26.0, humidity_pct: 41.0, valid: true, timestamp_ms: 2 });
        let s = cell.take().unwrap();
        assert_eq!(s.timestamp_ms, 2);
        assert_eq!(s.temperature_c, 26.0);
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn invalid_sample_is_not_usable() {
        assert!(!EnvSample::invalid(0).is_usable());
        let nan = EnvSample { temperature_c: f32::NAN, humidity_pct: 50.0, valid: true, timestamp_ms: 0 };
        assert!(!nan.is_usable());
    }
}
