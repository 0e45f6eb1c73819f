//! Runtime diagnostics.
//!
//! Free heap plus the pipeline's loss counters (queue drops and edge
//! coalescing), collected on demand for the periodic status log.  A panic
//! hook logs the reason before the default handler resets the device.

use crate::events::{MOTION_EDGE, STOP_EDGE};
use crate::pipeline::channels::{ALERT_QUEUE, REPORT_QUEUE};

/// Messages the pipeline discarded or merged since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCounters {
    pub reports_dropped: u32,
    pub commands_dropped: u32,
    pub motion_coalesced: u32,
    pub stop_coalesced: u32,
}

impl PipelineCounters {
    /// Read the global queues and latches.
    pub fn snapshot() -> Self {
        Self {
            reports_dropped: REPORT_QUEUE.dropped(),
            commands_dropped: ALERT_QUEUE.dropped(),
            motion_coalesced: MOTION_EDGE.coalesced(),
            stop_coalesced: STOP_EDGE.coalesced(),
        }
    }
}

/// Runtime diagnostics snapshot collected on-demand.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub heap_free: u32,
    pub heap_min_free: u32,
    pub pipeline: PipelineCounters,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect(uptime_secs: u64) -> Self {
        use esp_idf_svc::sys::*;
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };

        Self {
            uptime_secs,
            heap_free,
            heap_min_free,
            pipeline: PipelineCounters::snapshot(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(uptime_secs: u64) -> Self {
        // Synthetic values so simulation runs the same formatting paths.
        // Heap "decays" slightly over time to model fragmentation.
        let base_free: u32 = 307_200; // 300 KB
        let decay = (uptime_secs / 60) as u32 * 512;
        let heap_free = base_free.saturating_sub(decay);
        let heap_min_free = (heap_free as f32 * 0.85) as u32;

        Self {
            uptime_secs,
            heap_free,
            heap_min_free,
            pipeline: PipelineCounters::snapshot(),
        }
    }
}

/// Install a panic hook that logs the reason through the `log` facade.
///
/// Must be called once during init, after the logger is up.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        match info.location() {
            Some(loc) => log::error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => log::error!("PANIC: {}", reason),
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_heap_never_exceeds_base() {
        let early = RuntimeMetrics::collect(0);
        let late = RuntimeMetrics::collect(3_600);
        assert_eq!(early.heap_free, 307_200);
        assert!(late.heap_free < early.heap_free);
        assert!(late.heap_min_free <= late.heap_free);
    }
}
