//! PIR motion sensor input.
//!
//! The sensor's digital output goes high on motion.  The GPIO ISR
//! timestamps each rising edge into [`MOTION_EDGE`]; the engine drains
//! it through [`PirSensor`].

use crate::app::ports::MotionSource;
use crate::events::{Edge, EdgeLatch, MOTION_EDGE};

pub struct PirSensor {
    gpio: i32,
    latch: &'static EdgeLatch,
}

impl PirSensor {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            latch: &MOTION_EDGE,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Raw edges merged into a neighbour since boot.
    pub fn coalesced(&self) -> u32 {
        self.latch.coalesced()
    }
}

impl MotionSource for PirSensor {
    fn take_motion(&mut self, now_ms: u64) -> Option<Edge> {
        self.latch.take(now_ms)
    }
}

/// ISR handler.  Register this on the PIR GPIO rising edge.
pub fn pir_isr_handler(now_ms: u32) {
    MOTION_EDGE.trigger(now_ms);
}
