//! ISR-debounced emergency-stop button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with external pull-up.  The GPIO fires on
//! the falling edge; the ISR records the timestamp into [`STOP_EDGE`] and
//! [`ButtonDriver::poll`] (called once per engine cycle) applies a
//! lockout so contact bounce counts as a single press.
//!
//! | Phase      | Condition                          | Result        |
//! |------------|------------------------------------|---------------|
//! | Press      | Edge, lockout expired              | press         |
//! | Bounce     | Edge within `LOCKOUT_MS` of press  | swallowed     |

use crate::app::ports::StopSource;
use crate::events::{EdgeLatch, STOP_EDGE};

const LOCKOUT_MS: u64 = 200;

pub struct ButtonDriver {
    gpio: i32,
    latch: &'static EdgeLatch,
    last_press_ms: Option<u64>,
    bounces: u32,
}

impl ButtonDriver {
    pub fn new(gpio: i32) -> Self {
        Self::with_latch(gpio, &STOP_EDGE)
    }

    pub fn with_latch(gpio: i32, latch: &'static EdgeLatch) -> Self {
        Self {
            gpio,
            latch,
            last_press_ms: None,
            bounces: 0,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Edges swallowed by the lockout since boot.
    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    /// Drain the ISR latch and classify.  Returns `true` for a press.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(edge) = self.latch.take(now_ms) else {
            return false;
        };

        if let Some(last) = self.last_press_ms {
            if edge.timestamp_ms.saturating_sub(last) < LOCKOUT_MS {
                self.bounces = self.bounces.wrapping_add(edge.count);
                return false;
            }
        }
        self.last_press_ms = Some(edge.timestamp_ms);
        true
    }
}

impl StopSource for ButtonDriver {
    fn take_press(&mut self, now_ms: u64) -> bool {
        self.poll(now_ms)
    }
}

/// ISR handler.  Register this on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free).
pub fn button_isr_handler(now_ms: u32) {
    STOP_EDGE.trigger(now_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its latch; the global one is shared across threads.
    fn driver() -> (ButtonDriver, &'static EdgeLatch) {
        let latch: &'static EdgeLatch = Box::leak(Box::new(EdgeLatch::new()));
        (ButtonDriver::with_latch(16, latch), latch)
    }

    #[test]
    fn no_press_without_edge() {
        let (mut btn, _) = driver();
        assert!(!btn.poll(100));
        assert!(!btn.poll(200));
    }

    #[test]
    fn single_edge_is_one_press() {
        let (mut btn, latch) = driver();
        latch.trigger(1_000);
        assert!(btn.poll(1_010));
        assert!(!btn.poll(1_060));
    }

    #[test]
    fn bounce_inside_lockout_swallowed() {
        let (mut btn, latch) = driver();
        latch.trigger(1_000);
        assert!(btn.poll(1_010));
        latch.trigger(1_030);
        latch.trigger(1_045);
        assert!(!btn.poll(1_060));
        assert_eq!(btn.bounces(), 2);
    }

    #[test]
    fn press_after_lockout_accepted() {
        let (mut btn, latch) = driver();
        latch.trigger(1_000);
        assert!(btn.poll(1_010));
        latch.trigger(1_500);
        assert!(btn.poll(1_510));
    }
}
