//! Alert scheduler: variable-rate blink clock.
//!
//! Free-running: `tick()` is called on its own fixed period regardless of
//! how often commands arrive, so blinking stays smooth when the engine
//! output is bursty.  Only the newest command matters.
//!
//! | Rate | Level    | Toggle interval |
//! |------|----------|-----------------|
//! | 0    | off      | LED held low    |
//! | 1    | Slow     | 1000 ms         |
//! | 2    | Medium   | 500 ms          |
//! | 3    | Fast     | 200 ms          |
//! | 4    | Critical | 100 ms          |

use crate::engine::AlertCommand;

pub const MAX_BLINK_RATE: u8 = 4;

/// Toggle interval for a blink rate; `None` means hold off.
pub fn blink_interval_ms(rate: u8) -> Option<u64> {
    match rate.min(MAX_BLINK_RATE) {
        0 => None,
        1 => Some(1_000),
        2 => Some(500),
        3 => Some(200),
        _ => Some(100),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlertScheduler {
    blink_rate: u8,
    active: bool,
    led_on: bool,
    last_toggle_ms: u64,
}

impl AlertScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a new command.
    ///
    /// A rate change without `force_update` keeps the current phase and
    /// picks up the new interval on the next tick.  Starting to blink from
    /// the off state always begins with the LED on.
    pub fn apply(&mut self, cmd: AlertCommand, now_ms: u64) {
        let was_blinking = self.is_blinking();
        self.blink_rate = cmd.blink_rate.min(MAX_BLINK_RATE);
        self.active = cmd.active;

        if !self.is_blinking() {
            self.led_on = false;
            self.last_toggle_ms = now_ms;
            return;
        }
        if !was_blinking {
            self.led_on = true;
            self.last_toggle_ms = now_ms;
        } else if cmd.force_update {
            self.last_toggle_ms = now_ms;
        }
    }

    /// Advance the blink clock.  Returns the LED state to drive.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let Some(interval) = self.interval_ms() else {
            self.led_on = false;
            return false;
        };
        if now_ms.saturating_sub(self.last_toggle_ms) >= interval {
            self.led_on = !self.led_on;
            self.last_toggle_ms = now_ms;
        }
        self.led_on
    }

    pub fn is_blinking(&self) -> bool {
        self.interval_ms().is_some()
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    pub fn blink_rate(&self) -> u8 {
        self.blink_rate
    }

    fn interval_ms(&self) -> Option<u64> {
        if self.active {
            blink_interval_ms(self.blink_rate)
        } else {
            None
        }
    }
}
