//! Runtime symbol providers for third-party crates.
//!
//! - `embassy-time` driver (both targets): the `async-io-mini` timer that
//!   paces the status log reads the clock and schedules wake-ups through
//!   these two symbols.
//! - `critical-section` 1.x (ESP-IDF only; the host uses the crate's `std`
//!   impl): backs the embassy-sync mutexes and channels shared between
//!   tasks.  It is a task-level lock, not an interrupt mask: ISRs must
//!   never take it, which is why the GPIO edge latches are plain atomics.

use core::task::Waker;
use core::time::Duration;

use crate::adapters::time::Esp32TimeAdapter;

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

// ── embassy-time driver ───────────────────────────────────────

/// Monotonic microseconds since boot (embassy-time's default 1 MHz tick).
#[unsafe(no_mangle)]
pub fn _embassy_time_now() -> u64 {
    Esp32TimeAdapter::new().uptime_us()
}

/// Wake `waker` once the clock reaches `at`.
///
/// One short-lived thread per registration; the only timer in the firmware
/// fires every few seconds.
#[unsafe(no_mangle)]
pub fn _embassy_time_schedule_wake(at: u64, waker: &Waker) {
    let wake = waker.clone();
    let spawned = std::thread::Builder::new()
        .name("timer-wake".into())
        .stack_size(4 * 1024)
        .spawn(move || {
            let now = _embassy_time_now();
            if at > now {
                std::thread::sleep(Duration::from_micros(at - now));
            }
            wake.wake();
        });
    if let Err(e) = spawned {
        // Early wake: the timer re-checks the deadline and registers again.
        log::warn!("timer wake thread spawn failed: {}", e);
        waker.wake_by_ref();
    }
}

// ── critical-section ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
static CRITICAL_SECTION_MUTEX: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static CRITICAL_SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CRITICAL_SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        CRITICAL_SECTION_GUARD.with(|guard| {
            let d = depth.get();
            if d == 0 {
                // Sections never panic while held; recover rather than wedge.
                let lock = CRITICAL_SECTION_MUTEX
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                *guard.borrow_mut() = Some(lock);
            }
            let new_depth = d.saturating_add(1);
            depth.set(new_depth);
            new_depth
        })
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        CRITICAL_SECTION_GUARD.with(|guard| {
            let d = depth.get();
            if d == 0 {
                return;
            }
            let new_depth = d - 1;
            depth.set(new_depth);
            if new_depth == 0 {
                *guard.borrow_mut() = None;
            }
        })
    })
}
