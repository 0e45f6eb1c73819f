//! Core-pinned thread spawning for the ESP32 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! `esp_pthread_set_cfg()` sets thread-local configuration that applies to
//! the *next* `pthread_create()` call from the calling thread, so the
//! config→spawn pair must not be interleaved with other thread creation
//! on the same thread.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): sampling and log sinks.
    Pro = 0,
    /// Core 1 (APP_CPU): engine and alert clock.
    App = 1,
}

/// Thread placement for one task.
#[derive(Debug, Clone, Copy)]
pub struct TaskParams {
    /// Null-terminated, e.g. `"engine\0"`.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl TaskParams {
    pub fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

/// Spawn a thread pinned to a core with explicit priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(params: TaskParams, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = params.core as i32;
        cfg.prio = i32::from(params.priority);
        cfg.stack_size = (params.stack_kb * 1024) as i32;
        cfg.thread_name = params.name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        params.display_name(),
        params.core,
        params.priority,
        params.stack_kb
    );

    std::thread::Builder::new()
        .name(params.display_name().into())
        .spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(params: TaskParams, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        params.display_name(),
        params.stack_kb
    );

    std::thread::Builder::new()
        .name(params.display_name().into())
        .stack_size(params.stack_kb * 1024)
        .spawn(f)
}
