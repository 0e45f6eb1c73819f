//! CabinGuard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the task
//! wiring used by the binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alert;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod events;
pub mod pins;
pub mod pipeline;
pub mod thresholds;

pub mod adapters;
pub mod drivers;
pub mod sensors;

mod esp_link_shims;
