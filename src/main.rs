//! CabinGuard firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PirSensor      ButtonDriver    Dht22         Esp32Time        │
//! │  (MotionSource) (StopSource)    (Environment) (TimePort)       │
//! │  LogDisplay     StatusLine      AlertLed                       │
//! │  (DisplaySink)  (status dump)   (OutputPin)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        MonitorService / PersistenceEngine              │    │
//! │  │  counter · thresholds · stop interlock                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Pipeline: drop-oldest queues · status signal · 4 tasks        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{error, info};

use cabinguard::config::SystemConfig;
use cabinguard::diagnostics;
use cabinguard::drivers::hw_init;
use cabinguard::pipeline;

fn main() -> Result<()> {
    // ── 1. Bootstrap ──────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  CabinGuard v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;
    info!(
        "Config: max_counter={} decay={}ms window={}ms temp_adjust={} stop_interlock={}",
        config.max_counter,
        config.decay_interval_ms,
        config.detection_window_ms,
        config.temperature_adjustment,
        config.stop_interlock
    );

    // ── 3. Hardware ───────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without GPIO there is nothing to monitor; the TWDT never armed,
        // so halt here and let the operator see the log.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    hw_init::init_isr_service().context("GPIO ISR service")?;

    // ── 4. Tasks ──────────────────────────────────────────────
    let handles = pipeline::spawn_all(&config).context("task spawn")?;
    info!("All tasks running");

    #[cfg(not(target_os = "espidf"))]
    sim::start_scenario().context("sim scenario spawn")?;

    // The engine never returns; joining it parks main for good.
    if handles.engine.join().is_err() {
        error!("Engine task exited abnormally");
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
fn load_config() -> Result<SystemConfig> {
    let config = SystemConfig::default();
    config.validate()?;
    Ok(config)
}

#[cfg(not(target_os = "espidf"))]
fn load_config() -> Result<SystemConfig> {
    match std::env::var("CABINGUARD_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            let config = SystemConfig::from_json(&json).with_context(|| format!("parsing {path}"))?;
            info!("Config loaded from {}", path);
            Ok(config)
        }
        Err(_) => {
            let config = SystemConfig::default();
            config.validate()?;
            info!("Config: defaults");
            Ok(config)
        }
    }
}

/// Host-only stimulus: a child moving in a warming cabin, then a stop.
#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::thread;
    use std::time::Duration;

    use log::info;

    use cabinguard::adapters::time::Esp32TimeAdapter;
    use cabinguard::drivers::button::button_isr_handler;
    use cabinguard::drivers::pir::pir_isr_handler;
    use cabinguard::sensors::dht::sim_set_environment;

    pub fn start_scenario() -> std::io::Result<()> {
        thread::Builder::new()
            .name("sim-scenario".into())
            .spawn(run)
            .map(|_| ())
    }

    fn run() {
        let time = Esp32TimeAdapter::new();
        sim_set_environment(24.0, 45.0);

        info!("SIM: motion every 400 ms while the cabin heats up");
        for step in 0..60u32 {
            pir_isr_handler(time.now_ms_u32());
            if step % 5 == 0 {
                let temp = 24.0 + step as f32 * 0.2;
                sim_set_environment(temp, 45.0);
            }
            thread::sleep(Duration::from_millis(400));
        }

        info!("SIM: stop button pressed");
        button_isr_handler(time.now_ms_u32());

        info!("SIM: cabin quiet, counter decays and the system re-arms");
        thread::sleep(Duration::from_secs(10));

        info!("SIM: motion resumes");
        for _ in 0..10 {
            pir_isr_handler(time.now_ms_u32());
            thread::sleep(Duration::from_millis(500));
        }
        info!("SIM: scenario complete");
    }
}
