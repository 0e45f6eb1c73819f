//! Task wiring: static channels, the drop-oldest queue, and the task
//! bodies that run on them.
//!
//! [`spawn_all`] builds every task from a validated [`SystemConfig`] and
//! starts it on its core.  Priorities put the engine and the blink clock
//! above sampling, and the log sinks last.

pub mod channels;
pub mod queue;
pub mod tasks;

use core::time::Duration;
use std::io;
use std::thread::JoinHandle;

use crate::adapters::display::LogDisplay;
use crate::adapters::time::Esp32TimeAdapter;
use crate::app::service::{EngineInputs, MonitorService};
use crate::config::SystemConfig;
use crate::drivers::button::ButtonDriver;
use crate::drivers::hw_init::GpioOutput;
use crate::drivers::pir::PirSensor;
use crate::drivers::task_pin::{Core, TaskParams, spawn_on_core};
use crate::events::ENV_SAMPLE;
use crate::pins;
use crate::sensors::EnvironmentSampler;
use crate::sensors::dht::Dht22;

use channels::{ALERT_QUEUE, REPORT_QUEUE, STATUS_SIGNAL};
use tasks::AlertTask;

pub const ENGINE_TASK: TaskParams = TaskParams {
    name: "engine\0",
    core: Core::App,
    priority: 10,
    stack_kb: 8,
};

pub const ALERT_TASK: TaskParams = TaskParams {
    name: "alert\0",
    core: Core::App,
    priority: 9,
    stack_kb: 4,
};

pub const SAMPLER_TASK: TaskParams = TaskParams {
    name: "sampler\0",
    core: Core::Pro,
    priority: 5,
    stack_kb: 6,
};

pub const SINKS_TASK: TaskParams = TaskParams {
    name: "sinks\0",
    core: Core::Pro,
    priority: 3,
    stack_kb: 8,
};

pub struct TaskHandles {
    pub engine: JoinHandle<()>,
    pub alert: JoinHandle<()>,
    pub sampler: JoinHandle<()>,
    pub sinks: JoinHandle<()>,
}

/// Spawn all four tasks.  Consumers start before the engine so the first
/// report has somewhere to go.
pub fn spawn_all(config: &SystemConfig) -> io::Result<TaskHandles> {
    let time = Esp32TimeAdapter::new();

    let status_interval = Duration::from_secs(u64::from(config.status_log_interval_secs));
    let sinks = spawn_on_core(SINKS_TASK, move || {
        tasks::run_sinks(LogDisplay::new(), &REPORT_QUEUE, &STATUS_SIGNAL, status_interval, time);
    })?;

    let tick_ms = config.alert_tick_ms;
    let alert_task = AlertTask::new(GpioOutput::new(pins::ALERT_LED_GPIO), &ALERT_QUEUE);
    let alert = spawn_on_core(ALERT_TASK, move || tasks::run_alert(tick_ms, alert_task, time))?;

    let sample_ms = config.env_sample_interval_ms;
    let sampler_state = EnvironmentSampler::new(Dht22::new(pins::DHT_GPIO), sample_ms);
    let sampler = spawn_on_core(SAMPLER_TASK, move || {
        tasks::run_sampler(sample_ms, sampler_state, &ENV_SAMPLE, time);
    })?;

    let cycle_ms = config.engine_cycle_ms;
    let service = MonitorService::new(config);
    let inputs = EngineInputs::new(
        PirSensor::new(pins::PIR_GPIO),
        ButtonDriver::new(pins::STOP_BUTTON_GPIO),
        &ENV_SAMPLE,
    );
    let engine = spawn_on_core(ENGINE_TASK, move || tasks::run_engine(cycle_ms, service, inputs, time))?;

    Ok(TaskHandles {
        engine,
        alert,
        sampler,
        sinks,
    })
}
