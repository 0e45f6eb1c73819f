//! GPIO drivers, hardware initialisation, and task helpers.

pub mod alert_led;
pub mod button;
pub mod hw_init;
pub mod pir;
pub mod task_pin;
pub mod watchdog;
