//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions and the interrupt service using raw
//! ESP-IDF sys calls.  Called once from `main()` before any task starts.
//! Also hosts the two raw-register paths the drivers need: the alert LED
//! output pin and the DHT22 bit-bang read.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

#[cfg(target_os = "espidf")]
use crate::error::SensorError;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_dht_line()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

/// Bias resistor enabled on an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Edge that fires an input's ISR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Rising,
    Falling,
}

/// Electrical setup of one interrupt-driven input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLine {
    pub gpio: i32,
    pub pull: Pull,
    pub edge: TriggerEdge,
}

/// PIR: push-pull output on the module, idles low.  The pull-down holds
/// the line low while the module is unplugged or still warming up.
pub const PIR_INPUT: InputLine = InputLine {
    gpio: pins::PIR_GPIO,
    pull: Pull::Down,
    edge: TriggerEdge::Rising,
};

/// Stop button: switch to ground, idles high on the internal pull-up.
pub const STOP_BUTTON_INPUT: InputLine = InputLine {
    gpio: pins::STOP_BUTTON_GPIO,
    pull: Pull::Up,
    edge: TriggerEdge::Falling,
};

impl InputLine {
    /// Level the pull holds the pin at when nothing drives it.
    pub const fn idle_high(&self) -> bool {
        matches!(self.pull, Pull::Up)
    }

    #[cfg(target_os = "espidf")]
    fn gpio_config(&self) -> gpio_config_t {
        gpio_config_t {
            pin_bit_mask: 1u64 << self.gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: match self.pull {
                Pull::Up => gpio_pullup_t_GPIO_PULLUP_ENABLE,
                Pull::Down => gpio_pullup_t_GPIO_PULLUP_DISABLE,
            },
            pull_down_en: match self.pull {
                Pull::Up => gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                Pull::Down => gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            },
            intr_type: match self.edge {
                TriggerEdge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
                TriggerEdge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
            },
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for line in [PIR_INPUT, STOP_BUTTON_INPUT] {
        let cfg = line.gpio_config();
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured (PIR, stop button)");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::ALERT_LED_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pins::ALERT_LED_GPIO, 0) };

    info!("hw_init: GPIO outputs configured (alert LED)");
    Ok(())
}

/// Error from a raw GPIO write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Push-pull output pin driven through the IDF GPIO driver.
///
/// The simulator keeps the level in memory so tests and logs can see it.
pub struct GpioOutput {
    pin: i32,
    #[cfg(not(target_os = "espidf"))]
    high: bool,
}

impl GpioOutput {
    /// The pin must already be configured as an output by [`init_peripherals`].
    pub fn new(pin: i32) -> Self {
        Self {
            pin,
            #[cfg(not(target_os = "espidf"))]
            high: false,
        }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        // SAFETY: gpio_set_level writes to an already-configured output pin.
        // Only the alert task owns this pin.
        let ret = unsafe { gpio_set_level(self.pin, u32::from(high)) };
        if ret == ESP_OK as i32 { Ok(()) } else { Err(GpioError(ret)) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        self.high = high;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), GpioError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        self.write(true)
    }
}

// ── DHT22 single-wire bus ─────────────────────────────────────

/// Host start pulse (DHT22 needs >= 1 ms low).
#[cfg(target_os = "espidf")]
const DHT_START_LOW_US: u32 = 1_200;
/// A high phase longer than this is a `1` bit (0 ≈ 26 µs, 1 ≈ 70 µs).
#[cfg(target_os = "espidf")]
const DHT_ONE_THRESHOLD_US: i64 = 48;
/// Any single phase longer than this means the sensor went away.
#[cfg(target_os = "espidf")]
const DHT_PHASE_TIMEOUT_US: i64 = 120;

#[cfg(target_os = "espidf")]
unsafe fn init_dht_line() -> Result<(), HwInitError> {
    // Open-drain: writing 1 releases the line to the pull-up, 0 pulls it low.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::DHT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pins::DHT_GPIO, 1) };

    info!("hw_init: DHT22 line configured (open-drain)");
    Ok(())
}

/// Busy-wait while the line stays at `level`.  Returns how long it did.
#[cfg(target_os = "espidf")]
fn dht_wait_while(pin: i32, level: i32) -> Result<i64, SensorError> {
    // SAFETY: timer and level reads are plain register accesses.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let elapsed = unsafe { esp_timer_get_time() } - start;
        if unsafe { gpio_get_level(pin) } != level {
            return Ok(elapsed);
        }
        if elapsed > DHT_PHASE_TIMEOUT_US {
            return Err(SensorError::Timeout);
        }
    }
}

/// Bit-bang one 40-bit frame off the DHT22 line.
///
/// Takes about 5 ms.  Runs on the sampler task, which has nothing else
/// to do meanwhile.
#[cfg(target_os = "espidf")]
pub fn dht_read_frame(pin: i32) -> Result<[u8; 5], SensorError> {
    // SAFETY: the DHT line is owned by the sampler task.
    unsafe {
        gpio_set_level(pin, 0);
        esp_rom_delay_us(DHT_START_LOW_US);
        gpio_set_level(pin, 1);
    }

    // Response: line released high, sensor pulls low ~80 µs, then high ~80 µs.
    dht_wait_while(pin, 1).map_err(|_| SensorError::NoResponse)?;
    dht_wait_while(pin, 0)?;
    dht_wait_while(pin, 1)?;

    let mut frame = [0u8; 5];
    for bit in 0..40 {
        dht_wait_while(pin, 0)?;
        let high_us = dht_wait_while(pin, 1)?;
        if high_us > DHT_ONE_THRESHOLD_US {
            frame[bit / 8] |= 0x80 >> (bit % 8);
        }
    }
    Ok(frame)
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::button_isr_handler;
#[cfg(target_os = "espidf")]
use crate::drivers::pir::pir_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pir_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is a RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    pir_isr_handler(now_ms);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: as above.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    button_isr_handler(now_ms);
}

/// Install per-pin GPIO ISR service and register interrupt handlers.
/// Call after init_peripherals() and before the engine task starts.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The handlers below only
    // touch lock-free edge latches.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(pins::PIR_GPIO, Some(pir_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 { return Err(HwInitError::IsrInstallFailed(ret)); }
        gpio_intr_enable(pins::PIR_GPIO);

        let ret = gpio_isr_handler_add(pins::STOP_BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 { return Err(HwInitError::IsrInstallFailed(ret)); }
        gpio_intr_enable(pins::STOP_BUTTON_GPIO);

        info!("hw_init: ISR service installed (PIR, stop button)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
