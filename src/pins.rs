//! GPIO pin assignments for the CabinGuard main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Motion sensor (HC-SR501 PIR module)
// ---------------------------------------------------------------------------

/// Digital input: HIGH while motion is detected.  Rising edge interrupt.
pub const PIR_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Environmental sensor (DHT22 / AM2302)
// ---------------------------------------------------------------------------

/// Single-wire data line, open-drain with pull-up.
pub const DHT_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Alert LED
// ---------------------------------------------------------------------------

/// Digital output: HIGH = LED on.
pub const ALERT_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Emergency-stop button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button.  Falling edge interrupt.
pub const STOP_BUTTON_GPIO: i32 = 16;
