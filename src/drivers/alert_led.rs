//! Alert LED output.
//!
//! Generic over any `embedded_hal` output pin.  Only state changes reach
//! the pin, so the 100 Hz alert tick does not hammer the GPIO register.

use embedded_hal::digital::OutputPin;

pub struct AlertLed<P: OutputPin> {
    pin: P,
    /// `None` until the first write, so the initial state is always driven.
    state: Option<bool>,
}

impl<P: OutputPin> AlertLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, state: None }
    }

    /// Drive the LED.  No-op if it is already in the requested state.
    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if self.state == Some(on) {
            return Ok(());
        }
        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.state = Some(on);
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.state == Some(true)
    }

    /// Give the pin back (tests inspect it).
    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct CountingPin {
        writes: u32,
        high: bool,
    }

    impl ErrorType for CountingPin {
        type Error = Infallible;
    }

    impl OutputPin for CountingPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.writes += 1;
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.writes += 1;
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn only_changes_are_written() {
        let mut led = AlertLed::new(CountingPin::default());
        led.set(false).unwrap();
        led.set(false).unwrap();
        led.set(true).unwrap();
        led.set(true).unwrap();
        assert!(led.is_on());
        let pin = led.release();
        assert_eq!(pin.writes, 2);
        assert!(pin.high);
    }
}
