//! DHT22 / AM2302 temperature and humidity sensor.
//!
//! Single-wire protocol.  One read returns a 40-bit frame:
//!
//! ```text
//!  byte 0..1   humidity × 10        (big-endian, unsigned)
//!  byte 2..3   temperature × 10     (big-endian, bit 15 = sign)
//!  byte 4      checksum = low 8 bits of sum(byte 0..3)
//! ```
//!
//! The sensor needs at least 2 s between reads; the sampler enforces it.
//!
//! On ESP-IDF the frame is bit-banged by [`hw_init::dht_read_frame`].
//! The host simulator synthesises frames from values set via
//! [`sim_set_environment`], so the decoder runs the same path either way.
//!
//! [`hw_init::dht_read_frame`]: crate::drivers::hw_init::dht_read_frame

use crate::app::ports::{EnvReading, EnvironmentPort};
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub const FRAME_LEN: usize = 5;

pub fn checksum(frame: &[u8; FRAME_LEN]) -> u8 {
    frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Decode a raw frame.  Rejects bad checksums.
pub fn decode_frame(frame: &[u8; FRAME_LEN]) -> Result<EnvReading, SensorError> {
    if checksum(frame) != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }
    let humidity_raw = u16::from_be_bytes([frame[0], frame[1]]);
    let temp_raw = u16::from_be_bytes([frame[2], frame[3]]);
    let magnitude = f32::from(temp_raw & 0x7FFF) / 10.0;
    let temperature_c = if temp_raw & 0x8000 != 0 { -magnitude } else { magnitude };

    Ok(EnvReading {
        temperature_c,
        humidity_pct: f32::from(humidity_raw) / 10.0,
    })
}

/// Build the frame a sensor would send for these values.
pub fn encode_frame(temperature_c: f32, humidity_pct: f32) -> [u8; FRAME_LEN] {
    let humidity = (humidity_pct * 10.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    let magnitude = (temperature_c.abs() * 10.0).round().min(f32::from(0x7FFF_u16)) as u16;
    let temp = if temperature_c < 0.0 { magnitude | 0x8000 } else { magnitude };

    let [h0, h1] = humidity.to_be_bytes();
    let [t0, t1] = temp.to_be_bytes();
    let mut frame = [h0, h1, t0, t1, 0];
    frame[4] = checksum(&frame);
    frame
}

pub struct Dht22 {
    gpio: i32,
}

impl Dht22 {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Result<[u8; FRAME_LEN], SensorError> {
        crate::drivers::hw_init::dht_read_frame(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&mut self) -> Result<[u8; FRAME_LEN], SensorError> {
        if SIM_FAULT.load(Ordering::Relaxed) {
            return Err(SensorError::NoResponse);
        }
        let t = SIM_TEMP_DECI_C.load(Ordering::Relaxed) as f32 / 10.0;
        let h = SIM_HUMIDITY_DECI_PCT.load(Ordering::Relaxed) as f32 / 10.0;
        Ok(encode_frame(t, h))
    }
}

impl EnvironmentPort for Dht22 {
    fn read(&mut self) -> Result<EnvReading, SensorError> {
        let frame = self.read_frame()?;
        decode_frame(&frame)
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_DECI_C: AtomicI32 = AtomicI32::new(220);
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_DECI_PCT: AtomicI32 = AtomicI32::new(450);
#[cfg(not(target_os = "espidf"))]
static SIM_FAULT: AtomicBool = AtomicBool::new(false);

/// Set the cabin conditions the simulated sensor reports.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_environment(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_DECI_C.store((temperature_c * 10.0).round() as i32, Ordering::Relaxed);
    SIM_HUMIDITY_DECI_PCT.store((humidity_pct * 10.0).round() as i32, Ordering::Relaxed);
}

/// Make the simulated sensor stop answering.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fault(fault: bool) {
    SIM_FAULT.store(fault, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_datasheet_example() {
        // 65.2 %RH, 35.1 °C
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEE];
        let r = decode_frame(&frame).unwrap();
        assert!((r.humidity_pct - 65.2).abs() < 1e-4);
        assert!((r.temperature_c - 35.1).abs() < 1e-4);
    }

    #[test]
    fn negative_temperature_sign_bit() {
        // -10.1 °C
        let frame = encode_frame(-10.1, 50.0);
        assert_eq!(frame[2] & 0x80, 0x80);
        let r = decode_frame(&frame).unwrap();
        assert!((r.temperature_c + 10.1).abs() < 1e-4);
    }

    #[test]
    fn corrupted_frame_rejected() {
        let mut frame = encode_frame(25.0, 40.0);
        frame[1] ^= 0x01;
        assert_eq!(decode_frame(&frame), Err(SensorError::ChecksumMismatch));
    }
}
