//! Line sensor bar input.
//!
//! `LineSensorArray` owns the digital input pins of the reflectance bar,
//! ordered left-to-right, and samples them once per control cycle. The
//! pin table is fixed at construction; there is no runtime remapping.

use embedded_hal::digital::InputPin;
use heapless::Vec;

use super::ConfigError;
use crate::utils::math::error::{LineReading, MAX_SENSORS};

/// Digital sensor bar with a fixed left-to-right pin assignment.
pub struct LineSensorArray<P> {
    pins: Vec<P, MAX_SENSORS>,
}

impl<P> LineSensorArray<P>
where
    P: InputPin,
{
    /// Take ownership of the configured pins, leftmost first.
    ///
    /// An empty table is rejected; the vector capacity caps the count
    /// at [`MAX_SENSORS`].
    pub fn new(pins: Vec<P, MAX_SENSORS>) -> Result<Self, ConfigError> {
        if pins.is_empty() {
            return Err(ConfigError::NoSensors);
        }
        Ok(Self { pins })
    }

    /// Number of sensors on the bar.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Sample every sensor left-to-right. A high pin reads off the line.
    pub fn read_all(&mut self) -> Result<LineReading, P::Error> {
        let mut states = 0u16;
        let count = self.pins.len();
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if pin.is_high()? {
                states |= 1 << i;
            }
        }
        Ok(LineReading::from_bits(states, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State, Transaction as PinTransaction,
    };

    #[test]
    fn empty_pin_table_is_rejected() {
        let pins: Vec<PinMock, MAX_SENSORS> = Vec::new();
        assert!(matches!(
            LineSensorArray::new(pins),
            Err(ConfigError::NoSensors)
        ));
    }

    #[test]
    fn reads_pins_left_to_right() {
        let states = [State::High, State::Low, State::High];
        let mut handles: Vec<PinMock, MAX_SENSORS> = Vec::new();
        let mut pins: Vec<PinMock, MAX_SENSORS> = Vec::new();
        for state in states {
            let pin = PinMock::new(&[PinTransaction::get(state)]);
            let _ = handles.push(pin.clone());
            let _ = pins.push(pin);
        }

        let mut bar = LineSensorArray::new(pins).unwrap();
        let reading = bar.read_all().unwrap();

        assert_eq!(reading.len(), 3);
        assert!(reading.is_off_line(0));
        assert!(!reading.is_off_line(1));
        assert!(reading.is_off_line(2));

        for handle in handles.iter_mut() {
            handle.done();
        }
    }
}
