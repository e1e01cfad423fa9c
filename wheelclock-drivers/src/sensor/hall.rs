//! Analog hall-effect sensor pair
//!
//! Both sensors hang off one ADC. A reading near the quiescent output
//! (about half supply) means no magnet; either pole of the home magnet
//! pushes it away from that baseline.

use wheelclock_core::state::{AxisId, PerAxis};
use wheelclock_core::traits::SensorBank;

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read one ADC input (12-bit, 0-4095)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self, input: u8) -> Result<u16, ()>;
}

/// Hall sensors for both wheels on a shared ADC
pub struct HallSensors<ADC> {
    adc: ADC,
    /// ADC input watching each wheel
    inputs: PerAxis<u8>,
    /// Most recent successful sample, reported when a read fails
    last_good: PerAxis<u16>,
}

/// Mid-scale output of a ratiometric sensor with no field
const QUIESCENT: u16 = 2048;

impl<ADC: AdcReader> HallSensors<ADC> {
    /// Create a sensor pair
    ///
    /// # Arguments
    /// - `adc`: shared ADC
    /// - `hours`: ADC input of the hours wheel sensor
    /// - `minutes`: ADC input of the minutes wheel sensor
    pub fn new(adc: ADC, hours: u8, minutes: u8) -> Self {
        Self {
            adc,
            inputs: PerAxis::new(hours, minutes),
            last_good: PerAxis::splat(QUIESCENT),
        }
    }

    /// Last sample reported for a wheel
    pub fn last_sample(&self, axis: AxisId) -> u16 {
        *self.last_good.get(axis)
    }
}

impl<ADC: AdcReader> SensorBank for HallSensors<ADC> {
    fn read_raw(&mut self, axis: AxisId) -> u16 {
        match self.adc.read(*self.inputs.get(axis)) {
            Ok(raw) => {
                let raw = raw.min(4095);
                *self.last_good.get_mut(axis) = raw;
                raw
            }
            Err(()) => *self.last_good.get(axis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ADC returning a fixed value per input, or failing
    struct DummyAdc {
        values: [Option<u16>; 4],
    }

    impl AdcReader for DummyAdc {
        fn read(&mut self, input: u8) -> Result<u16, ()> {
            self.values[usize::from(input)].ok_or(())
        }
    }

    #[test]
    fn test_reads_mapped_inputs() {
        let adc = DummyAdc {
            values: [Some(100), Some(1800), Some(2900), None],
        };
        let mut sensors = HallSensors::new(adc, 2, 1);
        assert_eq!(sensors.read_raw(AxisId::Hours), 2900);
        assert_eq!(sensors.read_raw(AxisId::Minutes), 1800);
    }

    #[test]
    fn test_failed_read_reports_last_good() {
        let adc = DummyAdc {
            values: [Some(1750), None, None, None],
        };
        let mut sensors = HallSensors::new(adc, 0, 3);
        assert_eq!(sensors.read_raw(AxisId::Hours), 1750);
        assert_eq!(sensors.read_raw(AxisId::Minutes), QUIESCENT);

        sensors.adc.values[0] = None;
        assert_eq!(sensors.read_raw(AxisId::Hours), 1750);
        assert_eq!(sensors.last_sample(AxisId::Hours), 1750);
    }

    #[test]
    fn test_clamps_to_12_bits() {
        let adc = DummyAdc {
            values: [Some(u16::MAX), None, None, None],
        };
        let mut sensors = HallSensors::new(adc, 0, 0);
        assert_eq!(sensors.read_raw(AxisId::Minutes), 4095);
    }
}
