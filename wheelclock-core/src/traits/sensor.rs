//! Hall sensor input trait

use crate::state::AxisId;

/// Raw analog access to the two hall-effect sensors
pub trait SensorBank {
    /// Take one raw ADC sample for the sensor watching `axis`
    ///
    /// Values are 12-bit; a read failure should report the last good
    /// sample rather than a sentinel.
    fn read_raw(&mut self, axis: AxisId) -> u16;
}
