//! Indicator LED trait

/// Brightness levels (0-255) for the four indicator LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorFrame {
    /// Lit while a homing or calibration session runs
    pub status: u8,
    /// Colon between the wheels, blinks at 1 Hz
    pub colon: u8,
    /// PM marker in 12-hour mode
    pub pm: u8,
    /// Auxiliary accent light
    pub aux: u8,
}

/// Output side for the indicator LEDs
pub trait Indicators {
    /// Drive every LED to the levels in `frame`
    fn show(&mut self, frame: &IndicatorFrame);
}
