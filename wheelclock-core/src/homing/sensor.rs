//! Hall sensor channel and magnet detection

use embedded_hal::delay::DelayNs;

use crate::state::AxisId;
use crate::traits::SensorBank;

/// Samples averaged for one reading
pub const SAMPLES_PER_READING: u32 = 10;

/// Spacing between averaged samples
pub const SAMPLE_SPACING_MS: u32 = 1;

/// Detection threshold at sensitivity 1
pub const THRESHOLD_AT_MIN_SENSITIVITY: u16 = 1500;

/// Detection threshold at sensitivity 100
pub const THRESHOLD_AT_MAX_SENSITIVITY: u16 = 100;

/// Map a 1-100 sensitivity onto a detection threshold
///
/// Linear from 1500 at sensitivity 1 down to 100 at sensitivity 100.
/// Out-of-range input is clamped.
pub fn threshold_for_sensitivity(sensitivity: u8) -> u16 {
    let s = i32::from(sensitivity.clamp(1, 100));
    let hi = i32::from(THRESHOLD_AT_MIN_SENSITIVITY);
    let lo = i32::from(THRESHOLD_AT_MAX_SENSITIVITY);
    (hi - (s - 1) * (hi - lo) / 99) as u16
}

/// Average of [`SAMPLES_PER_READING`] raw samples taken 1 ms apart
pub fn read_average<B: SensorBank + DelayNs>(board: &mut B, axis: AxisId) -> u16 {
    let mut sum: u32 = 0;
    for _ in 0..SAMPLES_PER_READING {
        sum += u32::from(board.read_raw(axis));
        board.delay_ms(SAMPLE_SPACING_MS);
    }
    (sum / SAMPLES_PER_READING) as u16
}

/// Detection parameters for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorChannel {
    /// Averaged reading with no magnet present
    pub baseline: u16,
    /// Deviation from baseline that counts as a magnet
    pub threshold: u16,
}

impl SensorChannel {
    pub fn new(baseline: u16, sensitivity: u8) -> Self {
        Self {
            baseline,
            threshold: threshold_for_sensitivity(sensitivity),
        }
    }

    /// Whether `reading` deviates far enough from the baseline
    ///
    /// Either magnet polarity is detected.
    pub fn is_magnet(&self, reading: u16) -> bool {
        reading.abs_diff(self.baseline) > self.threshold
    }

    /// Test a single raw reading, for the live status view
    pub fn detect_now<B: SensorBank>(&self, board: &mut B, axis: AxisId) -> bool {
        self.is_magnet(board.read_raw(axis))
    }

    /// Take an averaged reading and test it
    pub fn detect<B: SensorBank + DelayNs>(&self, board: &mut B, axis: AxisId) -> bool {
        self.is_magnet(read_average(board, axis))
    }
}
