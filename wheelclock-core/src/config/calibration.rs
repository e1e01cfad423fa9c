//! Persisted sensor and wheel calibration
//!
//! Stores the hall sensor baselines and the measured steps per revolution
//! of each wheel. Loaded on boot; written after a baseline measurement or
//! an accepted step count.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::NOMINAL_STEPS_PER_REVOLUTION;
use crate::state::{AxisId, PerAxis};

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x5743_414C; // "WCAL"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Sensor reading with no magnet present, used until a baseline is measured
pub const DEFAULT_BASELINE: u16 = 1800;

/// Calibration data stored in flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationData {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Averaged no-magnet sensor reading per wheel
    pub baseline: PerAxis<u16>,
    /// Measured steps for one full turn per wheel
    pub steps_per_revolution: PerAxis<u16>,
    /// CRC32 over every field above
    pub crc: u32,
}

impl Default for CalibrationData {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationData {
    /// Factory calibration: default baselines, nominal revolution length
    pub const fn new() -> Self {
        Self {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            baseline: PerAxis::new(DEFAULT_BASELINE, DEFAULT_BASELINE),
            steps_per_revolution: PerAxis::new(
                NOMINAL_STEPS_PER_REVOLUTION,
                NOMINAL_STEPS_PER_REVOLUTION,
            ),
            crc: 0,
        }
    }

    /// Check if the data is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == CALIBRATION_MAGIC && self.version == CALIBRATION_VERSION
    }

    /// Baseline for `axis`, falling back to the default if never measured
    pub fn baseline(&self, axis: AxisId) -> u16 {
        match *self.baseline.get(axis) {
            0 => DEFAULT_BASELINE,
            b => b,
        }
    }

    /// Steps per revolution for `axis`, falling back to nominal if zero
    pub fn steps_per_revolution(&self, axis: AxisId) -> u16 {
        match *self.steps_per_revolution.get(axis) {
            0 => NOMINAL_STEPS_PER_REVOLUTION,
            s => s,
        }
    }

    /// Forget measured step counts; baselines are kept
    pub fn reset_step_counts(&mut self) {
        self.steps_per_revolution = PerAxis::splat(NOMINAL_STEPS_PER_REVOLUTION);
    }

    /// Calculate CRC32 for the data (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.magic.to_le_bytes());
        hasher.update(&[self.version]);
        for axis in AxisId::ALL {
            hasher.update(&self.baseline.get(axis).to_le_bytes());
            hasher.update(&self.steps_per_revolution.get(axis).to_le_bytes());
        }
        hasher.finalize()
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}
