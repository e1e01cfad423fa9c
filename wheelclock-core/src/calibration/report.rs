//! Calibration progress and results as seen by the control surface

use core::fmt::Write;

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::{AxisId, PerAxis};

/// Capacity of the human-readable status line
pub const STATUS_LEN: usize = 64;

/// Where a calibration session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CalibrationPhase {
    #[default]
    Idle,
    ClearingSensors,
    MeasuringBaseline,
    CenteringHome,
    CountingMinuteSteps,
    CountingHourSteps,
    Complete,
}

/// Outcome of one steps-per-revolution measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasureResult {
    /// No measurement in this session
    #[default]
    NotMeasured,
    /// Within tolerance, rounded and stored
    Accepted(u16),
    /// Outside tolerance; the previous value was kept
    Rejected(f32),
    /// The axis reached the end of its counting move without a magnet
    NotFound,
}

impl MeasureResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, MeasureResult::Rejected(_) | MeasureResult::NotFound)
    }
}

/// Snapshot of the current or most recent calibration session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationReport {
    pub phase: CalibrationPhase,
    /// 0-100, never decreases within a session
    pub progress: u8,
    pub status: String<STATUS_LEN>,
    pub results: PerAxis<MeasureResult>,
}

impl Default for CalibrationReport {
    fn default() -> Self {
        let mut status = String::new();
        let _ = status.push_str("Idle");
        Self {
            phase: CalibrationPhase::Idle,
            progress: 0,
            status,
            results: PerAxis::default(),
        }
    }
}

impl CalibrationReport {
    /// Reset for a new session
    pub fn begin(&mut self) {
        self.progress = 0;
        self.results = PerAxis::default();
    }

    /// Enter `phase`, raising progress to `progress` if given
    pub fn enter(&mut self, phase: CalibrationPhase, progress: Option<u8>, status: &str) {
        self.phase = phase;
        if let Some(progress) = progress {
            self.progress = self.progress.max(progress.min(100));
        }
        self.set_status(status);
    }

    pub fn set_status(&mut self, status: &str) {
        self.status.clear();
        for c in status.chars() {
            if self.status.push(c).is_err() {
                break;
            }
        }
    }

    /// Error text for a failed measurement, e.g. "Err M: 1900.00"
    pub fn record_failure(&mut self, axis: AxisId) {
        self.status.clear();
        let _ = self.write_failure(axis);
    }

    /// Final status line for a full calibration
    ///
    /// Failures stay visible ahead of the summary so a poller that only
    /// sees the end state still learns about them.
    pub fn finish_full(&mut self, steps: PerAxis<u16>) {
        self.status.clear();
        for axis in [AxisId::Minutes, AxisId::Hours] {
            if self.results.get(axis).is_failure() {
                let _ = self.write_failure(axis);
                let _ = self.status.push(' ');
            }
        }
        let _ = write!(
            self.status,
            "Complete: M{} H{}",
            steps.minutes, steps.hours
        );
        self.phase = CalibrationPhase::Complete;
        self.progress = 100;
    }

    fn write_failure(&mut self, axis: AxisId) -> core::fmt::Result {
        let measured = match *self.results.get(axis) {
            MeasureResult::Rejected(value) => value,
            _ => 0.0,
        };
        write!(self.status, "Err {}: {:.2}", axis.tag(), measured)
    }
}
