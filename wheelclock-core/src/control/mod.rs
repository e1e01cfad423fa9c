//! Command and status surface
//!
//! Commands arrive from whatever control link the board provides and are
//! drained by the scheduler on its cold path. Each command gets exactly
//! one [`Reply`].

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationReport;
use crate::config::{CalibrationData, ClockSettings, SettingsError};
use crate::scheduler::DisplayMode;
use crate::state::PerAxis;

/// Requests accepted from the control surface
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Show a fixed hour and minute until told to resume
    SetManual { hour: u8, minute: u8 },
    /// Go back to following the wall clock
    ResumeAuto,
    /// Re-measure sensor baselines and re-home
    CalibrateSensors,
    /// Re-measure baselines, re-home and measure both wheels
    CalibrateFull,
    /// Discard measured step counts and re-home
    ResetCalibration,
    /// Replace and persist the settings
    ApplySettings(ClockSettings),
    /// Snapshot of the whole clock
    QueryStatus,
    /// Current or last calibration session
    QueryCalibration,
}

/// Why a command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CommandError {
    /// A homing or calibration session already owns the wheels
    SessionActive,
    /// Manual target outside 0-59
    InvalidTarget,
    /// Settings failed validation
    Settings(SettingsError),
}

impl From<SettingsError> for CommandError {
    fn from(err: SettingsError) -> Self {
        CommandError::Settings(err)
    }
}

/// Answer to one command
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Reply {
    Ack,
    Rejected(CommandError),
    Status(ClockStatus),
    Calibration(CalibrationReport),
}

impl From<Result<(), CommandError>> for Reply {
    fn from(result: Result<(), CommandError>) -> Self {
        match result {
            Ok(()) => Reply::Ack,
            Err(err) => Reply::Rejected(err),
        }
    }
}

/// Something the persistence layer should write
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SaveRequest {
    Settings(ClockSettings),
    Calibration(CalibrationData),
}

/// Full clock snapshot for the control surface
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockStatus {
    /// Value each wheel was last commanded to show
    pub displayed: PerAxis<Option<u8>>,
    /// Local date such as "Jan 18", or "--" before the time is set
    pub date: String<8>,
    pub mode: DisplayMode,
    /// Whether each sensor currently sees its magnet
    pub sensors: PerAxis<bool>,
    pub outputs_enabled: PerAxis<bool>,
    pub calibration: CalibrationData,
    pub session: CalibrationReport,
    pub settings: ClockSettings,
}
