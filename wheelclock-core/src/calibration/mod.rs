//! Homing and calibration sessions
//!
//! A session owns both wheels until it finishes: the scheduler polls it on
//! every tick instead of running its own motion, and skips mode
//! arbitration while it is active.

pub mod report;
pub mod session;

pub use report::{CalibrationPhase, CalibrationReport, MeasureResult};
pub use session::{evaluate_measurement, CalibrationSession, SessionKind};
