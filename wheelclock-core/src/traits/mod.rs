//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and board-specific implementations. The scheduler needs every one of
//! them at once, which is what [`Board`] bundles.

pub mod indicator;
pub mod link;
pub mod sensor;
pub mod stepper;
pub mod time;
pub mod watchdog;

pub use indicator::{IndicatorFrame, Indicators};
pub use link::ControlLink;
pub use sensor::SensorBank;
pub use stepper::{Direction, StepperDriver};
pub use time::{TimeSource, WallTime};
pub use watchdog::Watchdog;

use embedded_hal::delay::DelayNs;

/// Everything the scheduler touches besides the two stepper drivers
pub trait Board: SensorBank + TimeSource + Watchdog + Indicators + ControlLink + DelayNs {}

impl<T> Board for T where T: SensorBank + TimeSource + Watchdog + Indicators + ControlLink + DelayNs {}
