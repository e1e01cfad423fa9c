//! Scheduling and display mode arbitration
//!
//! [`Scheduler`] is the single thread of control: it owns the wheels
//! (through [`crate::state::ClockState`]) and decides each tick whether
//! they follow the clock, a manual override, the date, or an active
//! calibration session.

pub mod executor;
pub mod schedule;

pub use executor::{Scheduler, COLON_TOGGLE_MS, IDLE_POWER_OFF_MS, LOGIC_INTERVAL_US};
pub use schedule::{DisplayMode, DisplaySchedule, PLAUSIBLE_UNIX_TIME};
