//! Motion control
//!
//! Accelerated stepping for the display wheels and the math that turns a
//! display value into a forward step count.

pub mod axis;
pub mod target;

pub use axis::{Axis, DEFAULT_ACCELERATION, DEFAULT_MAX_SPEED, NOMINAL_STEPS_PER_REVOLUTION};
pub use target::{steps_to_target, DETENT_STEPS, POSITIONS_PER_REVOLUTION};
