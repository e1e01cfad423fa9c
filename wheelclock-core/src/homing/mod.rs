//! Magnet homing
//!
//! Each wheel carries one magnet. Homing drives the wheel forward until
//! its hall sensor departs from the baseline, crosses the magnet at a
//! slow constant speed to find the far edge, then backs off to the middle
//! of the detected span and declares that position zero.

pub mod pass;
pub mod search;
pub mod sensor;

pub use pass::HomingPass;
pub use search::{CenterOutcome, MagnetSearch};
pub use sensor::{read_average, threshold_for_sensitivity, SensorChannel};

/// Top speed while homing, steps per second
pub const HOMING_MAX_SPEED: f32 = 600.0;

/// Constant speed while looking for the leading magnet edge
pub const EDGE_SEARCH_SPEED: f32 = 300.0;

/// Constant speed while crossing the magnet
pub const CENTERING_SPEED: f32 = 200.0;

/// Longest magnet span accepted before the crossing is cut short
pub const CENTERING_CAP_STEPS: i64 = 150;
