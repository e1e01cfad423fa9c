//! Configuration types
//!
//! Board-agnostic settings and calibration structures stored in flash as
//! postcard binary data.

pub mod calibration;
pub mod settings;

pub use calibration::*;
pub use settings::*;
