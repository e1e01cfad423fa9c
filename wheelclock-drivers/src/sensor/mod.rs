//! Sensor implementations

pub mod hall;

pub use hall::{AdcReader, HallSensors};
