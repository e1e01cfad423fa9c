//! Indicator LED implementations

pub mod pwm_led;

pub use pwm_led::{LedBank, PwmLed};
