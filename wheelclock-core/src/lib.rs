//! Board-agnostic core logic for the wheel clock firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper coils, hall sensors, time source)
//! - Accelerated stepper motion and the detent target math
//! - Magnet homing and the calibration session state machine
//! - Display mode arbitration and the cooperative tick scheduler
//! - Persisted settings and calibration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod calibration;
pub mod config;
pub mod control;
pub mod homing;
pub mod motion;
pub mod scheduler;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod sim;
