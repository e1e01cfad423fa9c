//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in wheelclock-core on top of embedded-hal:
//!
//! - Stepper coil drivers (ULN2003 darlington array, 4-wire unipolar)
//! - Hall sensor pair over any 12-bit ADC channel
//! - PWM indicator LEDs

#![no_std]
#![deny(unsafe_code)]

pub mod indicator;
pub mod sensor;
pub mod stepper;
