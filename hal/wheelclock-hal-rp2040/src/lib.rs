//! RP2040-specific HAL for the wheel clock firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `wheelclock-hal` and `wheelclock-drivers` traits:
//!
//! - ADC access for the hall sensor pair (implements `AdcReader`)
//! - Flash storage driver (implements `wheelclock_hal::FlashStorage`)

#![no_std]

pub mod adc;
pub mod flash;

// Re-export shared traits from wheelclock-hal for convenience
pub use wheelclock_hal::{FlashStorage as FlashStorageTrait, StorageKey};
