//! Wheel Clock Hardware Abstraction Layer
//!
//! Traits that chip-specific HALs implement for the parts of the clock
//! `embedded-hal` does not cover. Pins, PWM and delays come straight from
//! `embedded-hal` 1.0; this crate only adds persistent storage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  wheelclock-firmware                    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wheelclock-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ wheelclock-hal-   │
//!           │     rp2040        │
//!           └───────────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
