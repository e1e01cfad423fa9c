//! Persistent configuration
//!
//! Settings and calibration are stored as postcard blobs in the flash
//! key-value map, each under its own key.

pub mod store;

pub use store::{load_calibration, load_settings, save, StoreError};
