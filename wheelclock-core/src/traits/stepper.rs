//! Stepper coil driver trait
//!
//! Abstracts over the physical coil sequencing. The motion layer decides
//! *when* to step; the driver only knows how to energize the next phase.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wheel rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Increasing step count (the only direction the face ever advances)
    Forward,
    /// Decreasing step count, used when backing off onto a magnet center
    Backward,
}

/// Trait for 4-wire stepper coil drivers
pub trait StepperDriver {
    /// Advance the coil sequence by one step in `direction`
    ///
    /// Energizes the coils even if the outputs were previously disabled.
    fn step(&mut self, direction: Direction);

    /// Enable or disable coil power
    ///
    /// When disabled the wheel is free to turn and holds no torque, but
    /// the driver keeps its place in the phase sequence.
    fn enable(&mut self, enabled: bool);

    /// Check if the coils are powered
    fn is_enabled(&self) -> bool;
}
