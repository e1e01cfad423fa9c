//! Clock state
//!
//! Axis identities, the per-axis pair container, and the aggregate that
//! the scheduler owns exclusively.

pub mod clock;

pub use clock::ClockState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which display wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisId {
    Hours,
    Minutes,
}

impl AxisId {
    /// Both wheels, in the order sensors are sampled
    pub const ALL: [AxisId; 2] = [AxisId::Hours, AxisId::Minutes];

    /// One-letter tag used in status text
    pub fn tag(self) -> char {
        match self {
            AxisId::Hours => 'H',
            AxisId::Minutes => 'M',
        }
    }
}

/// One value per wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerAxis<T> {
    pub hours: T,
    pub minutes: T,
}

impl<T> PerAxis<T> {
    pub const fn new(hours: T, minutes: T) -> Self {
        Self { hours, minutes }
    }

    pub fn get(&self, axis: AxisId) -> &T {
        match axis {
            AxisId::Hours => &self.hours,
            AxisId::Minutes => &self.minutes,
        }
    }

    pub fn get_mut(&mut self, axis: AxisId) -> &mut T {
        match axis {
            AxisId::Hours => &mut self.hours,
            AxisId::Minutes => &mut self.minutes,
        }
    }

    /// Hours first, then minutes
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.hours, &self.minutes].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        [&mut self.hours, &mut self.minutes].into_iter()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerAxis<U> {
        PerAxis {
            hours: f(self.hours),
            minutes: f(self.minutes),
        }
    }
}

impl<T: Clone> PerAxis<T> {
    /// Same value on both wheels
    pub fn splat(value: T) -> Self {
        Self {
            hours: value.clone(),
            minutes: value,
        }
    }
}
