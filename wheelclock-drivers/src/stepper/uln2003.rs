//! ULN2003 unipolar stepper driver (28BYJ-48)
//!
//! Four GPIOs switch the four coil ends through the darlington array.
//! Stepping uses the two-phase-on full-step sequence, so every position
//! holds with two coils energized and the wheel rests in a detent every
//! four steps.
//!
//! # Pin order
//!
//! Pins are given in sequence order, not board order. For the usual
//! ULN2003 breakout that is IN1, IN3, IN2, IN4.

use embedded_hal::digital::OutputPin;

use wheelclock_core::traits::{Direction, StepperDriver};

/// Coil pattern for each phase; bit 3 is the first pin
pub const FULL_STEP_SEQUENCE: [u8; 4] = [0b1010, 0b0110, 0b0101, 0b1001];

/// Four-wire coil driver
pub struct Uln2003<P> {
    pins: [P; 4],
    /// Index into [`FULL_STEP_SEQUENCE`]
    phase: usize,
    enabled: bool,
}

impl<P: OutputPin> Uln2003<P> {
    /// Create a driver with the coils released
    pub fn new(pins: [P; 4]) -> Self {
        let mut driver = Self {
            pins,
            phase: 0,
            enabled: false,
        };
        driver.release();
        driver
    }

    /// Current phase in the coil sequence (0-3)
    pub fn phase(&self) -> usize {
        self.phase
    }

    fn energize(&mut self) {
        let pattern = FULL_STEP_SEQUENCE[self.phase];
        for (i, pin) in self.pins.iter_mut().enumerate() {
            let on = pattern & (0b1000 >> i) != 0;
            // GPIO writes on the supported boards are infallible
            let _ = if on { pin.set_high() } else { pin.set_low() };
        }
    }

    fn release(&mut self) {
        for pin in self.pins.iter_mut() {
            let _ = pin.set_low();
        }
    }
}

impl<P: OutputPin> StepperDriver for Uln2003<P> {
    fn step(&mut self, direction: Direction) {
        self.phase = match direction {
            Direction::Forward => (self.phase + 1) % FULL_STEP_SEQUENCE.len(),
            Direction::Backward => {
                (self.phase + FULL_STEP_SEQUENCE.len() - 1) % FULL_STEP_SEQUENCE.len()
            }
        };
        self.enabled = true;
        self.energize();
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            // Re-energize the phase we stopped on so the wheel does not jump
            self.energize();
        } else {
            self.release();
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
