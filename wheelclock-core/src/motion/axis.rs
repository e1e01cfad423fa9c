//! Accelerated, non-blocking stepper axis
//!
//! Implements the classic constant-acceleration ramp (Austin's
//! "Generate stepper-motor speed profiles in real time") on top of a
//! [`StepperDriver`]. Every call to [`Axis::step`] does at most one
//! physical step, so a single cooperative loop can run both wheels.
//!
//! Timestamps are monotonic microseconds supplied by the caller.

use libm::sqrtf;

use crate::traits::{Direction, StepperDriver};

/// Default top speed in steps per second
pub const DEFAULT_MAX_SPEED: f32 = 1000.0;

/// Acceleration used for every move, in steps per second squared
pub const DEFAULT_ACCELERATION: f32 = 1000.0;

/// Nominal steps per revolution of a 28BYJ-48 in full-step mode
pub const NOMINAL_STEPS_PER_REVOLUTION: u16 = 2048;

const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// One display wheel: stepper driver plus the motion bookkeeping
///
/// `position` is a signed step counter that only resets when the wheel is
/// homed. The wheel's angle is `position` modulo the calibrated
/// steps per revolution.
#[derive(Debug)]
pub struct Axis<D> {
    driver: D,
    position: i64,
    target: i64,
    /// Signed, steps per second
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    /// Zero means "not stepping"
    step_interval_us: u32,
    last_step_us: u64,
    direction: Direction,
    /// Ramp step counter; negative while decelerating
    n: i64,
    c0_us: f32,
    cn_us: f32,
    cmin_us: f32,
    steps_per_revolution: u16,
}

impl<D: StepperDriver> Axis<D> {
    /// Create an axis at position zero with the default speed profile
    pub fn new(driver: D, steps_per_revolution: u16) -> Self {
        let mut axis = Self {
            driver,
            position: 0,
            target: 0,
            speed: 0.0,
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: 0.0,
            step_interval_us: 0,
            last_step_us: 0,
            direction: Direction::Forward,
            n: 0,
            c0_us: 0.0,
            cn_us: 0.0,
            cmin_us: MICROS_PER_SECOND / DEFAULT_MAX_SPEED,
            steps_per_revolution: steps_per_revolution.max(1),
        };
        axis.set_acceleration(DEFAULT_ACCELERATION);
        axis
    }

    /// Current position in steps
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Target position in steps
    pub fn target(&self) -> i64 {
        self.target
    }

    /// Steps remaining to the target (signed)
    pub fn distance_to_go(&self) -> i64 {
        self.target - self.position
    }

    /// Current signed speed in steps per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// True while there is distance left or the wheel is still moving
    pub fn is_running(&self) -> bool {
        self.speed != 0.0 || self.distance_to_go() != 0
    }

    pub fn steps_per_revolution(&self) -> u16 {
        self.steps_per_revolution
    }

    /// Replace the calibrated revolution length (zero is ignored)
    pub fn set_steps_per_revolution(&mut self, steps: u16) {
        if steps > 0 {
            self.steps_per_revolution = steps;
        }
    }

    /// Angular phase within one revolution, always in `0..steps_per_revolution`
    pub fn phase(&self) -> i64 {
        self.position.rem_euclid(i64::from(self.steps_per_revolution))
    }

    /// Set an absolute target
    pub fn move_to(&mut self, absolute: i64) {
        if self.target != absolute {
            self.target = absolute;
            self.compute_new_speed();
        }
    }

    /// Set a target relative to the current position
    pub fn move_relative(&mut self, steps: i64) {
        self.move_to(self.position + steps);
    }

    /// Poll the accelerated move
    ///
    /// Takes at most one step, then recomputes the speed. Returns whether
    /// the axis still has work to do.
    pub fn step(&mut self, now_us: u64) -> bool {
        if self.run_at_constant_speed(now_us) {
            self.compute_new_speed();
        }
        self.is_running()
    }

    /// Poll at the speed last set with [`Axis::set_speed`], ignoring the
    /// target and the acceleration profile
    ///
    /// Returns true if a step was taken.
    pub fn run_at_constant_speed(&mut self, now_us: u64) -> bool {
        if self.step_interval_us == 0 {
            return false;
        }
        if now_us.saturating_sub(self.last_step_us) < u64::from(self.step_interval_us) {
            return false;
        }

        match self.direction {
            Direction::Forward => self.position += 1,
            Direction::Backward => self.position -= 1,
        }
        self.driver.step(self.direction);
        self.last_step_us = now_us;
        true
    }

    /// Set the constant speed used by [`Axis::run_at_constant_speed`]
    ///
    /// The value is clamped to the maximum speed; the sign selects the
    /// direction.
    pub fn set_speed(&mut self, speed: f32) {
        if speed == self.speed {
            return;
        }
        let speed = speed.clamp(-self.max_speed, self.max_speed);
        if speed == 0.0 {
            self.step_interval_us = 0;
        } else {
            self.step_interval_us = (MICROS_PER_SECOND / speed.abs()) as u32;
            self.direction = if speed > 0.0 {
                Direction::Forward
            } else {
                Direction::Backward
            };
        }
        self.speed = speed;
    }

    /// Set the ramp ceiling in steps per second (non-positive is ignored)
    pub fn set_max_speed(&mut self, speed: f32) {
        if speed <= 0.0 || speed == self.max_speed {
            return;
        }
        self.max_speed = speed;
        self.cmin_us = MICROS_PER_SECOND / speed;
        // Already ramping: recompute the ramp position for the new ceiling
        if self.n > 0 {
            self.n = self.steps_to_stop();
            self.compute_new_speed();
        }
    }

    /// Set the acceleration in steps per second squared (non-positive is ignored)
    pub fn set_acceleration(&mut self, acceleration: f32) {
        if acceleration <= 0.0 || acceleration == self.acceleration {
            return;
        }
        if self.acceleration > 0.0 {
            self.n = (self.n as f32 * (self.acceleration / acceleration)) as i64;
        }
        // Equation 15 with the 0.676 first-step correction
        self.c0_us = 0.676 * sqrtf(2.0 / acceleration) * MICROS_PER_SECOND;
        self.acceleration = acceleration;
        self.compute_new_speed();
    }

    /// Decelerate to a stop as quickly as the acceleration allows
    ///
    /// Retargets to the nearest reachable stopping point; keep polling
    /// [`Axis::step`] to actually slow down.
    pub fn stop(&mut self) {
        if self.speed != 0.0 {
            let steps = self.steps_to_stop() + 1;
            if self.speed > 0.0 {
                self.move_relative(steps);
            } else {
                self.move_relative(-steps);
            }
        }
    }

    /// Redefine the current position, cancelling any move in progress
    pub fn set_current_position(&mut self, position: i64) {
        self.position = position;
        self.target = position;
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    /// Power the coils
    pub fn enable_outputs(&mut self) {
        self.driver.enable(true);
    }

    /// Release the coils; position memory is kept
    pub fn disable_outputs(&mut self) {
        self.driver.enable(false);
    }

    pub fn outputs_enabled(&self) -> bool {
        self.driver.is_enabled()
    }

    fn steps_to_stop(&self) -> i64 {
        ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64
    }

    fn compute_new_speed(&mut self) {
        let distance = self.distance_to_go();
        let steps_to_stop = self.steps_to_stop();

        if distance == 0 && steps_to_stop <= 1 {
            // At the target and slow enough to stop dead
            self.step_interval_us = 0;
            self.speed = 0.0;
            self.n = 0;
            return;
        }

        if distance > 0 {
            if self.n > 0 {
                if steps_to_stop >= distance || self.direction == Direction::Backward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < distance && self.direction == Direction::Forward
            {
                self.n = -self.n;
            }
        } else if distance < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance || self.direction == Direction::Forward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < -distance && self.direction == Direction::Backward
            {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            // First step from standstill
            self.cn_us = self.c0_us;
            self.direction = if distance > 0 {
                Direction::Forward
            } else {
                Direction::Backward
            };
        } else {
            // Equation 13
            self.cn_us -= (2.0 * self.cn_us) / (4.0 * self.n as f32 + 1.0);
            self.cn_us = self.cn_us.max(self.cmin_us);
        }
        self.n += 1;
        self.step_interval_us = self.cn_us as u32;
        self.speed = MICROS_PER_SECOND / self.cn_us;
        if self.direction == Direction::Backward {
            self.speed = -self.speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWheel;
    use crate::state::AxisId;

    fn run_until_idle<D: StepperDriver>(axis: &mut Axis<D>, mut now_us: u64) -> u64 {
        let mut guard = 0;
        while axis.step(now_us) {
            now_us += 50;
            guard += 1;
            assert!(guard < 10_000_000, "axis never settled");
        }
        now_us
    }

    #[test]
    fn test_new_axis_is_idle() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        assert_eq!(axis.position(), 0);
        assert!(!axis.is_running());
        assert!(!axis.step(1_000_000));
    }

    #[test]
    fn test_relative_move_reaches_target() {
        let wheel = SimWheel::new(AxisId::Minutes);
        let coils = wheel.coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.move_relative(500);
        run_until_idle(&mut axis, 0);
        assert_eq!(axis.position(), 500);
        assert_eq!(wheel.physical(), 500);
        assert_eq!(axis.speed(), 0.0);
    }

    #[test]
    fn test_move_is_ramped() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.set_max_speed(600.0);
        axis.move_relative(2000);

        let mut now = 0;
        let mut peak: f32 = 0.0;
        while axis.step(now) {
            peak = peak.max(axis.speed());
            assert!(axis.speed() <= 600.0 + 0.5);
            now += 50;
        }
        // Long enough to reach the ceiling, and takes at least as long as
        // the ideal trapezoid at 1000 steps/s^2
        assert!(peak > 590.0);
        assert!(now > 3_000_000);
    }

    #[test]
    fn test_step_is_paced() {
        let wheel = SimWheel::new(AxisId::Minutes);
        let coils = wheel.coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.move_relative(100);
        // Polling repeatedly at the same instant takes at most one step
        for _ in 0..10 {
            axis.step(1_000_000);
        }
        assert_eq!(wheel.physical(), 1);
    }

    #[test]
    fn test_constant_speed_runs_backward() {
        let wheel = SimWheel::new(AxisId::Minutes);
        let coils = wheel.coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.set_speed(-200.0);
        let mut now = 0;
        let mut taken = 0;
        while taken < 10 {
            if axis.run_at_constant_speed(now) {
                taken += 1;
            }
            now += 100;
        }
        assert_eq!(axis.position(), -10);
        assert_eq!(wheel.physical(), -10);
        // 200 steps/s is a 5 ms interval
        assert!(now >= 9 * 5_000);
    }

    #[test]
    fn test_set_speed_is_clamped() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.set_max_speed(300.0);
        axis.set_speed(5000.0);
        assert_eq!(axis.speed(), 300.0);
    }

    #[test]
    fn test_stop_decelerates_past_current_position() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.set_max_speed(600.0);
        axis.move_relative(6000);
        let mut now = 0;
        while axis.position() < 1000 {
            axis.step(now);
            now += 50;
        }
        axis.stop();
        let stop_target = axis.target();
        assert!(stop_target > 1000 && stop_target < 6000);
        run_until_idle(&mut axis, now);
        assert_eq!(axis.position(), stop_target);
    }

    #[test]
    fn test_set_current_position_cancels_move() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, NOMINAL_STEPS_PER_REVOLUTION);
        axis.move_relative(100);
        axis.step(100_000);
        axis.set_current_position(0);
        assert_eq!(axis.distance_to_go(), 0);
        assert!(!axis.is_running());
    }

    #[test]
    fn test_phase_wraps_negative_positions() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, 2048);
        axis.set_current_position(-1);
        assert_eq!(axis.phase(), 2047);
        axis.set_current_position(4096 + 36);
        assert_eq!(axis.phase(), 36);
    }

    #[test]
    fn test_outputs_toggle_without_losing_position() {
        let coils = SimWheel::new(AxisId::Minutes).coils();
        let mut axis = Axis::new(coils, 2048);
        axis.set_current_position(123);
        axis.disable_outputs();
        assert!(!axis.outputs_enabled());
        axis.enable_outputs();
        assert!(axis.outputs_enabled());
        assert_eq!(axis.position(), 123);
    }
}
