//! Display value to step count conversion
//!
//! Each wheel carries 60 evenly spaced positions. A move always goes
//! forward, and always lands on a multiple of [`DETENT_STEPS`] so the
//! wheel rests where the 4-phase coil sequence holds it firmly.

use libm::roundf;

/// Display positions around one wheel
pub const POSITIONS_PER_REVOLUTION: u16 = 60;

/// Coil sequence length; targets are snapped to multiples of this
pub const DETENT_STEPS: i64 = 4;

/// Forward steps needed to bring a wheel from its current phase to `next`
///
/// `position` is the raw step counter and `steps_per_revolution` the
/// calibrated revolution length. The result is in
/// `0..steps_per_revolution`; a target equal to the current snapped phase
/// yields zero.
pub fn steps_to_target(position: i64, steps_per_revolution: u16, next: u8) -> i64 {
    let rev = i64::from(steps_per_revolution.max(1));
    let phase = position.rem_euclid(rev);

    let ideal = f32::from(next) * f32::from(steps_per_revolution)
        / f32::from(POSITIONS_PER_REVOLUTION);
    let ideal = roundf(ideal) as i64;

    let remainder = ideal.rem_euclid(DETENT_STEPS);
    let snapped = if remainder >= DETENT_STEPS / 2 {
        ideal + (DETENT_STEPS - remainder)
    } else {
        ideal - remainder
    };
    let snapped = snapped.rem_euclid(rev);

    let delta = snapped - phase;
    if delta < 0 {
        delta + rev
    } else {
        delta
    }
}
