//! Per-wheel magnet search and centering
//!
//! A [`MagnetSearch`] is polled once per scheduler tick and takes at most
//! one step per poll. It never blocks, so the other wheel and the watchdog
//! keep running while it works.

use embedded_hal::delay::DelayNs;

use super::sensor::SensorChannel;
use super::{CENTERING_CAP_STEPS, CENTERING_SPEED, EDGE_SEARCH_SPEED};
use crate::motion::Axis;
use crate::state::AxisId;
use crate::traits::{SensorBank, StepperDriver};

/// How a magnet crossing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CenterOutcome {
    /// The far edge was found
    Centered {
        /// Detected magnet span in steps
        width: u16,
        /// Position of the chosen center before the axis was re-zeroed
        center: i64,
    },
    /// The crossing hit [`CENTERING_CAP_STEPS`] without leaving the magnet
    Capped { width: u16, center: i64 },
}

impl CenterOutcome {
    pub fn width(&self) -> u16 {
        match *self {
            CenterOutcome::Centered { width, .. } | CenterOutcome::Capped { width, .. } => width,
        }
    }

    /// Center position in the frame the search started in
    pub fn center(&self) -> i64 {
        match *self {
            CenterOutcome::Centered { center, .. } | CenterOutcome::Capped { center, .. } => center,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Stage {
    /// First sample not taken yet
    Starting,
    /// Started on the magnet: reverse until clear so the leading edge is real
    Retreating { from: i64 },
    /// Constant speed forward until the sensor trips
    SeekingEdge,
    /// Slow crossing from the leading edge
    Crossing { edge: i64 },
    /// Accelerated move back to the middle of the span
    BackingOff { outcome: CenterOutcome },
    Done(CenterOutcome),
}

/// Magnet search state for one wheel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagnetSearch {
    axis: AxisId,
    stage: Stage,
}

impl MagnetSearch {
    /// Start from the edge search
    ///
    /// The first poll sets the search speed on the axis.
    pub fn seek(axis: AxisId) -> Self {
        Self {
            axis,
            stage: Stage::Starting,
        }
    }

    /// Start at the leading edge the wheel is sitting on right now
    ///
    /// Cancels any move in progress and switches to the crossing speed.
    pub fn from_edge<D: StepperDriver>(axis_id: AxisId, axis: &mut Axis<D>) -> Self {
        let edge = axis.position();
        axis.set_current_position(edge);
        axis.set_speed(CENTERING_SPEED);
        Self {
            axis: axis_id,
            stage: Stage::Crossing { edge },
        }
    }

    /// Outcome, once the wheel has been re-zeroed on the center
    pub fn outcome(&self) -> Option<CenterOutcome> {
        match self.stage {
            Stage::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.outcome().is_some()
    }

    /// Advance the search by at most one step
    ///
    /// Returns the outcome once the wheel sits on the magnet center with
    /// its position reset to zero.
    pub fn poll<D, B>(
        &mut self,
        axis: &mut Axis<D>,
        channel: &SensorChannel,
        board: &mut B,
        now_us: u64,
    ) -> Option<CenterOutcome>
    where
        D: StepperDriver,
        B: SensorBank + DelayNs,
    {
        match self.stage {
            Stage::Starting => {
                if channel.detect(board, self.axis) {
                    // Parked on the magnet, e.g. re-homing an already homed wheel
                    axis.set_speed(-EDGE_SEARCH_SPEED);
                    self.stage = Stage::Retreating {
                        from: axis.position(),
                    };
                } else {
                    axis.set_speed(EDGE_SEARCH_SPEED);
                    axis.run_at_constant_speed(now_us);
                    self.stage = Stage::SeekingEdge;
                }
            }
            Stage::Retreating { from } => {
                let cleared = if from - axis.position() >= CENTERING_CAP_STEPS {
                    // Sensor never cleared; take the edge where we are
                    true
                } else {
                    axis.run_at_constant_speed(now_us);
                    !channel.detect(board, self.axis)
                };
                if cleared {
                    axis.set_speed(EDGE_SEARCH_SPEED);
                    self.stage = Stage::SeekingEdge;
                }
            }
            Stage::SeekingEdge => {
                // Sample before stepping so the edge is the first magnet position
                if channel.detect(board, self.axis) {
                    *self = Self::from_edge(self.axis, axis);
                } else {
                    axis.run_at_constant_speed(now_us);
                }
            }
            Stage::Crossing { edge } => {
                let travelled = axis.position() - edge;
                if travelled >= CENTERING_CAP_STEPS {
                    self.back_off(axis, edge, true);
                } else {
                    axis.run_at_constant_speed(now_us);
                    if !channel.detect(board, self.axis) {
                        self.back_off(axis, edge, false);
                    }
                }
            }
            Stage::BackingOff { outcome } => {
                if !axis.step(now_us) {
                    axis.set_current_position(0);
                    self.stage = Stage::Done(outcome);
                }
            }
            Stage::Done(_) => {}
        }
        self.outcome()
    }

    /// Move back to the middle of the span found between `edge` and here
    fn back_off<D: StepperDriver>(&mut self, axis: &mut Axis<D>, edge: i64, capped: bool) {
        let width = axis.position() - edge;
        let half = width / 2;
        let width = u16::try_from(width).unwrap_or(u16::MAX);
        let center = edge + half;
        let outcome = if capped {
            warn!("{:?}: magnet span capped at {} steps", self.axis, width);
            CenterOutcome::Capped { width, center }
        } else {
            debug!("{:?}: magnet span {} steps", self.axis, width);
            CenterOutcome::Centered { width, center }
        };

        // Re-express the position relative to the leading edge, then
        // retreat to the midpoint
        axis.set_current_position(i64::from(width));
        axis.move_to(half);
        self.stage = Stage::BackingOff { outcome };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBoard, SimWheel};

    fn run_search(wheel: &SimWheel, board: &mut SimBoard) -> (Axis<crate::sim::SimCoils>, CenterOutcome) {
        let mut axis = Axis::new(wheel.coils(), 2048);
        axis.set_max_speed(600.0);
        let channel = SensorChannel::new(1800, 50);
        let mut search = MagnetSearch::seek(wheel.axis());
        for _ in 0..200_000 {
            let now = board.now_us();
            if let Some(outcome) = search.poll(&mut axis, &channel, board, now) {
                return (axis, outcome);
            }
            board.advance_us(500);
        }
        panic!("search never finished");
    }

    #[test]
    fn test_centers_on_magnet() {
        let mut board = SimBoard::new();
        let wheel = board.minutes.clone();
        wheel.set_magnet(300, 40);

        let (axis, outcome) = run_search(&wheel, &mut board);
        assert!(matches!(outcome, CenterOutcome::Centered { .. }));
        assert_eq!(outcome.width(), 40);
        assert_eq!(axis.position(), 0);
        // Physically within one step of the true middle
        let middle = 300 + 20;
        assert!((wheel.physical() - middle).abs() <= 1);
    }

    #[test]
    fn test_starts_on_magnet() {
        let mut board = SimBoard::new();
        let wheel = board.minutes.clone();
        wheel.set_magnet(0, 40);

        let (_, outcome) = run_search(&wheel, &mut board);
        assert_eq!(outcome.width(), 40);
        assert!((wheel.physical() - 20).abs() <= 1);
    }

    #[test]
    fn test_rehoming_does_not_drift() {
        let mut board = SimBoard::new();
        let wheel = board.minutes.clone();
        wheel.set_magnet(300, 40);

        run_search(&wheel, &mut board);
        let first = wheel.physical();
        // Second pass starts in the middle of the magnet
        run_search(&wheel, &mut board);
        assert_eq!(wheel.physical(), first);
    }

    #[test]
    fn test_wide_magnet_is_capped() {
        let mut board = SimBoard::new();
        let wheel = board.hours.clone();
        wheel.set_magnet(100, 400);

        let (_, outcome) = run_search(&wheel, &mut board);
        assert!(matches!(outcome, CenterOutcome::Capped { width: 150, .. }));
        assert_eq!(wheel.physical(), 100 + 75);
    }
}
