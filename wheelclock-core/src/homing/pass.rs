//! Homing both wheels together

use embedded_hal::delay::DelayNs;

use super::search::{CenterOutcome, MagnetSearch};
use super::sensor::SensorChannel;
use super::HOMING_MAX_SPEED;
use crate::motion::Axis;
use crate::state::{AxisId, PerAxis};
use crate::traits::{SensorBank, StepperDriver};

/// Lockstep magnet search on both wheels
///
/// Each poll advances each unfinished wheel by at most one step, sampling
/// the hours sensor before the minutes sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingPass {
    searches: PerAxis<MagnetSearch>,
}

impl HomingPass {
    /// Prepare both axes for the edge search and start
    pub fn start<D: StepperDriver>(axes: &mut PerAxis<Axis<D>>) -> Self {
        for id in AxisId::ALL {
            let axis = axes.get_mut(id);
            axis.set_current_position(axis.position());
            axis.enable_outputs();
            axis.set_max_speed(HOMING_MAX_SPEED);
        }
        Self {
            searches: PerAxis::new(
                MagnetSearch::seek(AxisId::Hours),
                MagnetSearch::seek(AxisId::Minutes),
            ),
        }
    }

    /// Poll both searches; returns both outcomes once each wheel is centered
    pub fn poll<D, B>(
        &mut self,
        axes: &mut PerAxis<Axis<D>>,
        channels: &PerAxis<SensorChannel>,
        board: &mut B,
        now_us: u64,
    ) -> Option<PerAxis<CenterOutcome>>
    where
        D: StepperDriver,
        B: SensorBank + DelayNs,
    {
        for id in AxisId::ALL {
            let search = self.searches.get_mut(id);
            if !search.is_done() {
                search.poll(axes.get_mut(id), channels.get(id), board, now_us);
            }
        }
        match (self.searches.hours.outcome(), self.searches.minutes.outcome()) {
            (Some(hours), Some(minutes)) => Some(PerAxis::new(hours, minutes)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;

    #[test]
    fn test_homes_both_wheels() {
        let mut board = SimBoard::new();
        board.hours.set_magnet(500, 40);
        board.minutes.set_magnet(1500, 36);
        let mut axes = PerAxis::new(
            Axis::new(board.hours.coils(), 2048),
            Axis::new(board.minutes.coils(), 2048),
        );
        let channels = PerAxis::splat(SensorChannel::new(1800, 50));

        let mut pass = HomingPass::start(&mut axes);
        let outcome = loop {
            let now = board.now_us();
            if let Some(outcome) = pass.poll(&mut axes, &channels, &mut board, now) {
                break outcome;
            }
            board.advance_us(200);
        };

        assert_eq!(outcome.hours.width(), 40);
        assert_eq!(outcome.minutes.width(), 36);
        assert_eq!(axes.hours.position(), 0);
        assert_eq!(axes.minutes.position(), 0);
        assert_eq!(board.hours.physical(), 520);
        assert_eq!(board.minutes.physical(), 1518);
    }
}
