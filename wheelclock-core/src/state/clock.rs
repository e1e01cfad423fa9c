//! The clock aggregate owned by the scheduler

use super::{AxisId, PerAxis};
use crate::calibration::CalibrationReport;
use crate::config::{CalibrationData, ClockSettings};
use crate::control::ClockStatus;
use crate::homing::SensorChannel;
use crate::motion::{Axis, DEFAULT_ACCELERATION};
use crate::scheduler::DisplaySchedule;
use crate::traits::{SensorBank, StepperDriver, TimeSource};

/// Wheels, settings, calibration and display bookkeeping
///
/// Nothing outside the scheduler and the calibration session mutates the
/// axes.
#[derive(Debug)]
pub struct ClockState<D> {
    pub(crate) axes: PerAxis<Axis<D>>,
    pub(crate) settings: ClockSettings,
    pub(crate) calibration: CalibrationData,
    pub(crate) schedule: DisplaySchedule,
    /// Value last commanded on each wheel; `None` until homed
    pub(crate) displayed: PerAxis<Option<u8>>,
    pub(crate) report: CalibrationReport,
}

impl<D: StepperDriver> ClockState<D> {
    pub fn new(
        hours: D,
        minutes: D,
        settings: ClockSettings,
        calibration: CalibrationData,
    ) -> Self {
        let axes = PerAxis::new(
            Axis::new(hours, calibration.steps_per_revolution(AxisId::Hours)),
            Axis::new(minutes, calibration.steps_per_revolution(AxisId::Minutes)),
        );
        let mut state = Self {
            axes,
            settings,
            calibration,
            schedule: DisplaySchedule::new(),
            displayed: PerAxis::splat(None),
            report: CalibrationReport::default(),
        };
        state.restore_motion_profile();
        state
    }

    pub fn axis(&self, id: AxisId) -> &Axis<D> {
        self.axes.get(id)
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    pub fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }

    pub fn schedule(&self) -> &DisplaySchedule {
        &self.schedule
    }

    pub fn report(&self) -> &CalibrationReport {
        &self.report
    }

    pub fn displayed(&self) -> PerAxis<Option<u8>> {
        self.displayed
    }

    /// Neither wheel has distance left to travel
    pub fn is_idle(&self) -> bool {
        self.axes.iter().all(|axis| axis.distance_to_go() == 0)
    }

    /// Detection parameters for one sensor under the current settings
    pub fn channel(&self, id: AxisId) -> SensorChannel {
        SensorChannel::new(self.calibration.baseline(id), self.settings.sensitivity)
    }

    pub fn channels(&self) -> PerAxis<SensorChannel> {
        PerAxis::new(self.channel(AxisId::Hours), self.channel(AxisId::Minutes))
    }

    /// Adopt new settings and apply their motion side effects
    pub fn apply_settings(&mut self, settings: ClockSettings) {
        self.settings = settings;
        self.restore_motion_profile();
        if !self.settings.power_saver {
            for axis in self.axes.iter_mut() {
                axis.enable_outputs();
            }
        }
    }

    /// Discard measured step counts in favour of the nominal value
    pub fn reset_step_counts(&mut self) {
        self.calibration.reset_step_counts();
        self.calibration.update_crc();
        for id in AxisId::ALL {
            let steps = self.calibration.steps_per_revolution(id);
            self.axes.get_mut(id).set_steps_per_revolution(steps);
        }
    }

    /// Normal running speed and acceleration on both wheels
    pub(crate) fn restore_motion_profile(&mut self) {
        let max_speed = f32::from(self.settings.max_speed);
        for axis in self.axes.iter_mut() {
            axis.set_max_speed(max_speed);
            axis.set_acceleration(DEFAULT_ACCELERATION);
        }
    }

    /// Build a status snapshot with one live read per sensor
    pub fn status<B>(&self, board: &mut B) -> ClockStatus
    where
        B: SensorBank + TimeSource,
    {
        let date = match board.wall_time() {
            Some(wall) => wall.date_label(),
            None => {
                let mut none = heapless::String::new();
                let _ = none.push_str("--");
                none
            }
        };
        let hours = self.channel(AxisId::Hours).detect_now(board, AxisId::Hours);
        let minutes = self.channel(AxisId::Minutes).detect_now(board, AxisId::Minutes);

        ClockStatus {
            displayed: self.displayed,
            date,
            mode: self.schedule.mode(),
            sensors: PerAxis::new(hours, minutes),
            outputs_enabled: PerAxis::new(
                self.axes.hours.outputs_enabled(),
                self.axes.minutes.outputs_enabled(),
            ),
            calibration: self.calibration,
            session: self.report.clone(),
            settings: self.settings.clone(),
        }
    }
}
