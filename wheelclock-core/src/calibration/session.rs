//! Calibration session state machine
//!
//! One session is polled per scheduler tick until it reports completion.
//! Each poll advances at most one step per wheel, or takes one short batch
//! of baseline samples, so the scheduler keeps feeding the watchdog and
//! serving commands throughout.
//!
//! Phases: clearing the sensors, measuring the baseline, centering both
//! wheels on their home magnets, then (full runs only) measuring the
//! steps per revolution of the minutes wheel and then the hours wheel.

use embedded_hal::delay::DelayNs;
use libm::roundf;

use super::report::{CalibrationPhase, MeasureResult};
use crate::control::SaveRequest;
use crate::homing::{CenterOutcome, HomingPass, MagnetSearch, HOMING_MAX_SPEED};
use crate::state::{AxisId, ClockState, PerAxis};
use crate::traits::{ControlLink, SensorBank, StepperDriver};

/// Steps moved off the magnets before measuring the baseline
pub const CLEARING_STEPS: i64 = 600;

/// Paired samples averaged into the baseline
pub const BASELINE_SAMPLES: u16 = 200;

/// Paired samples taken per poll while measuring the baseline
pub const BASELINE_SAMPLES_PER_POLL: u16 = 10;

/// Delay between paired baseline samples
pub const BASELINE_SAMPLE_SPACING_MS: u32 = 2;

/// Length of the counting move, a little over two revolutions
pub const COUNTING_MOVE_STEPS: i64 = 6000;

/// Travel during which the sensor is ignored, skipping the first revolution
pub const BLIND_ZONE_STEPS: i64 = 3000;

/// Accepted steps-per-revolution window
pub const MIN_VALID_STEPS: f32 = 2040.0;
pub const MAX_VALID_STEPS: f32 = 2056.0;

/// What a session does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionKind {
    /// Center on the magnets using the stored baselines
    Homing,
    /// Re-measure the baselines, then home
    SensorsOnly,
    /// Re-measure the baselines, home, then measure both wheels
    Full,
}

impl SessionKind {
    fn measures_baseline(self) -> bool {
        !matches!(self, SessionKind::Homing)
    }
}

/// Judge a two-revolution travel distance
pub fn evaluate_measurement(travelled: i64) -> MeasureResult {
    let measured = travelled as f32 / 2.0;
    if (MIN_VALID_STEPS..=MAX_VALID_STEPS).contains(&measured) {
        MeasureResult::Accepted(roundf(measured) as u16)
    } else {
        MeasureResult::Rejected(measured)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum CountStage {
    BlindZone,
    Seeking,
    Centering(MagnetSearch),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    Clearing,
    Baseline { taken: u16, sums: PerAxis<u32> },
    Centering(HomingPass),
    Counting { axis: AxisId, stage: CountStage },
    Done,
}

/// An in-progress homing or calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSession {
    kind: SessionKind,
    phase: Phase,
}

impl CalibrationSession {
    /// Begin a session, taking over both axes
    pub fn start<D: StepperDriver>(kind: SessionKind, state: &mut ClockState<D>) -> Self {
        info!("calibration session {:?} started", kind);
        state.report.begin();
        for axis in state.axes.iter_mut() {
            axis.enable_outputs();
        }

        let phase = if kind.measures_baseline() {
            state.report.enter(
                CalibrationPhase::ClearingSensors,
                Some(5),
                "Clearing Sensors...",
            );
            for axis in state.axes.iter_mut() {
                axis.set_max_speed(HOMING_MAX_SPEED);
                axis.move_relative(CLEARING_STEPS);
            }
            Phase::Clearing
        } else {
            Self::begin_centering(state)
        };
        Self { kind, phase }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Advance the session; returns true once it has finished
    pub fn poll<D, B>(&mut self, state: &mut ClockState<D>, board: &mut B, now_us: u64) -> bool
    where
        D: StepperDriver,
        B: SensorBank + DelayNs + ControlLink,
    {
        self.phase = match self.phase {
            Phase::Clearing => {
                let mut running = false;
                for axis in state.axes.iter_mut() {
                    running |= axis.step(now_us);
                }
                if running {
                    Phase::Clearing
                } else {
                    state.report.enter(
                        CalibrationPhase::MeasuringBaseline,
                        Some(10),
                        "Measuring Baseline...",
                    );
                    Phase::Baseline {
                        taken: 0,
                        sums: PerAxis::default(),
                    }
                }
            }
            Phase::Baseline { taken, sums } => self.measure_baseline(state, board, taken, sums),
            Phase::Centering(mut pass) => {
                let channels = state.channels();
                match pass.poll(&mut state.axes, &channels, board, now_us) {
                    Some(outcome) => self.after_centering(state, outcome),
                    None => Phase::Centering(pass),
                }
            }
            Phase::Counting { axis, stage } => self.count(state, board, axis, stage, now_us),
            Phase::Done => Phase::Done,
        };
        self.is_finished()
    }

    fn measure_baseline<D, B>(
        &self,
        state: &mut ClockState<D>,
        board: &mut B,
        mut taken: u16,
        mut sums: PerAxis<u32>,
    ) -> Phase
    where
        D: StepperDriver,
        B: SensorBank + DelayNs + ControlLink,
    {
        let batch = BASELINE_SAMPLES_PER_POLL.min(BASELINE_SAMPLES - taken);
        for _ in 0..batch {
            for id in AxisId::ALL {
                *sums.get_mut(id) += u32::from(board.read_raw(id));
            }
            board.delay_ms(BASELINE_SAMPLE_SPACING_MS);
        }
        taken += batch;
        if taken < BASELINE_SAMPLES {
            return Phase::Baseline { taken, sums };
        }

        let baseline = sums.map(|sum| (sum / u32::from(BASELINE_SAMPLES)) as u16);
        info!(
            "baselines measured: H {} M {}",
            baseline.hours,
            baseline.minutes
        );
        state.calibration.baseline = baseline;
        state.calibration.update_crc();
        board.save(SaveRequest::Calibration(state.calibration));
        Self::begin_centering(state)
    }

    fn begin_centering<D: StepperDriver>(state: &mut ClockState<D>) -> Phase {
        state
            .report
            .enter(CalibrationPhase::CenteringHome, None, "Centering on Home...");
        Phase::Centering(HomingPass::start(&mut state.axes))
    }

    fn after_centering<D: StepperDriver>(
        &self,
        state: &mut ClockState<D>,
        outcome: PerAxis<CenterOutcome>,
    ) -> Phase {
        info!(
            "homed: magnet spans H {} M {}",
            outcome.hours.width(),
            outcome.minutes.width()
        );
        if self.kind == SessionKind::Full {
            return Self::begin_counting(state, AxisId::Minutes);
        }

        state.report.enter(
            CalibrationPhase::Complete,
            Some(100),
            "Homed & Centered",
        );
        self.finish(state);
        Phase::Done
    }

    fn begin_counting<D: StepperDriver>(state: &mut ClockState<D>, id: AxisId) -> Phase {
        let (phase, progress, status) = match id {
            AxisId::Minutes => (
                CalibrationPhase::CountingMinuteSteps,
                50,
                "Counting M Steps (2 Turns)...",
            ),
            AxisId::Hours => (
                CalibrationPhase::CountingHourSteps,
                80,
                "Counting H Steps (2 Turns)...",
            ),
        };
        state.report.enter(phase, Some(progress), status);

        let axis = state.axes.get_mut(id);
        axis.set_current_position(0);
        axis.set_max_speed(HOMING_MAX_SPEED);
        axis.move_relative(COUNTING_MOVE_STEPS);
        Phase::Counting {
            axis: id,
            stage: CountStage::BlindZone,
        }
    }

    fn count<D, B>(
        &self,
        state: &mut ClockState<D>,
        board: &mut B,
        id: AxisId,
        stage: CountStage,
        now_us: u64,
    ) -> Phase
    where
        D: StepperDriver,
        B: SensorBank + DelayNs + ControlLink,
    {
        let channel = state.channel(id);
        let axis = state.axes.get_mut(id);
        let stage = match stage {
            CountStage::BlindZone => {
                axis.step(now_us);
                if axis.position() >= BLIND_ZONE_STEPS {
                    CountStage::Seeking
                } else {
                    CountStage::BlindZone
                }
            }
            CountStage::Seeking => {
                axis.step(now_us);
                if axis.distance_to_go() == 0 {
                    warn!("{:?}: no magnet within the counting move", id);
                    *state.report.results.get_mut(id) = MeasureResult::NotFound;
                    state.report.record_failure(id);
                    return self.next_count(state, id);
                }
                if channel.detect(board, id) {
                    axis.stop();
                    CountStage::Centering(MagnetSearch::from_edge(id, axis))
                } else {
                    CountStage::Seeking
                }
            }
            CountStage::Centering(mut search) => {
                match search.poll(axis, &channel, board, now_us) {
                    Some(outcome) => {
                        self.record_measurement(state, board, id, outcome.center());
                        return self.next_count(state, id);
                    }
                    None => CountStage::Centering(search),
                }
            }
        };
        Phase::Counting { axis: id, stage }
    }

    fn record_measurement<D, B>(
        &self,
        state: &mut ClockState<D>,
        board: &mut B,
        id: AxisId,
        travelled: i64,
    ) where
        D: StepperDriver,
        B: ControlLink,
    {
        let result = evaluate_measurement(travelled);
        *state.report.results.get_mut(id) = result;
        match result {
            MeasureResult::Accepted(steps) => {
                info!("{:?}: {} steps per revolution", id, steps);
                state.axes.get_mut(id).set_steps_per_revolution(steps);
                *state.calibration.steps_per_revolution.get_mut(id) = steps;
                state.calibration.update_crc();
                board.save(SaveRequest::Calibration(state.calibration));
            }
            _ => {
                warn!("{:?}: measurement {} rejected", id, travelled);
                state.report.record_failure(id);
            }
        }
    }

    fn next_count<D: StepperDriver>(&self, state: &mut ClockState<D>, done: AxisId) -> Phase {
        match done {
            AxisId::Minutes => Self::begin_counting(state, AxisId::Hours),
            AxisId::Hours => {
                let steps = state.calibration.steps_per_revolution;
                state.report.finish_full(steps);
                self.finish(state);
                Phase::Done
            }
        }
    }

    /// Hand the axes back to the scheduler at home
    fn finish<D: StepperDriver>(&self, state: &mut ClockState<D>) {
        state.restore_motion_profile();
        state.displayed = PerAxis::splat(Some(0));
        info!("calibration session {:?} finished", self.kind);
    }
}
