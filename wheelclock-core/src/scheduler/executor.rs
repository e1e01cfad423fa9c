//! Cooperative tick scheduler
//!
//! Call [`Scheduler::tick`] as often as possible. Every tick runs the hot
//! path (at most one step per wheel, or one poll of the active session).
//! Every [`LOGIC_INTERVAL_US`] it also runs the cold path: drain commands,
//! feed the watchdog, refresh the indicator LEDs and arbitrate the display
//! mode.

use crate::calibration::{CalibrationSession, SessionKind};
use crate::config::ClockSettings;
use crate::control::{Command, CommandError, Reply, SaveRequest};
use crate::motion::steps_to_target;
use crate::state::{AxisId, ClockState};
use crate::traits::{Board, IndicatorFrame, StepperDriver};

/// Minimum spacing between cold-path runs
pub const LOGIC_INTERVAL_US: u64 = 50_000;

/// Idle time before the coils are released in power-saver mode
pub const IDLE_POWER_OFF_MS: u64 = 2_000;

/// Colon LED toggles this often
pub const COLON_TOGGLE_MS: u64 = 500;

/// Highest value either wheel can show, exclusive
const DISPLAY_VALUES: u8 = 60;

/// Owns the active session and the cold-path timers
#[derive(Debug, Default)]
pub struct Scheduler {
    session: Option<CalibrationSession>,
    last_logic_us: Option<u64>,
    last_move_ms: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The running homing or calibration session, if any
    pub fn session(&self) -> Option<&CalibrationSession> {
        self.session.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_some()
    }

    /// Start a homing or calibration session
    ///
    /// Only one session runs at a time; a second request is refused.
    pub fn start_session<D: StepperDriver>(
        &mut self,
        kind: SessionKind,
        state: &mut ClockState<D>,
    ) -> Result<(), CommandError> {
        if self.is_busy() {
            return Err(CommandError::SessionActive);
        }
        self.session = Some(CalibrationSession::start(kind, state));
        Ok(())
    }

    /// Run one scheduler iteration at monotonic time `now_us`
    pub fn tick<D, B>(&mut self, state: &mut ClockState<D>, board: &mut B, now_us: u64)
    where
        D: StepperDriver,
        B: Board,
    {
        let now_ms = now_us / 1_000;

        // Hot path
        if let Some(session) = self.session.as_mut() {
            if session.poll(state, board, now_us) {
                self.session = None;
                state.schedule.mark_homed(board.unix_time());
                self.last_move_ms = now_ms;
            }
        } else {
            for axis in state.axes.iter_mut() {
                axis.step(now_us);
            }
        }

        // Cold path
        if let Some(last) = self.last_logic_us {
            if now_us.saturating_sub(last) < LOGIC_INTERVAL_US {
                return;
            }
        }
        self.last_logic_us = Some(now_us);

        while let Some(command) = board.poll_command() {
            let reply = self.handle_command(command, state, board);
            board.reply(reply);
        }
        board.feed();
        self.refresh_indicators(state, board, now_ms);

        if self.session.is_none() {
            self.arbitrate(state, board, now_ms);
        }
    }

    fn handle_command<D, B>(
        &mut self,
        command: Command,
        state: &mut ClockState<D>,
        board: &mut B,
    ) -> Reply
    where
        D: StepperDriver,
        B: Board,
    {
        debug!("command: {:?}", command);
        match command {
            Command::SetManual { hour, minute } => {
                if hour >= DISPLAY_VALUES || minute >= DISPLAY_VALUES {
                    return Reply::Rejected(CommandError::InvalidTarget);
                }
                state.schedule.set_manual(hour, minute);
                Reply::Ack
            }
            Command::ResumeAuto => {
                state.schedule.resume_auto();
                Reply::Ack
            }
            Command::CalibrateSensors => self.start_session(SessionKind::SensorsOnly, state).into(),
            Command::CalibrateFull => self.start_session(SessionKind::Full, state).into(),
            Command::ResetCalibration => self.reset_calibration(state, board).into(),
            Command::ApplySettings(settings) => self.apply_settings(settings, state, board).into(),
            Command::QueryStatus => Reply::Status(state.status(board)),
            Command::QueryCalibration => Reply::Calibration(state.report.clone()),
        }
    }

    fn reset_calibration<D, B>(
        &mut self,
        state: &mut ClockState<D>,
        board: &mut B,
    ) -> Result<(), CommandError>
    where
        D: StepperDriver,
        B: Board,
    {
        if self.is_busy() {
            return Err(CommandError::SessionActive);
        }
        info!("step counts reset to nominal");
        state.reset_step_counts();
        board.save(SaveRequest::Calibration(state.calibration));
        self.start_session(SessionKind::Homing, state)
    }

    fn apply_settings<D, B>(
        &mut self,
        settings: ClockSettings,
        state: &mut ClockState<D>,
        board: &mut B,
    ) -> Result<(), CommandError>
    where
        D: StepperDriver,
        B: Board,
    {
        // Speed changes mid-session would be overwritten when it finishes
        if self.is_busy() {
            return Err(CommandError::SessionActive);
        }
        settings.validate()?;
        board.save(SaveRequest::Settings(settings.clone()));
        state.apply_settings(settings);
        Ok(())
    }

    fn refresh_indicators<D, B>(&self, state: &ClockState<D>, board: &mut B, now_ms: u64)
    where
        D: StepperDriver,
        B: Board,
    {
        let leds = &state.settings.leds;
        let pm = board.wall_time().is_some_and(|wall| wall.hour >= 12);
        let frame = IndicatorFrame {
            status: leds.status.level(self.is_busy()),
            colon: leds.colon.level((now_ms / COLON_TOGGLE_MS) % 2 == 1),
            pm: leds.pm.level(pm),
            aux: leds.aux.level(true),
        };
        board.show(&frame);
    }

    fn arbitrate<D, B>(&mut self, state: &mut ClockState<D>, board: &mut B, now_ms: u64)
    where
        D: StepperDriver,
        B: Board,
    {
        if !state.is_idle() {
            self.last_move_ms = now_ms;
            return;
        }

        if state
            .schedule
            .auto_home_due(state.settings.auto_home_interval_s(), board.unix_time())
        {
            info!("auto-home interval elapsed");
            if let Err(err) = self.start_session(SessionKind::Homing, state) {
                warn!("auto-home not started: {:?}", err);
            }
            return;
        }

        let wall = board.wall_time();
        if let Some(wall) = wall {
            if state.settings.night.contains(wall.hour) {
                for axis in state.axes.iter_mut() {
                    axis.disable_outputs();
                }
                return;
            }
        }

        if state.displayed.iter().any(Option::is_none) {
            // Not homed yet
            return;
        }

        if let Some(targets) = state.schedule.targets(&state.settings, wall, now_ms) {
            for id in [AxisId::Minutes, AxisId::Hours] {
                let target = *targets.get(id);
                if *state.displayed.get(id) == Some(target) {
                    continue;
                }
                let axis = state.axes.get_mut(id);
                let delta = steps_to_target(axis.position(), axis.steps_per_revolution(), target);
                if state.settings.power_saver || !axis.outputs_enabled() {
                    axis.enable_outputs();
                }
                axis.move_relative(delta);
                *state.displayed.get_mut(id) = Some(target);
                self.last_move_ms = now_ms;
                debug!("{:?} -> {} ({} steps)", id, target, delta);
            }
        }

        if !state.is_idle() {
            self.last_move_ms = now_ms;
        } else if state.settings.power_saver
            && now_ms.saturating_sub(self.last_move_ms) > IDLE_POWER_OFF_MS
        {
            for axis in state.axes.iter_mut() {
                axis.disable_outputs();
            }
        } else if !state.settings.power_saver {
            // Holding torque after night mode released the coils
            for axis in state.axes.iter_mut() {
                if !axis.outputs_enabled() {
                    axis.enable_outputs();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationPhase;
    use crate::config::CalibrationData;
    use crate::motion::steps_to_target;
    use crate::scheduler::DisplayMode;
    use crate::sim::{SimBoard, SimCoils};
    use crate::state::PerAxis;

    struct Rig {
        board: SimBoard,
        state: ClockState<SimCoils>,
        scheduler: Scheduler,
    }

    impl Rig {
        fn new(settings: ClockSettings) -> Self {
            let board = SimBoard::new();
            board.hours.set_magnet(0, 40);
            board.minutes.set_magnet(0, 40);
            let state = ClockState::new(
                board.hours.coils(),
                board.minutes.coils(),
                settings,
                CalibrationData::new(),
            );
            Self {
                board,
                state,
                scheduler: Scheduler::new(),
            }
        }

        /// Home at boot and run until the wheels rest at zero
        fn homed(settings: ClockSettings) -> Self {
            let mut rig = Self::new(settings);
            rig.scheduler
                .start_session(SessionKind::Homing, &mut rig.state)
                .unwrap();
            rig.run_while(|rig| rig.scheduler.is_busy());
            rig
        }

        fn tick(&mut self) {
            let now = self.board.now_us();
            self.scheduler.tick(&mut self.state, &mut self.board, now);
            self.board.advance_us(250);
        }

        fn run_while(&mut self, mut cond: impl FnMut(&Self) -> bool) {
            for _ in 0..2_000_000 {
                if !cond(self) {
                    return;
                }
                self.tick();
            }
            panic!("condition never cleared");
        }

        /// Run for `ms` of virtual time
        fn run_for_ms(&mut self, ms: u64) {
            let end = self.board.now_us() + ms * 1_000;
            self.run_while(|rig| rig.board.now_us() < end);
        }
    }

    #[test]
    fn test_homing_then_follow_clock() {
        let mut rig = Rig::homed(ClockSettings::default());
        assert_eq!(rig.state.displayed(), PerAxis::splat(Some(0)));
        let home = PerAxis::new(rig.board.hours.physical(), rig.board.minutes.physical());

        rig.board.set_time(3, 1);
        rig.run_for_ms(2_000);

        assert_eq!(rig.state.displayed(), PerAxis::new(Some(3), Some(1)));
        // 3 h: 102.4 -> 102 -> 104; 1 min: 34.13 -> 34 -> 36
        assert_eq!(rig.board.hours.physical() - home.hours, 104);
        assert_eq!(rig.board.minutes.physical() - home.minutes, 36);
    }

    #[test]
    fn test_minute_rollover_moves_forward() {
        let mut rig = Rig::homed(ClockSettings::default());
        let start = rig.board.minutes.physical();
        rig.board.set_time(0, 59);
        rig.run_for_ms(5_000);
        rig.board.set_time(1, 0);
        rig.run_for_ms(2_000);
        assert_eq!(rig.board.minutes.physical() - start, 2016 + 32);
    }

    #[test]
    fn test_time_unavailable_is_a_no_op() {
        let mut rig = Rig::homed(ClockSettings::default());
        let before = rig.board.minutes.physical();
        rig.run_for_ms(1_000);
        assert_eq!(rig.board.minutes.physical(), before);
        assert_eq!(rig.state.displayed(), PerAxis::splat(Some(0)));
    }

    #[test]
    fn test_manual_override_and_resume() {
        let mut rig = Rig::homed(ClockSettings::default());
        rig.board.set_time(10, 0);
        rig.board.commands.push_back(Command::SetManual { hour: 5, minute: 30 });
        rig.run_for_ms(3_000);
        assert_eq!(rig.state.displayed(), PerAxis::new(Some(5), Some(30)));
        assert_eq!(rig.state.schedule().mode(), DisplayMode::ManualOverride { hour: 5, minute: 30 });

        rig.board.commands.push_back(Command::ResumeAuto);
        rig.run_for_ms(3_000);
        assert_eq!(rig.state.displayed(), PerAxis::new(Some(10), Some(0)));
        assert_eq!(rig.board.replies, vec![Reply::Ack, Reply::Ack]);
    }

    #[test]
    fn test_manual_target_out_of_range() {
        let mut rig = Rig::homed(ClockSettings::default());
        rig.board.commands.push_back(Command::SetManual { hour: 60, minute: 0 });
        rig.run_for_ms(100);
        assert_eq!(
            rig.board.replies,
            vec![Reply::Rejected(CommandError::InvalidTarget)]
        );
    }

    #[test]
    fn test_night_mode_releases_coils() {
        let mut settings = ClockSettings::default();
        settings.night.enabled = true;
        let mut rig = Rig::homed(settings);
        rig.board.set_time(23, 15);
        let before = rig.board.minutes.physical();
        rig.run_for_ms(1_000);

        assert_eq!(rig.board.minutes.physical(), before);
        assert!(!rig.board.hours.enabled());
        assert!(!rig.board.minutes.enabled());

        // Morning: the wheels catch up and hold again
        rig.board.set_time(7, 0);
        rig.run_for_ms(3_000);
        assert_eq!(rig.state.displayed(), PerAxis::new(Some(7), Some(0)));
        assert!(rig.board.hours.enabled());
    }

    #[test]
    fn test_power_saver_releases_after_idle() {
        let mut settings = ClockSettings::default();
        settings.power_saver = true;
        let mut rig = Rig::homed(settings);
        rig.board.set_time(0, 1);
        rig.run_for_ms(1_000);
        assert!(rig.board.minutes.enabled());
        rig.run_for_ms(2_500);
        assert!(!rig.board.minutes.enabled());
        assert!(!rig.board.hours.enabled());
    }

    #[test]
    fn test_concurrent_calibration_is_refused() {
        let mut rig = Rig::homed(ClockSettings::default());
        rig.board.commands.push_back(Command::CalibrateSensors);
        rig.board.commands.push_back(Command::CalibrateFull);
        rig.tick();
        rig.run_for_ms(60);
        assert_eq!(
            rig.board.replies,
            vec![Reply::Ack, Reply::Rejected(CommandError::SessionActive)]
        );
        assert_eq!(rig.scheduler.session().map(|s| s.kind()), Some(SessionKind::SensorsOnly));
    }

    #[test]
    fn test_session_feeds_watchdog_and_lights_status() {
        let mut rig = Rig::new(ClockSettings::default());
        rig.scheduler
            .start_session(SessionKind::SensorsOnly, &mut rig.state)
            .unwrap();
        rig.run_for_ms(500);
        assert!(rig.scheduler.is_busy());
        assert!(rig.board.feeds >= 5);
        assert_eq!(rig.board.frame.map(|f| f.status), Some(255));

        rig.run_while(|rig| rig.scheduler.is_busy());
        rig.run_for_ms(100);
        assert_eq!(rig.board.frame.map(|f| f.status), Some(0));
        assert_eq!(rig.state.report().phase, CalibrationPhase::Complete);
    }

    #[test]
    fn test_apply_settings_validates_and_persists() {
        let mut rig = Rig::homed(ClockSettings::default());
        let mut bad = ClockSettings::default();
        bad.sensitivity = 0;
        let mut good = ClockSettings::default();
        good.max_speed = 800;
        rig.board.commands.push_back(Command::ApplySettings(bad));
        rig.board.commands.push_back(Command::ApplySettings(good.clone()));
        rig.run_for_ms(100);

        assert_eq!(rig.board.replies.len(), 2);
        assert!(matches!(rig.board.replies[0], Reply::Rejected(CommandError::Settings(_))));
        assert_eq!(rig.board.replies[1], Reply::Ack);
        assert_eq!(rig.board.saves, vec![SaveRequest::Settings(good)]);
        assert_eq!(rig.state.axis(AxisId::Hours).max_speed(), 800.0);
    }

    #[test]
    fn test_reset_calibration_rehomes() {
        let mut rig = Rig::homed(ClockSettings::default());
        rig.state.calibration.steps_per_revolution.minutes = 2050;
        rig.board.commands.push_back(Command::ResetCalibration);
        rig.run_for_ms(100);
        assert!(rig.scheduler.is_busy());
        assert_eq!(rig.state.calibration().steps_per_revolution.minutes, 2048);
        assert!(matches!(rig.board.saves.as_slice(), [SaveRequest::Calibration(_)]));
    }

    #[test]
    fn test_auto_home_runs_after_interval() {
        let mut settings = ClockSettings::default();
        settings.auto_home_hours = 1;
        let mut rig = Rig::homed(settings);
        rig.board.set_time(12, 0);
        rig.run_for_ms(2_000);
        let started = rig.state.schedule().last_home_unix();
        assert!(started.is_some());
        assert!(!rig.scheduler.is_busy());

        rig.board.unix = started.map(|t| t + 3600);
        rig.run_for_ms(60);
        assert_eq!(rig.scheduler.session().map(|s| s.kind()), Some(SessionKind::Homing));

        // The auto-home pass owns the wheels until it finishes
        rig.board.commands.push_back(Command::CalibrateFull);
        rig.run_for_ms(60);
        assert_eq!(
            rig.board.replies.last(),
            Some(&Reply::Rejected(CommandError::SessionActive))
        );
        assert_eq!(rig.scheduler.session().map(|s| s.kind()), Some(SessionKind::Homing));
    }

    #[test]
    fn test_colon_blinks() {
        let mut rig = Rig::homed(ClockSettings::default());
        let mut seen = std::collections::HashSet::new();
        for _ in 0..6 {
            rig.run_for_ms(250);
            seen.insert(rig.board.frame.map(|f| f.colon));
        }
        assert!(seen.contains(&Some(0)));
        assert!(seen.contains(&Some(255)));
    }

    #[test]
    fn test_target_matches_axis_math() {
        // The scheduler must command exactly what the target math says
        let mut rig = Rig::homed(ClockSettings::default());
        rig.board.set_time(0, 17);
        let expected = steps_to_target(0, 2048, 17);
        rig.run_for_ms(3_000);
        assert_eq!(rig.state.axis(AxisId::Minutes).position(), expected);
    }
}
