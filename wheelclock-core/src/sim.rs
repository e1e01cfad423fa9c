//! Simulated board for host tests
//!
//! Each [`SimWheel`] tracks the physical step count of one wheel and where
//! its magnet sits. [`SimBoard`] reads the sensors from those wheels, keeps
//! virtual time (delays advance it), and records everything the core
//! sends out.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::control::{Command, Reply, SaveRequest};
use crate::state::AxisId;
use crate::traits::{
    ControlLink, Direction, IndicatorFrame, Indicators, SensorBank, StepperDriver, TimeSource,
    WallTime, Watchdog,
};

#[derive(Debug)]
struct WheelModel {
    axis: AxisId,
    physical: Cell<i64>,
    enabled: Cell<bool>,
    steps_per_revolution: Cell<i64>,
    magnet_start: Cell<i64>,
    magnet_width: Cell<i64>,
}

/// Shared handle to one simulated wheel
#[derive(Debug, Clone)]
pub struct SimWheel(Rc<WheelModel>);

impl SimWheel {
    pub fn new(axis: AxisId) -> Self {
        Self(Rc::new(WheelModel {
            axis,
            physical: Cell::new(0),
            enabled: Cell::new(false),
            steps_per_revolution: Cell::new(2048),
            magnet_start: Cell::new(1000),
            magnet_width: Cell::new(40),
        }))
    }

    pub fn axis(&self) -> AxisId {
        self.0.axis
    }

    /// Coil driver that moves this wheel
    pub fn coils(&self) -> SimCoils {
        SimCoils(self.clone())
    }

    pub fn physical(&self) -> i64 {
        self.0.physical.get()
    }

    pub fn enabled(&self) -> bool {
        self.0.enabled.get()
    }

    pub fn set_magnet(&self, start: i64, width: i64) {
        self.0.magnet_start.set(start);
        self.0.magnet_width.set(width);
    }

    pub fn set_steps_per_revolution(&self, steps: i64) {
        self.0.steps_per_revolution.set(steps);
    }

    /// Physical step count at the middle of the magnet, first revolution
    pub fn magnet_middle(&self) -> i64 {
        self.0.magnet_start.get() + self.0.magnet_width.get() / 2
    }

    pub fn magnet_present(&self) -> bool {
        let rev = self.0.steps_per_revolution.get();
        let phase = self.physical().rem_euclid(rev);
        let start = self.0.magnet_start.get();
        phase >= start && phase < start + self.0.magnet_width.get()
    }
}

/// [`StepperDriver`] backed by a [`SimWheel`]
#[derive(Debug)]
pub struct SimCoils(SimWheel);

impl StepperDriver for SimCoils {
    fn step(&mut self, direction: Direction) {
        let model = &self.0 .0;
        model.enabled.set(true);
        let delta = match direction {
            Direction::Forward => 1,
            Direction::Backward => -1,
        };
        model.physical.set(model.physical.get() + delta);
    }

    fn enable(&mut self, enabled: bool) {
        self.0 .0.enabled.set(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.0 .0.enabled.get()
    }
}

/// Everything except the stepper drivers
#[derive(Debug)]
pub struct SimBoard {
    pub hours: SimWheel,
    pub minutes: SimWheel,
    now_us: u64,
    /// Raw reading with no magnet
    pub baseline: u16,
    /// Offset added while a magnet is under the sensor
    pub magnet_offset: u16,
    pub wall: Option<WallTime>,
    pub unix: Option<u64>,
    pub commands: VecDeque<Command>,
    pub replies: Vec<Reply>,
    pub saves: Vec<SaveRequest>,
    pub feeds: u32,
    pub frame: Option<IndicatorFrame>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self {
            hours: SimWheel::new(AxisId::Hours),
            minutes: SimWheel::new(AxisId::Minutes),
            now_us: 1_000,
            baseline: 1800,
            magnet_offset: 1200,
            wall: None,
            unix: None,
            commands: VecDeque::new(),
            replies: Vec::new(),
            saves: Vec::new(),
            feeds: 0,
            frame: None,
        }
    }

    pub fn wheel(&self, axis: AxisId) -> &SimWheel {
        match axis {
            AxisId::Hours => &self.hours,
            AxisId::Minutes => &self.minutes,
        }
    }

    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    pub fn advance_us(&mut self, us: u64) {
        self.now_us += us;
    }

    /// Set the local clock; Unix time follows a fixed, plausible epoch
    pub fn set_time(&mut self, hour: u8, minute: u8) {
        self.wall = Some(WallTime {
            year: 2025,
            month: 1,
            day: 18,
            hour,
            minute,
            second: 0,
        });
        let base = self.unix.unwrap_or(1_737_158_400);
        self.unix = Some(base);
    }
}

impl SensorBank for SimBoard {
    fn read_raw(&mut self, axis: AxisId) -> u16 {
        if self.wheel(axis).magnet_present() {
            self.baseline + self.magnet_offset
        } else {
            self.baseline
        }
    }
}

impl DelayNs for SimBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.now_us += u64::from(ns / 1_000);
    }
}

impl TimeSource for SimBoard {
    fn wall_time(&mut self) -> Option<WallTime> {
        self.wall
    }

    fn unix_time(&mut self) -> Option<u64> {
        self.unix
    }
}

impl Watchdog for SimBoard {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

impl Indicators for SimBoard {
    fn show(&mut self, frame: &IndicatorFrame) {
        self.frame = Some(*frame);
    }
}

impl ControlLink for SimBoard {
    fn poll_command(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    fn reply(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    fn save(&mut self, request: SaveRequest) {
        self.saves.push(request);
    }
}
