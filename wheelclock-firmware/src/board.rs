//! Board adapter for the scheduler
//!
//! Bundles the peripherals the scheduler talks to on every cold-path pass
//! behind the core traits. The two coil drivers live in `ClockState`.

use defmt::*;
use embassy_rp::pwm::PwmOutput;
use embassy_rp::watchdog::Watchdog as RpWatchdog;
use embassy_time::Delay;
use embedded_hal::delay::DelayNs;

use wheelclock_core::control::{Command, Reply, SaveRequest};
use wheelclock_core::state::AxisId;
use wheelclock_core::traits::{
    ControlLink, IndicatorFrame, Indicators, SensorBank, TimeSource, WallTime, Watchdog,
};
use wheelclock_drivers::indicator::LedBank;
use wheelclock_drivers::sensor::HallSensors;
use wheelclock_hal_rp2040::adc::BlockingAdc;

use crate::channels::{COMMAND_CHANNEL, REPLY_CHANNEL, SAVE_CHANNEL};
use crate::wall_clock;

pub struct BoardIo {
    pub sensors: HallSensors<BlockingAdc<'static>>,
    pub leds: LedBank<PwmOutput<'static>>,
    pub watchdog: RpWatchdog,
    pub delay: Delay,
}

impl SensorBank for BoardIo {
    fn read_raw(&mut self, axis: AxisId) -> u16 {
        self.sensors.read_raw(axis)
    }
}

impl TimeSource for BoardIo {
    fn wall_time(&mut self) -> Option<WallTime> {
        wall_clock::local_now()
    }

    fn unix_time(&mut self) -> Option<u64> {
        wall_clock::unix_now()
    }
}

impl Watchdog for BoardIo {
    fn feed(&mut self) {
        self.watchdog.feed();
    }
}

impl Indicators for BoardIo {
    fn show(&mut self, frame: &IndicatorFrame) {
        self.leds.show(frame);
    }
}

impl ControlLink for BoardIo {
    fn poll_command(&mut self) -> Option<Command> {
        COMMAND_CHANNEL.try_receive().ok()
    }

    fn reply(&mut self, reply: Reply) {
        if REPLY_CHANNEL.try_send(reply).is_err() {
            warn!("Reply channel full, dropping reply");
        }
    }

    fn save(&mut self, request: SaveRequest) {
        if SAVE_CHANNEL.try_send(request).is_err() {
            error!("Save channel full, change will not be persisted");
        }
    }
}

impl DelayNs for BoardIo {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
