//! Clock control loop
//!
//! Owns the clock state and the scheduler. Each pass runs one scheduler
//! tick and then yields, so the serial and flash tasks get the executor
//! between steps without ever delaying one.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::Output;
use embassy_time::Instant;

use wheelclock_core::calibration::SessionKind;
use wheelclock_core::scheduler::Scheduler;
use wheelclock_core::state::ClockState;
use wheelclock_drivers::stepper::Uln2003;

use crate::board::BoardIo;

/// Coil driver type for both wheels
pub type Coils = Uln2003<Output<'static>>;

#[embassy_executor::task]
pub async fn control_task(mut state: ClockState<Coils>, mut board: BoardIo) {
    info!("Control task started");

    let mut scheduler = Scheduler::new();

    // Position is unknown after reset
    if let Err(e) = scheduler.start_session(SessionKind::Homing, &mut state) {
        warn!("Boot homing not started: {:?}", e);
    }

    loop {
        let now_us = Instant::now().as_micros();
        scheduler.tick(&mut state, &mut board, now_us);
        yield_now().await;
    }
}
