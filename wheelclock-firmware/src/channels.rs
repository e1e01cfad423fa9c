//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! The control loop only ever uses the non-blocking `try_*` side so a slow
//! serial link or flash write can never stall the steppers.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use wheelclock_core::control::{Command, Reply, SaveRequest};

/// Commands queued between two cold-path passes
const COMMAND_CHANNEL_SIZE: usize = 4;

const REPLY_CHANNEL_SIZE: usize = 4;

/// A full calibration issues three saves back to back
const SAVE_CHANNEL_SIZE: usize = 4;

/// Commands parsed by the link RX task, drained by the control loop
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Replies from the control loop, sent by the link TX task
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, Reply, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Persistence requests from the control loop
pub static SAVE_CHANNEL: Channel<CriticalSectionRawMutex, SaveRequest, SAVE_CHANNEL_SIZE> =
    Channel::new();

/// Signal that a heartbeat (PING) was received from the host
pub static HEARTBEAT_RECEIVED: Signal<CriticalSectionRawMutex, ()> = Signal::new();
