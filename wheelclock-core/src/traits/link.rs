//! Control link trait
//!
//! The control surface (serial link, web UI, etc.) is outside the core.
//! The scheduler polls it for commands on the cold path and pushes
//! replies and persistence requests back without blocking.

use crate::control::{Command, Reply, SaveRequest};

/// Non-blocking command/reply channel to the outside world
pub trait ControlLink {
    /// Take the next pending command, if any
    fn poll_command(&mut self) -> Option<Command>;

    /// Send the reply for the most recently polled command
    fn reply(&mut self, reply: Reply);

    /// Queue a write of settings or calibration to persistent storage
    fn save(&mut self, request: SaveRequest);
}
