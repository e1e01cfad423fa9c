//! Watchdog trait

/// Hardware watchdog that resets the board when not fed
pub trait Watchdog {
    /// Reset the watchdog countdown
    fn feed(&mut self);
}
