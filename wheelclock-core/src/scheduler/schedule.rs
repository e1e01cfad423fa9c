//! Display mode arbitration
//!
//! Decides what the wheels should show: the wall clock, a manual
//! override, or periodically the month and day. Also tracks when the
//! wheels were last homed for the auto-home interval.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{ClockSettings, DateDisplay};
use crate::state::PerAxis;
use crate::traits::WallTime;

/// Unix times at or below this are treated as "clock not synced yet"
pub const PLAUSIBLE_UNIX_TIME: u64 = 1_600_000_000;

/// What the wheels are following
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayMode {
    /// Hour and minute from the wall clock
    #[default]
    AutoClock,
    /// Fixed values set from the control surface
    ManualOverride { hour: u8, minute: u8 },
    /// Month on the hour wheel, day on the minute wheel
    DateDisplay,
}

/// Mode plus the timers that drive mode changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplaySchedule {
    mode: DisplayMode,
    /// When the date display last started or ended
    date_changed_ms: u64,
    last_home_unix: Option<u64>,
}

impl DisplaySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_manual(&mut self, hour: u8, minute: u8) {
        self.mode = DisplayMode::ManualOverride { hour, minute };
    }

    pub fn resume_auto(&mut self) {
        self.mode = DisplayMode::AutoClock;
    }

    /// Start or end the date display when its timer runs out
    ///
    /// Has no effect under a manual override.
    pub fn update_date_window(&mut self, date: &DateDisplay, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.date_changed_ms);
        match self.mode {
            DisplayMode::AutoClock if date.enabled && elapsed >= date.interval_ms() => {
                self.mode = DisplayMode::DateDisplay;
                self.date_changed_ms = now_ms;
            }
            DisplayMode::DateDisplay if elapsed >= date.duration_ms() => {
                self.mode = DisplayMode::AutoClock;
                self.date_changed_ms = now_ms;
            }
            _ => {}
        }
    }

    /// Values the wheels should show right now
    ///
    /// `None` means there is nothing to show yet (time not set).
    pub fn targets(
        &mut self,
        settings: &ClockSettings,
        wall: Option<WallTime>,
        now_ms: u64,
    ) -> Option<PerAxis<u8>> {
        if let DisplayMode::ManualOverride { hour, minute } = self.mode {
            return Some(PerAxis::new(hour, minute));
        }

        self.update_date_window(&settings.date_display, now_ms);
        let wall = wall?;
        match self.mode {
            DisplayMode::DateDisplay => Some(PerAxis::new(wall.month, wall.day)),
            _ => Some(PerAxis::new(
                settings.hour_format.display_hour(wall.hour),
                wall.minute,
            )),
        }
    }

    /// Whether the auto-home interval has elapsed
    ///
    /// The interval starts the first time a plausible Unix time is seen.
    pub fn auto_home_due(&mut self, interval_s: Option<u64>, unix: Option<u64>) -> bool {
        let (Some(interval), Some(now)) = (interval_s, plausible(unix)) else {
            return false;
        };
        match self.last_home_unix {
            None => {
                self.last_home_unix = Some(now);
                false
            }
            Some(last) => now.saturating_sub(last) >= interval,
        }
    }

    /// Restart the auto-home interval
    pub fn mark_homed(&mut self, unix: Option<u64>) {
        if let Some(now) = plausible(unix) {
            self.last_home_unix = Some(now);
        }
    }

    pub fn last_home_unix(&self) -> Option<u64> {
        self.last_home_unix
    }
}

fn plausible(unix: Option<u64>) -> Option<u64> {
    unix.filter(|t| *t > PLAUSIBLE_UNIX_TIME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HourFormat;

    fn wall(hour: u8, minute: u8) -> WallTime {
        WallTime {
            year: 2025,
            month: 1,
            day: 18,
            hour,
            minute,
            second: 0,
        }
    }

    #[test]
    fn test_auto_clock_targets() {
        let mut schedule = DisplaySchedule::new();
        let settings = ClockSettings::default();
        assert_eq!(
            schedule.targets(&settings, Some(wall(14, 5)), 0),
            Some(PerAxis::new(14, 5))
        );
    }

    #[test]
    fn test_twelve_hour_targets() {
        let mut schedule = DisplaySchedule::new();
        let mut settings = ClockSettings::default();
        settings.hour_format = HourFormat::TwelveHour;
        assert_eq!(
            schedule.targets(&settings, Some(wall(0, 0)), 0),
            Some(PerAxis::new(12, 0))
        );
        assert_eq!(
            schedule.targets(&settings, Some(wall(15, 30)), 0),
            Some(PerAxis::new(3, 30))
        );
    }

    #[test]
    fn test_no_time_no_targets() {
        let mut schedule = DisplaySchedule::new();
        let settings = ClockSettings::default();
        assert_eq!(schedule.targets(&settings, None, 0), None);
    }

    #[test]
    fn test_manual_override_ignores_time() {
        let mut schedule = DisplaySchedule::new();
        let settings = ClockSettings::default();
        schedule.set_manual(7, 45);
        assert_eq!(schedule.targets(&settings, None, 0), Some(PerAxis::new(7, 45)));
        schedule.resume_auto();
        assert_eq!(schedule.mode(), DisplayMode::AutoClock);
    }

    #[test]
    fn test_date_display_cycle() {
        let mut schedule = DisplaySchedule::new();
        let mut settings = ClockSettings::default();
        settings.date_display.enabled = true;
        settings.date_display.interval_minutes = 1;
        settings.date_display.duration_seconds = 5;
        let now = Some(wall(10, 20));

        // Interval has not elapsed yet at t = 30 s
        assert_eq!(schedule.targets(&settings, now, 30_000), Some(PerAxis::new(10, 20)));
        // At 60 s the date comes up: January 18th
        assert_eq!(schedule.targets(&settings, now, 60_000), Some(PerAxis::new(1, 18)));
        assert_eq!(schedule.mode(), DisplayMode::DateDisplay);
        assert_eq!(schedule.targets(&settings, now, 64_000), Some(PerAxis::new(1, 18)));
        // Back to the time after 5 s, and the interval restarts from there
        assert_eq!(schedule.targets(&settings, now, 65_000), Some(PerAxis::new(10, 20)));
        assert_eq!(schedule.targets(&settings, now, 120_000), Some(PerAxis::new(10, 20)));
        assert_eq!(schedule.targets(&settings, now, 125_000), Some(PerAxis::new(1, 18)));
    }

    #[test]
    fn test_date_display_disabled() {
        let mut schedule = DisplaySchedule::new();
        let settings = ClockSettings::default();
        schedule.targets(&settings, Some(wall(1, 2)), 10 * 60_000);
        assert_eq!(schedule.mode(), DisplayMode::AutoClock);
    }

    #[test]
    fn test_auto_home_interval() {
        let mut schedule = DisplaySchedule::new();
        let t0 = 1_737_158_400;

        // Disabled, or no plausible time yet
        assert!(!schedule.auto_home_due(None, Some(t0)));
        assert!(!schedule.auto_home_due(Some(3600), Some(1_000)));
        assert_eq!(schedule.last_home_unix(), None);

        // First plausible time starts the interval
        assert!(!schedule.auto_home_due(Some(3600), Some(t0)));
        assert!(!schedule.auto_home_due(Some(3600), Some(t0 + 3599)));
        assert!(schedule.auto_home_due(Some(3600), Some(t0 + 3600)));

        schedule.mark_homed(Some(t0 + 3600));
        assert!(!schedule.auto_home_due(Some(3600), Some(t0 + 3601)));
    }
}
