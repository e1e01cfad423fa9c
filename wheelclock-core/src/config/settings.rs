//! User settings
//!
//! Everything the control surface can change. Stored in flash as a single
//! postcard record and re-applied on boot.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current settings format version
pub const SETTINGS_VERSION: u8 = 1;

/// Maximum POSIX TZ string length
pub const MAX_TZ_LEN: usize = 48;

/// Default POSIX TZ rule (US Eastern)
pub const DEFAULT_TIMEZONE: &str = "EST5EDT,M3.2.0,M11.1.0";

/// Accepted range for the wheel speed ceiling, steps per second
pub const MAX_SPEED_RANGE: core::ops::RangeInclusive<u16> = 100..=2000;

/// Accepted range for sensor sensitivity
pub const SENSITIVITY_RANGE: core::ops::RangeInclusive<u8> = 1..=100;

/// Errors from validating a settings update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SettingsError {
    /// Speed ceiling outside [`MAX_SPEED_RANGE`]
    SpeedOutOfRange,
    /// Sensitivity outside [`SENSITIVITY_RANGE`]
    SensitivityOutOfRange,
    /// Night window hour not in 0-23
    InvalidHour,
    /// Date display interval or duration of zero
    InvalidDateTiming,
    /// Auto-home interval over one week
    InvalidHomeInterval,
}

/// How the hour wheel renders the hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HourFormat {
    #[default]
    TwentyFourHour,
    TwelveHour,
}

impl HourFormat {
    /// Map a 0-23 hour onto the value shown on the hour wheel
    ///
    /// Twelve-hour mode shows 12 for both midnight and noon.
    pub fn display_hour(self, hour: u8) -> u8 {
        match self {
            HourFormat::TwentyFourHour => hour,
            HourFormat::TwelveHour => match hour % 12 {
                0 => 12,
                h => h,
            },
        }
    }
}

/// Quiet hours during which both wheels are released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NightWindow {
    pub enabled: bool,
    /// First quiet hour (0-23)
    pub start_hour: u8,
    /// First hour after the quiet period (0-23)
    pub end_hour: u8,
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 22,
            end_hour: 7,
        }
    }
}

impl NightWindow {
    /// Whether `hour` (0-23) falls inside the window
    ///
    /// A start later than the end wraps past midnight. Equal start and end
    /// is an empty window.
    pub fn contains(&self, hour: u8) -> bool {
        if !self.enabled {
            return false;
        }
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

/// Periodic month/day display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateDisplay {
    pub enabled: bool,
    /// Time between date displays
    pub interval_minutes: u16,
    /// How long the date stays up
    pub duration_seconds: u16,
}

impl Default for DateDisplay {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: 5,
            duration_seconds: 5,
        }
    }
}

impl DateDisplay {
    pub fn interval_ms(&self) -> u64 {
        u64::from(self.interval_minutes) * 60_000
    }

    pub fn duration_ms(&self) -> u64 {
        u64::from(self.duration_seconds) * 1_000
    }
}

/// One indicator LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedSetting {
    pub enabled: bool,
    pub brightness: u8,
}

impl Default for LedSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            brightness: 255,
        }
    }
}

impl LedSetting {
    /// Output level for a lit/unlit LED under this setting
    pub fn level(&self, lit: bool) -> u8 {
        if self.enabled && lit {
            self.brightness
        } else {
            0
        }
    }
}

/// All four indicator LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedSettings {
    pub status: LedSetting,
    pub colon: LedSetting,
    pub pm: LedSetting,
    pub aux: LedSetting,
}

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockSettings {
    /// Format version for migration
    pub version: u8,
    pub hour_format: HourFormat,
    /// POSIX TZ rule, kept for the control surface's time sync
    pub timezone: String<MAX_TZ_LEN>,
    /// Wheel speed ceiling in steps per second
    pub max_speed: u16,
    /// Hall sensor sensitivity, 1 (least) to 100 (most)
    pub sensitivity: u8,
    /// Release the coils when the wheels are idle
    pub power_saver: bool,
    pub night: NightWindow,
    pub date_display: DateDisplay,
    /// Hours between automatic re-homing; 0 disables
    pub auto_home_hours: u8,
    pub leds: LedSettings,
}

impl Default for ClockSettings {
    fn default() -> Self {
        let mut timezone = String::new();
        let _ = timezone.push_str(DEFAULT_TIMEZONE);
        Self {
            version: SETTINGS_VERSION,
            hour_format: HourFormat::default(),
            timezone,
            max_speed: 1000,
            sensitivity: 50,
            power_saver: false,
            night: NightWindow::default(),
            date_display: DateDisplay::default(),
            auto_home_hours: 0,
            leds: LedSettings::default(),
        }
    }
}

impl ClockSettings {
    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !MAX_SPEED_RANGE.contains(&self.max_speed) {
            return Err(SettingsError::SpeedOutOfRange);
        }
        if !SENSITIVITY_RANGE.contains(&self.sensitivity) {
            return Err(SettingsError::SensitivityOutOfRange);
        }
        if self.night.start_hour > 23 || self.night.end_hour > 23 {
            return Err(SettingsError::InvalidHour);
        }
        if self.date_display.interval_minutes == 0 || self.date_display.duration_seconds == 0 {
            return Err(SettingsError::InvalidDateTiming);
        }
        if self.auto_home_hours > 168 {
            return Err(SettingsError::InvalidHomeInterval);
        }
        Ok(())
    }

    /// Auto-home interval in seconds, `None` when disabled
    pub fn auto_home_interval_s(&self) -> Option<u64> {
        match self.auto_home_hours {
            0 => None,
            h => Some(u64::from(h) * 3600),
        }
    }
}
