//! Wall-clock time source trait

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Broken-down local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WallTime {
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// 0-23
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallTime {
    /// Short date label such as "Jan 18"
    pub fn date_label(&self) -> heapless::String<8> {
        use core::fmt::Write;

        let mut label = heapless::String::new();
        let month = MONTH_ABBREVIATIONS
            .get(usize::from(self.month).wrapping_sub(1))
            .copied()
            .unwrap_or("???");
        // 3 + 1 + 2 digits always fits in 8 bytes
        let _ = write!(label, "{} {}", month, self.day);
        label
    }
}

/// Source of local wall-clock time
///
/// Both methods return `None` until the time has been set.
pub trait TimeSource {
    /// Current local time
    fn wall_time(&mut self) -> Option<WallTime>;

    /// Current Unix time in seconds (UTC)
    fn unix_time(&mut self) -> Option<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_label() {
        let t = WallTime {
            year: 2025,
            month: 1,
            day: 18,
            hour: 9,
            minute: 30,
            second: 0,
        };
        assert_eq!(t.date_label().as_str(), "Jan 18");

        let bad = WallTime { month: 0, ..t };
        assert_eq!(bad.date_label().as_str(), "??? 18");
    }
}
