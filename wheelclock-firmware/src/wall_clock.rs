//! Wall-clock time kept against the monotonic timer
//!
//! The host sets the time over the serial link; between updates the clock
//! free-runs on `embassy_time::Instant`. Until the first update every read
//! returns `None`.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;
use time::{OffsetDateTime, UtcOffset};

use wheelclock_core::traits::WallTime;

/// A Unix time pinned to a monotonic instant
#[derive(Debug, Clone, Copy)]
struct Anchor {
    unix_seconds: u64,
    at: Instant,
    utc_offset_minutes: i16,
}

static ANCHOR: Mutex<CriticalSectionRawMutex, Cell<Option<Anchor>>> = Mutex::new(Cell::new(None));

/// Set the current UTC time and local offset
pub fn set(unix_seconds: u64, utc_offset_minutes: i16) {
    let anchor = Anchor {
        unix_seconds,
        at: Instant::now(),
        utc_offset_minutes,
    };
    ANCHOR.lock(|cell| cell.set(Some(anchor)));
}

/// Seconds since the Unix epoch, UTC
pub fn unix_now() -> Option<u64> {
    let anchor = ANCHOR.lock(Cell::get)?;
    Some(anchor.unix_seconds.saturating_add(anchor.at.elapsed().as_secs()))
}

/// Current local time broken down for display
pub fn local_now() -> Option<WallTime> {
    let anchor = ANCHOR.lock(Cell::get)?;
    let unix = anchor.unix_seconds.saturating_add(anchor.at.elapsed().as_secs());
    local_time(unix, anchor.utc_offset_minutes)
}

/// Break a Unix time down at a fixed UTC offset
fn local_time(unix_seconds: u64, utc_offset_minutes: i16) -> Option<WallTime> {
    let utc = OffsetDateTime::from_unix_timestamp(i64::try_from(unix_seconds).ok()?).ok()?;
    let offset = UtcOffset::from_whole_seconds(i32::from(utc_offset_minutes) * 60).ok()?;
    let local = utc.to_offset(offset);

    Some(WallTime {
        year: u16::try_from(local.year()).ok()?,
        month: u8::from(local.month()),
        day: local.day(),
        hour: local.hour(),
        minute: local.minute(),
        second: local.second(),
    })
}
