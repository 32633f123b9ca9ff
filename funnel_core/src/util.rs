//! Small time helpers shared by the drivers and the CLI.

use std::time::Duration;

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `Some(Duration)` from optional milliseconds.
#[inline]
pub fn opt_ms(ms: Option<u64>) -> Option<Duration> {
    ms.map(Duration::from_millis)
}
