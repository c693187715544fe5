//! Day-count to completion-timestamp conversion.
//!
//! Stamps are anchored to the moment staff enter the value, never to the
//! request's creation time. Nothing here re-derives a stamp from elapsed time.

use chrono::{DateTime, Duration, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;
const MILLIS_PER_DAY: i64 = SECONDS_PER_DAY * 1_000;

/// `now + days`. `None` only when the result leaves chrono's representable range.
pub fn estimate_time(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    let offset = Duration::try_days(days)?;
    now.checked_add_signed(offset)
}

/// Whole days from `now` until `estimate_time`, rounded up.
///
/// Past stamps produce zero or a negative count.
pub fn days_until(now: DateTime<Utc>, estimate_time: DateTime<Utc>) -> i64 {
    let millis = estimate_time.signed_duration_since(now).num_milliseconds();
    let whole = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        whole + 1
    } else {
        whole
    }
}
