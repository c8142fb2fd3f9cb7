//! Time-zone service: IANA zone resolution and zoned wall-clock arithmetic
//!
//! All conversions are explicit. A civil day is never walked by adding
//! 86 400 000 ms to an instant; day arithmetic happens on calendar dates and
//! is re-anchored at the zoned midnight, which keeps DST transition days
//! correct.

use crate::types::Instant;
use chrono::{
    Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TimeError {
    #[error("Unknown time zone: {0}")]
    InvalidZone(String),

    #[error("Invalid wall-clock value: {0}")]
    InvalidWallClock(String),
}

pub type TimeResult<T> = Result<T, TimeError>;

/// Validate and parse an IANA zone id.
pub fn parse_zone(id: &str) -> TimeResult<Tz> {
    id.parse::<Tz>()
        .map_err(|_| TimeError::InvalidZone(id.to_string()))
}

/// Offset of `zone` from UTC at the given instant, in minutes.
/// Positive means the zone is ahead of UTC.
pub fn offset_minutes(zone: Tz, at: Instant) -> i32 {
    zone.offset_from_utc_datetime(&at.naive_utc())
        .fix()
        .local_minus_utc()
        / 60
}

/// Convert a zoned wall-clock tuple to the unique instant whose projection
/// in `zone` equals the tuple.
///
/// DST fall-back ambiguities resolve to the later instant; spring-forward
/// gaps resolve by shifting the wall clock forward by the offset
/// discontinuity.
pub fn zoned_instant(
    zone: Tz,
    y: i32,
    m: u32,
    d: u32,
    hh: u32,
    mm: u32,
    ss: u32,
) -> TimeResult<Instant> {
    let date = NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| TimeError::InvalidWallClock(format!("{y:04}-{m:02}-{d:02}")))?;
    let naive = date
        .and_hms_opt(hh, mm, ss)
        .ok_or_else(|| TimeError::InvalidWallClock(format!("{hh:02}:{mm:02}:{ss:02}")))?;
    resolve_local(zone, naive)
}

/// [`zoned_instant`] for an already-assembled naive wall-clock value.
pub fn zoned_from_naive(zone: Tz, naive: NaiveDateTime) -> TimeResult<Instant> {
    resolve_local(zone, naive)
}

fn resolve_local(zone: Tz, naive: NaiveDateTime) -> TimeResult<Instant> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, later) => Ok(later.with_timezone(&Utc)),
        LocalResult::None => {
            // Inside a spring-forward gap: measure the discontinuity from
            // instants on either side of the transition and shift the wall
            // clock past it. Sampling a day out keeps both probes clear of
            // the gap in any zone, east or west of UTC.
            let off_before = zone
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix()
                .local_minus_utc();
            let off_after = zone
                .offset_from_utc_datetime(&(naive + Duration::days(1)))
                .fix()
                .local_minus_utc();
            let gap = Duration::seconds(i64::from(off_after - off_before).max(0));
            match zone.from_local_datetime(&(naive + gap)) {
                LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
                LocalResult::Ambiguous(_, later) => Ok(later.with_timezone(&Utc)),
                LocalResult::None => Err(TimeError::InvalidWallClock(naive.to_string())),
            }
        }
    }
}

/// Civil date of an instant as seen in `zone`.
pub fn civil_date(t: Instant, zone: Tz) -> NaiveDate {
    t.with_timezone(&zone).date_naive()
}

/// Day of week of an instant as seen in `zone`.
pub fn day_of_week(t: Instant, zone: Tz) -> Weekday {
    civil_date(t, zone).weekday()
}

/// The instant of midnight on `date` in `zone`.
pub fn at_zoned_midnight(date: NaiveDate, zone: Tz) -> TimeResult<Instant> {
    // Midnight itself can fall inside a DST gap in some zones; the gap rule
    // of `zoned_instant` applies.
    resolve_local(zone, date.and_hms_opt(0, 0, 0).expect("00:00:00 is valid"))
}

/// Walk `delta` civil days from `date`.
pub fn walk_days(date: NaiveDate, delta: i64) -> TimeResult<NaiveDate> {
    date.checked_add_signed(Duration::days(delta))
        .ok_or_else(|| TimeError::InvalidWallClock(format!("{date} {delta:+} days")))
}

/// Midnight of the civil day `delta` days after the day containing `t`.
pub fn shift_days(t: Instant, delta: i64, zone: Tz) -> TimeResult<Instant> {
    let date = walk_days(civil_date(t, zone), delta)?;
    at_zoned_midnight(date, zone)
}
