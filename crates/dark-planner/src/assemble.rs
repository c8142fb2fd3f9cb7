//! Night assembly: joining two civil days of events into one night record

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;

use dark_astro::{DayEvents, Ephemeris};
use dark_core::{timezone, Instant, Location, NightRecord};

use crate::PlanResult;

fn hours_after(midnight: Instant, hours: f64) -> Instant {
    midnight + Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Build the night record for base date `date` at `location`.
///
/// The night spans the evening of `date` and the morning of the next civil
/// day, so sun events come from day D's midnight (sunset, twilight start)
/// and day D+1's midnight (sunrise, twilight end). Moon events from both
/// days are kept when they fall inside `[sunset, sunrise]`, day D first,
/// then sorted by instant.
pub fn assemble_night(
    date: NaiveDate,
    location: &Location,
    zone: Tz,
    ephemeris: &dyn Ephemeris,
) -> PlanResult<NightRecord> {
    let mid0 = timezone::at_zoned_midnight(date, zone)?;
    let next = timezone::walk_days(date, 1)?;
    let mid1 = timezone::at_zoned_midnight(next, zone)?;

    let day0 = ephemeris.events_for_civil_day(mid0, location.lat, location.lon);
    let day1 = ephemeris.events_for_civil_day(mid1, location.lat, location.lon);

    let sunset = day0.sun.day.set.map(|h| hours_after(mid0, h));
    let sunrise = day1.sun.day.rise.map(|h| hours_after(mid1, h));
    let astr_start = day0.sun.twilight_astro.set.map(|h| hours_after(mid0, h));
    let astr_end = day1.sun.twilight_astro.rise.map(|h| hours_after(mid1, h));

    let mut moon_rises = Vec::new();
    let mut moon_sets = Vec::new();
    for (midnight, day) in [(mid0, &day0.moon.day), (mid1, &day1.moon.day)] {
        collect_in_night(day, midnight, sunset, sunrise, &mut moon_rises, &mut moon_sets);
    }
    moon_rises.sort();
    moon_sets.sort();

    Ok(NightRecord {
        date,
        mid0,
        mid1,
        sunset,
        sunrise,
        astr_start,
        astr_end,
        moon_rises,
        moon_sets,
        moon_always_above: day0.moon.day.always_above || day1.moon.day.always_above,
        moon_always_below: day0.moon.day.always_below || day1.moon.day.always_below,
        sun_always_above: day0.sun.day.always_above || day1.sun.day.always_above,
        sun_always_below: day0.sun.day.always_below || day1.sun.day.always_below,
    })
}

fn collect_in_night(
    day: &DayEvents,
    midnight: Instant,
    sunset: Option<Instant>,
    sunrise: Option<Instant>,
    rises: &mut Vec<Instant>,
    sets: &mut Vec<Instant>,
) {
    let (Some(night_start), Some(night_end)) = (sunset, sunrise) else {
        return;
    };
    let in_night = |t: Instant| t >= night_start && t <= night_end;

    if let Some(h) = day.rise {
        let t = hours_after(midnight, h);
        if in_night(t) {
            rises.push(t);
        }
    }
    if let Some(h) = day.set {
        let t = hours_after(midnight, h);
        if in_night(t) {
            sets.push(t);
        }
    }
}
