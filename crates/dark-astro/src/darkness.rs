//! Full-darkness scan for an astronomical night
//!
//! Walks the astronomical night in 5-minute steps and collects the spans
//! where the moon's geometric altitude is below the horizon. Darkness is
//! binary here; moonlight mitigation by phase is out of scope.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::julian::DEG;
use crate::Ephemeris;
use dark_core::{total_minutes, Interval, NightRecord};

const STEP_MINUTES: i64 = 5;

/// Moon-free darkness for one night.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DarknessReport {
    /// Sorted, disjoint `[start, end)` spans of full darkness.
    pub intervals: Vec<Interval>,
    /// Rounded sum of the interval lengths.
    pub total_minutes: i64,
}

/// Compute the moon-free darkness spans of a night's astronomical night.
///
/// The scan covers `[astr_start, astr_end]` inclusive at both ends; an
/// interval still open at the last sample is closed at `astr_end`, so no
/// span extends past the astronomical night. Nights without a proper
/// astronomical night (polar twilight, midnight sun) yield an empty report.
pub fn compute_darkness(
    record: &NightRecord,
    lat_deg: f64,
    lon_deg: f64,
    ephemeris: &dyn Ephemeris,
) -> DarknessReport {
    let Some((start, end)) = record.astro_night() else {
        return DarknessReport::default();
    };

    let lat = lat_deg * DEG;
    let mut intervals = Vec::new();
    let mut open_since = None;

    let mut t = start;
    loop {
        let eq = ephemeris.moon_equatorial(t);
        let lst = ephemeris.local_sidereal_time(t, lon_deg);
        let hour_angle = lst - eq.ra;
        let sin_alt = lat.sin() * eq.dec.sin() + lat.cos() * eq.dec.cos() * hour_angle.cos();

        if sin_alt < 0.0 {
            open_since.get_or_insert(t);
        } else if let Some(s) = open_since.take() {
            intervals.push(Interval::new(s, t));
        }

        if t >= end {
            break;
        }
        t = (t + Duration::minutes(STEP_MINUTES)).min(end);
    }

    if let Some(s) = open_since {
        intervals.push(Interval::new(s, end));
    }

    let total = total_minutes(&intervals);
    DarknessReport {
        intervals,
        total_minutes: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CivilDayEvents;
    use crate::Equatorial;
    use chrono::{NaiveDate, TimeZone, Utc};
    use dark_core::{is_sorted_disjoint, Instant};

    /// Moon altitude follows a fixed schedule: below the horizon exactly
    /// when the hour-of-day (UTC) is inside one of the configured ranges.
    struct ScheduleEphemeris {
        down_hours: Vec<(f64, f64)>,
    }

    impl Ephemeris for ScheduleEphemeris {
        fn events_for_civil_day(&self, _: Instant, _: f64, _: f64) -> CivilDayEvents {
            CivilDayEvents::default()
        }

        fn moon_equatorial(&self, at: Instant) -> Equatorial {
            let hour = at.timestamp() as f64 % 86_400.0 / 3_600.0;
            let down = self
                .down_hours
                .iter()
                .any(|&(a, b)| hour >= a && hour < b);
            // Observed from the pole, sin(alt) == sin(dec).
            let dec = if down { -0.5 } else { 0.5 };
            Equatorial { ra: 0.0, dec }
        }

        fn local_sidereal_time(&self, _: Instant, _: f64) -> f64 {
            0.0
        }
    }

    fn record(start: Instant, end: Instant) -> NightRecord {
        NightRecord {
            date: NaiveDate::from_ymd_opt(2025, 12, 21).unwrap(),
            mid0: start,
            mid1: end,
            sunset: None,
            sunrise: None,
            astr_start: Some(start),
            astr_end: Some(end),
            moon_rises: vec![],
            moon_sets: vec![],
            moon_always_above: false,
            moon_always_below: false,
            sun_always_above: false,
            sun_always_below: false,
        }
    }

    fn at(d: u32, h: u32, m: u32) -> Instant {
        Utc.with_ymd_and_hms(2025, 12, d, h, m, 0).unwrap()
    }

    #[test]
    fn moon_down_all_night_gives_one_full_interval() {
        let ephem = ScheduleEphemeris {
            down_hours: vec![(0.0, 24.0)],
        };
        let rec = record(at(21, 18, 0), at(22, 6, 0));
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert_eq!(report.intervals.len(), 1);
        assert_eq!(report.intervals[0].start, at(21, 18, 0));
        assert_eq!(report.intervals[0].end, at(22, 6, 0));
        assert_eq!(report.total_minutes, 12 * 60);
    }

    #[test]
    fn moon_up_all_night_gives_empty_report() {
        let ephem = ScheduleEphemeris { down_hours: vec![] };
        let rec = record(at(21, 18, 0), at(22, 6, 0));
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert!(report.intervals.is_empty());
        assert_eq!(report.total_minutes, 0);
    }

    #[test]
    fn mid_night_moonrise_splits_nothing_but_truncates() {
        // Moon is down from 18h to 23h, up after.
        let ephem = ScheduleEphemeris {
            down_hours: vec![(18.0, 23.0)],
        };
        let rec = record(at(21, 18, 0), at(22, 6, 0));
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert_eq!(report.intervals.len(), 1);
        assert_eq!(report.intervals[0].start, at(21, 18, 0));
        assert_eq!(report.intervals[0].end, at(21, 23, 0));
        assert_eq!(report.total_minutes, 5 * 60);
    }

    #[test]
    fn moon_set_and_later_rise_gives_two_intervals() {
        // Up 18-20h, down 20-2h, up after: dark span is 20h to 02h.
        let ephem = ScheduleEphemeris {
            down_hours: vec![(20.0, 24.0), (0.0, 2.0)],
        };
        let rec = record(at(21, 18, 0), at(22, 6, 0));
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert_eq!(report.intervals.len(), 1);
        assert_eq!(report.intervals[0].start, at(21, 20, 0));
        assert_eq!(report.intervals[0].end, at(22, 2, 0));
        assert!(is_sorted_disjoint(&report.intervals));
    }

    #[test]
    fn open_interval_closes_at_astr_end() {
        // Down from 22h onward; still down when the scan ends.
        let ephem = ScheduleEphemeris {
            down_hours: vec![(22.0, 24.0), (0.0, 12.0)],
        };
        let rec = record(at(21, 18, 0), at(22, 6, 0));
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert_eq!(report.intervals.last().unwrap().end, at(22, 6, 0));
    }

    #[test]
    fn night_without_astro_darkness_is_empty() {
        let mut rec = record(at(21, 18, 0), at(22, 6, 0));
        rec.astr_start = None;
        let ephem = ScheduleEphemeris {
            down_hours: vec![(0.0, 24.0)],
        };
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert!(report.intervals.is_empty());
    }

    #[test]
    fn ragged_end_is_clamped_to_astr_end() {
        // Scan length not a multiple of 5 minutes.
        let ephem = ScheduleEphemeris {
            down_hours: vec![(0.0, 24.0)],
        };
        let rec = record(at(21, 18, 0), at(21, 23, 57));
        let report = compute_darkness(&rec, 90.0, 0.0, &ephem);
        assert_eq!(report.intervals[0].end, at(21, 23, 57));
        assert_eq!(report.total_minutes, 357);
    }
}
