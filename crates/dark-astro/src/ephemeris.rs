//! Meeus-based implementation of the [`Ephemeris`] trait

use chrono::Duration;

use crate::events::{scan_day, CivilDayEvents, MoonEvents, RiseSet, SunEvents};
use crate::julian::{local_sidereal_time, DEG};
use crate::{lunar, solar, Ephemeris, Equatorial};
use dark_core::Instant;

/// Standard altitude of the sun's centre at rise/set: −50 arcminutes,
/// covering refraction and the solar semidiameter.
const SUN_H0_DEG: f64 = -50.0 / 60.0;

/// Astronomical twilight threshold.
const TWILIGHT_ASTRO_DEG: f64 = -18.0;

/// Standard altitude of the moon at rise/set: +8 arcminutes, the net of
/// refraction against the large lunar parallax.
const MOON_H0_DEG: f64 = 8.0 / 60.0;

/// Sine of the altitude of a body with equatorial coordinates `eq` seen from
/// latitude `lat_deg` at local sidereal time `lst` (radians).
fn sin_altitude(eq: Equatorial, lat_deg: f64, lst: f64) -> f64 {
    let lat = lat_deg * DEG;
    let hour_angle = lst - eq.ra;
    lat.sin() * eq.dec.sin() + lat.cos() * eq.dec.cos() * hour_angle.cos()
}

/// Ephemeris backed by the truncated Meeus series in [`solar`] and [`lunar`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MeeusEphemeris;

impl MeeusEphemeris {
    pub fn new() -> Self {
        Self
    }

    fn instant_at(&self, midnight: Instant, hours: f64) -> Instant {
        midnight + Duration::milliseconds((hours * 3_600_000.0).round() as i64)
    }
}

impl Ephemeris for MeeusEphemeris {
    fn events_for_civil_day(
        &self,
        midnight: Instant,
        lat_deg: f64,
        lon_deg: f64,
    ) -> CivilDayEvents {
        let sun_alt = |hours: f64| {
            let at = self.instant_at(midnight, hours);
            let lst = local_sidereal_time(at, lon_deg);
            sin_altitude(solar::sun_equatorial(at), lat_deg, lst)
        };
        let moon_alt = |hours: f64| {
            let at = self.instant_at(midnight, hours);
            let lst = local_sidereal_time(at, lon_deg);
            sin_altitude(lunar::moon_equatorial(at), lat_deg, lst)
        };

        let sun_day = scan_day(&sun_alt, (SUN_H0_DEG * DEG).sin());
        let twilight = scan_day(&sun_alt, (TWILIGHT_ASTRO_DEG * DEG).sin());
        let moon_day = scan_day(&moon_alt, (MOON_H0_DEG * DEG).sin());

        CivilDayEvents {
            sun: SunEvents {
                day: sun_day,
                twilight_astro: RiseSet {
                    rise: twilight.rise,
                    set: twilight.set,
                },
            },
            moon: MoonEvents { day: moon_day },
        }
    }

    fn moon_equatorial(&self, at: Instant) -> Equatorial {
        lunar::moon_equatorial(at)
    }

    fn local_sidereal_time(&self, at: Instant, lon_deg: f64) -> f64 {
        local_sidereal_time(at, lon_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const MUNICH_LAT: f64 = 48.137;
    const MUNICH_LON: f64 = 11.575;

    fn munich_winter_events() -> CivilDayEvents {
        // Civil day 2025-12-21 in Europe/Berlin starts at 23:00 UTC the
        // evening before.
        let midnight = Utc.with_ymd_and_hms(2025, 12, 20, 23, 0, 0).unwrap();
        MeeusEphemeris::new().events_for_civil_day(midnight, MUNICH_LAT, MUNICH_LON)
    }

    #[test]
    fn munich_winter_solstice_sun_events() {
        let events = munich_winter_events();
        let rise = events.sun.day.rise.expect("sunrise");
        let set = events.sun.day.set.expect("sunset");
        // Local wall clock: sunrise about 08:03, sunset about 16:23.
        assert!((rise - 8.05).abs() < 0.25, "rise {rise}");
        assert!((set - 16.38).abs() < 0.25, "set {set}");
    }

    #[test]
    fn munich_winter_solstice_twilight_brackets_sun() {
        let events = munich_winter_events();
        let twilight = events.sun.twilight_astro;
        let t_end = twilight.rise.expect("morning twilight end");
        let t_start = twilight.set.expect("evening twilight start");
        assert!(t_end < events.sun.day.rise.unwrap());
        assert!(t_start > events.sun.day.set.unwrap());
        // Astronomical twilight runs roughly two hours past sunset here.
        assert!((t_start - events.sun.day.set.unwrap() - 2.0).abs() < 0.5);
    }

    #[test]
    fn equator_sunrise_near_six() {
        let midnight = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
        let events = MeeusEphemeris::new().events_for_civil_day(midnight, 0.0, 0.0);
        let rise = events.sun.day.rise.expect("sunrise");
        assert!((rise - 6.0).abs() < 0.3, "rise {rise}");
    }

    #[test]
    fn svalbard_polar_night() {
        // Longyearbyen in late December: the sun never rises.
        let midnight = Utc.with_ymd_and_hms(2025, 12, 20, 23, 0, 0).unwrap();
        let events = MeeusEphemeris::new().events_for_civil_day(midnight, 78.22, 15.65);
        assert!(events.sun.day.always_below);
        assert!(events.sun.day.rise.is_none() && events.sun.day.set.is_none());
    }

    #[test]
    fn svalbard_midnight_sun() {
        let midnight = Utc.with_ymd_and_hms(2025, 6, 20, 22, 0, 0).unwrap();
        let events = MeeusEphemeris::new().events_for_civil_day(midnight, 78.22, 15.65);
        assert!(events.sun.day.always_above);
    }

    #[test]
    fn moon_events_present_on_ordinary_day() {
        let events = munich_winter_events();
        assert!(
            events.moon.day.rise.is_some() || events.moon.day.set.is_some(),
            "moon neither rises nor sets"
        );
    }
}
