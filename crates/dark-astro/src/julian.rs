//! Julian date and sidereal time

use dark_core::Instant;
use std::f64::consts::PI;

pub const DEG: f64 = PI / 180.0;

const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Julian date of an instant (UT).
pub fn julian_date(at: Instant) -> f64 {
    at.timestamp_millis() as f64 / MS_PER_DAY + JD_UNIX_EPOCH
}

/// Julian centuries since J2000.0.
pub fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

pub fn normalize_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

pub fn normalize_radians(rad: f64) -> f64 {
    let mut r = rad % (2.0 * PI);
    if r < 0.0 {
        r += 2.0 * PI;
    }
    r
}

/// Greenwich mean sidereal time at an instant, in radians.
pub fn gmst(at: Instant) -> f64 {
    let jd = julian_date(at);
    let t = julian_century(jd);
    let deg = normalize_degrees(
        280.46061837 + 360.98564736629 * (jd - 2_451_545.0) + 0.000387933 * t * t
            - t * t * t / 38_710_000.0,
    );
    deg * DEG
}

/// Local sidereal time in radians for an instant and east longitude.
pub fn local_sidereal_time(at: Instant, lon_deg: f64) -> f64 {
    normalize_radians(gmst(at) + lon_deg * DEG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn jd_of_j2000() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date(t) - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn gmst_matches_meeus_example_12a() {
        // Meeus example 12.a: 1987 April 10, 0h UT -> GMST 13h10m46.3668s.
        let t = Utc.with_ymd_and_hms(1987, 4, 10, 0, 0, 0).unwrap();
        let expected_deg = (13.0 + 10.0 / 60.0 + 46.3668 / 3600.0) * 15.0;
        let got_deg = gmst(t) / DEG;
        assert!(
            (got_deg - expected_deg).abs() < 0.001,
            "gmst {got_deg} vs {expected_deg}"
        );
    }

    #[test]
    fn lst_adds_longitude() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let g = gmst(t);
        let lst = local_sidereal_time(t, 90.0);
        assert!((normalize_radians(lst - g) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn normalization_wraps_negatives() {
        assert!((normalize_degrees(-30.0) - 330.0).abs() < 1e-12);
        assert!((normalize_radians(-PI) - PI).abs() < 1e-12);
    }
}
