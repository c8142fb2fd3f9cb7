//! Low-precision solar position (Meeus ch. 25)

use crate::julian::{julian_century, julian_date, normalize_degrees, DEG};
use crate::Equatorial;
use dark_core::Instant;

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

pub(crate) fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    sun_mean_longitude(t) + sun_equation_of_center(t) - 0.00569 - 0.00478 * (omega * DEG).sin()
}

pub(crate) fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

pub(crate) fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * (omega * DEG).cos()
}

/// Apparent equatorial coordinates of the sun, in radians.
pub fn sun_equatorial(at: Instant) -> Equatorial {
    let t = julian_century(julian_date(at));
    let lambda = sun_apparent_longitude(t) * DEG;
    let eps = obliquity_corrected(t) * DEG;

    let ra = (eps.cos() * lambda.sin()).atan2(lambda.cos());
    let dec = (eps.sin() * lambda.sin()).asin();
    Equatorial { ra, dec }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn declination_near_zero_at_equinox() {
        let t = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        let eq = sun_equatorial(t);
        assert!(eq.dec.abs() / DEG < 0.3, "dec {}", eq.dec / DEG);
    }

    #[test]
    fn declination_peaks_at_june_solstice() {
        let t = Utc.with_ymd_and_hms(2025, 6, 21, 3, 0, 0).unwrap();
        let eq = sun_equatorial(t);
        assert!((eq.dec / DEG - 23.44).abs() < 0.1, "dec {}", eq.dec / DEG);
    }

    #[test]
    fn declination_bottoms_at_december_solstice() {
        let t = Utc.with_ymd_and_hms(2025, 12, 21, 15, 0, 0).unwrap();
        let eq = sun_equatorial(t);
        assert!((eq.dec / DEG + 23.44).abs() < 0.1, "dec {}", eq.dec / DEG);
    }
}
