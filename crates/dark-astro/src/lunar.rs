//! Lunar position and phase (Meeus ch. 47/48, truncated series)
//!
//! The top periodic terms of tables 47.A/47.B give roughly 0.3° accuracy,
//! comfortably inside the 5-minute darkness sampling grid.

use crate::julian::{julian_century, julian_date, normalize_degrees, DEG};
use crate::solar::obliquity_corrected;
use crate::Equatorial;
use dark_core::Instant;
use serde::{Deserialize, Serialize};

pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;

// Longitude/distance terms (D, M, Mp, F, coeff_l, coeff_r);
// coeff_l in 1e-6 degrees, coeff_r in 1e-3 km.
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0, -20905355.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0, -3699111.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0, -2955968.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0, -569925.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0, 48888.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0, -3149.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0, 246158.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0, -152138.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0, -170733.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0, -204586.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0, -129620.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0, 108743.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0, 104755.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0, 10321.0),
    (0.0, 0.0, 1.0, 2.0, -12528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10980.0, 79661.0),
    (4.0, 0.0, -1.0, 0.0, 10675.0, -34782.0),
    (0.0, 0.0, 3.0, 0.0, 10034.0, -23210.0),
    (4.0, 0.0, -2.0, 0.0, 8548.0, -21636.0),
    (2.0, 1.0, -1.0, 0.0, -7888.0, 24208.0),
];

// Latitude terms (D, M, Mp, F, coeff_b); coeff_b in 1e-6 degrees.
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5128122.0),
    (0.0, 0.0, 1.0, 1.0, 280602.0),
    (0.0, 0.0, 1.0, -1.0, 277693.0),
    (2.0, 0.0, 0.0, -1.0, 173237.0),
    (2.0, 0.0, -1.0, 1.0, 55413.0),
    (2.0, 0.0, -1.0, -1.0, 46271.0),
    (2.0, 0.0, 0.0, 1.0, 32573.0),
    (0.0, 0.0, 2.0, 1.0, 17198.0),
    (2.0, 0.0, 1.0, -1.0, 9266.0),
    (0.0, 0.0, 2.0, -1.0, 8822.0),
    (2.0, -1.0, 0.0, -1.0, 8216.0),
    (2.0, 0.0, -2.0, -1.0, 4324.0),
    (2.0, 0.0, 1.0, 1.0, 4200.0),
    (2.0, 1.0, 0.0, -1.0, -3359.0),
    (2.0, -1.0, -1.0, 1.0, 2463.0),
    (2.0, -1.0, 0.0, 1.0, 2211.0),
    (2.0, -1.0, -1.0, -1.0, 2065.0),
    (0.0, 1.0, -1.0, -1.0, -1870.0),
    (4.0, 0.0, -1.0, -1.0, 1828.0),
    (0.0, 1.0, 0.0, 1.0, -1794.0),
];

fn moon_mean_longitude(t: f64) -> f64 {
    normalize_degrees(
        218.3164477 + 481267.88123421 * t - 0.0015786 * t * t + t * t * t / 538841.0
            - t * t * t * t / 65194000.0,
    )
}

fn moon_mean_elongation(t: f64) -> f64 {
    normalize_degrees(
        297.8501921 + 445267.1114034 * t - 0.0018819 * t * t + t * t * t / 545868.0
            - t * t * t * t / 113065000.0,
    )
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.5291092 + 35999.0502909 * t - 0.0001536 * t * t + t * t * t / 24490000.0)
}

fn moon_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(
        134.9633964 + 477198.8675055 * t + 0.0087414 * t * t + t * t * t / 69699.0
            - t * t * t * t / 14712000.0,
    )
}

fn moon_argument_of_latitude(t: f64) -> f64 {
    normalize_degrees(
        93.2720950 + 483202.0175233 * t - 0.0036539 * t * t - t * t * t / 3526000.0
            + t * t * t * t / 863310000.0,
    )
}

/// Geocentric ecliptic coordinates of the moon:
/// (longitude deg, latitude deg, distance km).
pub(crate) fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let lp = moon_mean_longitude(t);
    let d = moon_mean_elongation(t);
    let m = sun_mean_anomaly(t);
    let mp = moon_mean_anomaly(t);
    let f = moon_argument_of_latitude(t);

    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;
    let e2 = e * e;

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(td, tm, tmp, tf, cl, cr) in &TERMS_LR {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        let e_factor = match tm.abs() as i32 {
            1 => e,
            2 => e2,
            _ => 1.0,
        };
        sum_l += cl * e_factor * arg.sin();
        sum_r += cr * e_factor * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(td, tm, tmp, tf, cb) in &TERMS_B {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        let e_factor = match tm.abs() as i32 {
            1 => e,
            2 => e2,
            _ => 1.0,
        };
        sum_b += cb * e_factor * arg.sin();
    }

    let a1 = normalize_degrees(119.75 + 131.849 * t);
    let a2 = normalize_degrees(53.09 + 479264.290 * t);
    let a3 = normalize_degrees(313.45 + 481266.484 * t);

    sum_l += 3958.0 * (a1 * DEG).sin();
    sum_l += 1962.0 * ((lp - f) * DEG).sin();
    sum_l += 318.0 * (a2 * DEG).sin();

    sum_b += -2235.0 * (lp * DEG).sin();
    sum_b += 382.0 * (a3 * DEG).sin();
    sum_b += 175.0 * ((a1 - f) * DEG).sin();
    sum_b += 175.0 * ((a1 + f) * DEG).sin();
    sum_b += 127.0 * ((lp - mp) * DEG).sin();
    sum_b += -115.0 * ((lp + mp) * DEG).sin();

    let longitude = normalize_degrees(lp + sum_l / 1_000_000.0);
    let latitude = sum_b / 1_000_000.0;
    let distance = 385000.56 + sum_r / 1000.0;
    (longitude, latitude, distance)
}

/// Geocentric equatorial coordinates of the moon, in radians.
pub fn moon_equatorial(at: Instant) -> Equatorial {
    let t = julian_century(julian_date(at));
    let (lon, lat, _dist) = moon_ecliptic(t);
    let eps = obliquity_corrected(t) * DEG;
    let lon_r = lon * DEG;
    let lat_r = lat * DEG;

    let ra = (lon_r.sin() * eps.cos() - lat_r.tan() * eps.sin()).atan2(lon_r.cos());
    let dec = (lat_r.sin() * eps.cos() + lat_r.cos() * eps.sin() * lon_r.sin()).asin();
    Equatorial { ra, dec }
}

/// Enumerated phase name; the UI collaborator localises the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    OldCrescent,
}

impl PhaseName {
    fn from_cycle(p: f64) -> Self {
        if !(0.03..=0.97).contains(&p) {
            PhaseName::NewMoon
        } else if p < 0.22 {
            PhaseName::WaxingCrescent
        } else if p < 0.28 {
            PhaseName::FirstQuarter
        } else if p < 0.47 {
            PhaseName::WaxingGibbous
        } else if p < 0.53 {
            PhaseName::FullMoon
        } else if p < 0.72 {
            PhaseName::WaningGibbous
        } else if p < 0.78 {
            PhaseName::LastQuarter
        } else {
            PhaseName::OldCrescent
        }
    }
}

/// Phase summary for a night's detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPhase {
    /// Fraction of the disc that is lit, 0..1.
    pub illuminated: f64,
    /// Position in the synodic cycle, 0 = new, 0.5 = full.
    pub cycle: f64,
    /// Moon age in days.
    pub age_days: f64,
    pub name: PhaseName,
    pub waxing: bool,
}

/// Moon phase at an instant, from the sun–moon elongation in ecliptic
/// longitude.
pub fn moon_phase(at: Instant) -> MoonPhase {
    let t = julian_century(julian_date(at));
    let (moon_lon, moon_lat, _) = moon_ecliptic(t);
    let sun_lon = crate::solar::sun_apparent_longitude(t);
    let cycle = normalize_degrees(moon_lon - sun_lon) / 360.0;

    // Elongation via spherical geometry; sun ecliptic latitude ~ 0.
    let d_lon = (moon_lon - sun_lon) * DEG;
    let elong = ((moon_lat * DEG).cos() * d_lon.cos()).clamp(-1.0, 1.0).acos();
    let illuminated = (1.0 - elong.cos()) / 2.0;

    MoonPhase {
        illuminated,
        cycle,
        age_days: cycle * SYNODIC_MONTH_DAYS,
        name: PhaseName::from_cycle(cycle),
        waxing: cycle < 0.5,
    }
}
