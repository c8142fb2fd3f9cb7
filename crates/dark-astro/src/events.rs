//! Rise/set event search by quadratic interpolation
//!
//! Classic Montenbruck–Pfleger scheme: sample the altitude offset from the
//! event threshold on an hourly grid, fit a parabola through consecutive
//! triples, and read crossings off the parabola's roots. Event times come
//! out as fractional hours from the civil-day midnight.

/// Rise/set pair for a threshold crossing, fractional hours from midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiseSet {
    pub rise: Option<f64>,
    pub set: Option<f64>,
}

/// Rise/set pair plus polar-day flags for a body's horizon crossing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayEvents {
    pub rise: Option<f64>,
    pub set: Option<f64>,
    pub always_above: bool,
    pub always_below: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SunEvents {
    pub day: DayEvents,
    /// Astronomical twilight (−18°) crossings.
    pub twilight_astro: RiseSet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoonEvents {
    pub day: DayEvents,
}

/// All events of one civil day at one location.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CivilDayEvents {
    pub sun: SunEvents,
    pub moon: MoonEvents,
}

/// Parabola through (−1, y_minus), (0, y0), (+1, y_plus).
///
/// Returns the extremum (xe, ye) and the roots inside [−1, +1].
pub(crate) struct Quadratic {
    pub xe: f64,
    pub ye: f64,
    pub roots: [f64; 2],
    pub n_roots: usize,
}

pub(crate) fn quadratic(y_minus: f64, y0: f64, y_plus: f64) -> Quadratic {
    let a = 0.5 * (y_minus + y_plus) - y0;
    let b = 0.5 * (y_plus - y_minus);
    let c = y0;

    if a.abs() < 1e-12 {
        // Degenerate: a straight line.
        let mut roots = [0.0; 2];
        let mut n_roots = 0;
        if b.abs() > 1e-12 {
            let r = -c / b;
            if r.abs() <= 1.0 {
                roots[0] = r;
                n_roots = 1;
            }
        }
        return Quadratic {
            xe: 0.0,
            ye: c,
            roots,
            n_roots,
        };
    }

    let xe = -b / (2.0 * a);
    let ye = (a * xe + b) * xe + c;
    let dis = b * b - 4.0 * a * c;

    let mut roots = [0.0; 2];
    let mut n_roots = 0;
    if dis >= 0.0 {
        let dx = 0.5 * dis.sqrt() / a.abs();
        let r1 = xe - dx;
        let r2 = xe + dx;
        if r1.abs() <= 1.0 {
            roots[n_roots] = r1;
            n_roots += 1;
        }
        if r2.abs() <= 1.0 {
            roots[n_roots] = r2;
            n_roots += 1;
        }
    }

    Quadratic {
        xe,
        ye,
        roots,
        n_roots,
    }
}

/// Scan one civil day for crossings of `sin_h0` by `sin_alt(hours)`.
///
/// `sin_alt` is sampled at whole hours 0..=24; crossings between samples are
/// located on the interpolating parabola. Only the first rise and first set
/// are kept; a body can cross a fixed threshold at most once each way per
/// civil day at the accuracy this planner needs.
pub(crate) fn scan_day(sin_alt: impl Fn(f64) -> f64, sin_h0: f64) -> DayEvents {
    let mut events = DayEvents::default();

    let mut y_minus = sin_alt(0.0) - sin_h0;
    let above_at_start = y_minus > 0.0;

    let mut hour = 1.0;
    while hour < 24.0 {
        let y0 = sin_alt(hour) - sin_h0;
        let y_plus = sin_alt(hour + 1.0) - sin_h0;
        let q = quadratic(y_minus, y0, y_plus);

        match q.n_roots {
            1 => {
                // Direction comes from the trailing sample; a sample can sit
                // exactly on the threshold, in which case the leading one
                // decides.
                let rising = if y_plus == 0.0 {
                    y_minus < 0.0
                } else {
                    y_plus > 0.0
                };
                if rising {
                    events.rise.get_or_insert(hour + q.roots[0]);
                } else {
                    events.set.get_or_insert(hour + q.roots[0]);
                }
            }
            2 => {
                if q.ye < 0.0 {
                    events.rise.get_or_insert(hour + q.roots[1]);
                    events.set.get_or_insert(hour + q.roots[0]);
                } else {
                    events.rise.get_or_insert(hour + q.roots[0]);
                    events.set.get_or_insert(hour + q.roots[1]);
                }
            }
            _ => {}
        }

        y_minus = y_plus;
        hour += 2.0;
    }

    if events.rise.is_none() && events.set.is_none() {
        events.always_above = above_at_start;
        events.always_below = !above_at_start;
    }

    events
}
