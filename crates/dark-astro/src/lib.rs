//! Ephemeris provider and darkness computation
//!
//! Sun and moon event times use low-precision Meeus series with a
//! quadratic-interpolation crossing search over hourly altitude samples,
//! accurate to about a minute. That is deliberate: the planner works at
//! human scale and the darkness scan already quantises to 5-minute steps.

pub mod darkness;
pub mod ephemeris;
pub mod events;
pub mod julian;
pub mod lunar;
pub mod solar;

pub use darkness::*;
pub use ephemeris::*;
pub use events::{CivilDayEvents, DayEvents, MoonEvents, RiseSet, SunEvents};
pub use lunar::{moon_phase, MoonPhase, PhaseName};

use dark_core::Instant;

/// Equatorial coordinates of the current epoch, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equatorial {
    pub ra: f64,
    pub dec: f64,
}

/// Abstract ephemeris capability set.
///
/// The planner only ever talks to this trait, so tests can swap the Meeus
/// implementation for a deterministic stub.
pub trait Ephemeris: Send + Sync {
    /// Sun and moon rise/set events plus astronomical twilight for the civil
    /// day starting at `midnight`, observed at (`lat_deg`, `lon_deg`).
    ///
    /// Event times are fractional hours from `midnight`. On polar days an
    /// event may be absent while `always_above`/`always_below` is set;
    /// callers must tolerate any missing field.
    fn events_for_civil_day(&self, midnight: Instant, lat_deg: f64, lon_deg: f64)
        -> CivilDayEvents;

    /// Geocentric equatorial coordinates of the moon at an instant.
    fn moon_equatorial(&self, at: Instant) -> Equatorial;

    /// Local sidereal time in radians at an instant and longitude.
    fn local_sidereal_time(&self, at: Instant, lon_deg: f64) -> f64;
}
