//! Core data types for night planning

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// An absolute point in time on the UTC timeline.
///
/// Distinct from any wall-clock representation; conversions happen through
/// the [`crate::timezone`] service.
pub type Instant = DateTime<Utc>;

/// A geographic observing site.
///
/// Latitude/longitude are clamped to valid ranges on construction. The zone
/// is the cached IANA zone for the site if one has been resolved; callers
/// fall back to a host zone when it is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub zone: Option<Tz>,
}

impl Location {
    /// Build a location, clamping coordinates into range.
    ///
    /// Non-finite coordinates are rejected by the caller per the data-model
    /// invariant; this constructor only clamps.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            name: None,
            lat: lat.clamp(-90.0, 90.0),
            lon: lon.clamp(-180.0, 180.0),
            zone: None,
        }
    }

    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The zone used for all planner wall-clock math at this site.
    pub fn effective_zone(&self, fallback: Tz) -> Tz {
        self.zone.unwrap_or(fallback)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// One edge of the user's evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterEdge {
    /// Start of astronomical night (sun reaches −18°).
    AstrStart,
    /// End of astronomical night.
    AstrEnd,
    /// A fixed wall-clock hour counted from the night's base midnight.
    Hour(u8),
}

/// User-selected darkness filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub from_edge: FilterEdge,
    pub to_edge: FilterEdge,
    /// Minimum overlap of full darkness with the window, in minutes.
    pub min_minutes: u32,
    /// Allowed days of week for the night's base date; `None` = any day.
    pub allowed_days: Option<Vec<Weekday>>,
    pub hide_non_match: bool,
    pub highlight_match: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            from_edge: FilterEdge::Hour(21),
            to_edge: FilterEdge::Hour(2),
            min_minutes: 0,
            allowed_days: None,
            hide_non_match: false,
            highlight_match: false,
        }
    }
}

impl FilterConfig {
    /// True when neither the duration nor the day-of-week constraint is set.
    /// The window is still resolved for the weather evaluator.
    pub fn is_inactive(&self) -> bool {
        self.min_minutes == 0 && self.allowed_days.is_none()
    }

    pub fn day_allowed(&self, day: Weekday) -> bool {
        match &self.allowed_days {
            None => true,
            Some(days) => days.contains(&day),
        }
    }
}

/// Assembled astronomy record for one night (base date D at a location).
///
/// Event fields are absent when the corresponding crossing does not occur,
/// which is normal at polar latitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightRecord {
    /// Civil base date D in the planner's effective zone.
    pub date: NaiveDate,
    /// Zoned midnight of D.
    pub mid0: Instant,
    /// Zoned midnight of D+1.
    pub mid1: Instant,
    pub sunset: Option<Instant>,
    pub sunrise: Option<Instant>,
    /// Evening end of astronomical twilight (darkness begins).
    pub astr_start: Option<Instant>,
    /// Morning start of astronomical twilight (darkness ends).
    pub astr_end: Option<Instant>,
    /// Moon rises inside `[sunset, sunrise]`, sorted by instant.
    pub moon_rises: Vec<Instant>,
    /// Moon sets inside `[sunset, sunrise]`, sorted by instant.
    pub moon_sets: Vec<Instant>,
    pub moon_always_above: bool,
    pub moon_always_below: bool,
    pub sun_always_above: bool,
    pub sun_always_below: bool,
}

impl NightRecord {
    /// The astronomical night `[astr_start, astr_end]`, when both edges
    /// exist and are ordered.
    pub fn astro_night(&self) -> Option<(Instant, Instant)> {
        match (self.astr_start, self.astr_end) {
            (Some(s), Some(e)) if e > s => Some((s, e)),
            _ => None,
        }
    }
}

/// Day-of-week as the planner counts it: 0 = Sunday … 6 = Saturday.
pub fn dow_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}
