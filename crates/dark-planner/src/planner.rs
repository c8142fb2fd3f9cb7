//! Planner orchestrator

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dark_astro::{compute_darkness, moon_phase, DarknessReport, Ephemeris, MoonPhase};
use dark_core::{timezone, FilterConfig, Interval, Location, NightRecord};
use dark_weather::{
    evaluate_window, hours_between, EvalResult, HourSample, SkipReason, WeatherCache, WeatherConfig,
};

use crate::assemble::assemble_night;
use crate::window::{evaluate_darkness_filter, DarknessVerdict};
use crate::PlanResult;

pub const DEFAULT_HORIZON_NIGHTS: u32 = 30;

/// Everything the planner knows about one candidate night.
#[derive(Debug, Clone, PartialEq)]
pub struct NightResult {
    pub date: NaiveDate,
    pub record: NightRecord,
    pub darkness: DarknessReport,
    pub window: Option<Interval>,
    pub overlap_minutes: i64,
    pub day_of_week_match: bool,
    pub darkness_pass: bool,
    /// Phase summary at the night's central midnight.
    pub moon_phase: MoonPhase,
    /// Absent while the weather cache is not ready or weather is disabled.
    pub weather: Option<EvalResult>,
}

impl NightResult {
    /// Darkness filter plus, when evaluated, the weather filter.
    pub fn passes(&self) -> bool {
        self.darkness_pass && self.weather.as_ref().map_or(true, |w| w.ok)
    }
}

/// A matching night found by [`Planner::find_next_matching_night`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub days_ahead: i64,
    pub date: NaiveDate,
    pub overlap_minutes: i64,
}

/// Stateless per-call orchestrator; the weather cache it holds is the only
/// stateful collaborator.
pub struct Planner {
    ephemeris: Arc<dyn Ephemeris>,
    weather: Option<Arc<WeatherCache>>,
    weather_config: WeatherConfig,
    fallback_zone: Tz,
}

impl Planner {
    pub fn new(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self {
            ephemeris,
            weather: None,
            weather_config: WeatherConfig::default(),
            fallback_zone: chrono_tz::UTC,
        }
    }

    /// Enable weather evaluation against a loaded cache.
    pub fn with_weather(mut self, cache: Arc<WeatherCache>, config: WeatherConfig) -> Self {
        self.weather = Some(cache);
        self.weather_config = config;
        self
    }

    /// Zone used when a location carries none.
    pub fn with_fallback_zone(mut self, zone: Tz) -> Self {
        self.fallback_zone = zone;
        self
    }

    /// Evaluate one night: astronomy, darkness, filter, weather.
    pub fn evaluate_single_night(
        &self,
        date: NaiveDate,
        location: &Location,
        filter: &FilterConfig,
    ) -> PlanResult<NightResult> {
        let zone = location.effective_zone(self.fallback_zone);
        let record = assemble_night(date, location, zone, self.ephemeris.as_ref())?;
        let darkness = compute_darkness(&record, location.lat, location.lon, self.ephemeris.as_ref());
        let DarknessVerdict {
            window,
            overlap_minutes,
            day_of_week_match,
            darkness_pass,
        } = evaluate_darkness_filter(filter, &record, &darkness.intervals);

        let weather = self.evaluate_weather(window.as_ref(), &darkness);

        debug!(
            %date,
            dark_min = darkness.total_minutes,
            overlap_minutes,
            darkness_pass,
            weather_ok = weather.as_ref().map(|w| w.ok),
            "night evaluated"
        );

        let phase = moon_phase(record.mid1);
        Ok(NightResult {
            date,
            record,
            darkness,
            window,
            overlap_minutes,
            day_of_week_match,
            darkness_pass,
            moon_phase: phase,
            weather,
        })
    }

    fn evaluate_weather(
        &self,
        window: Option<&Interval>,
        darkness: &DarknessReport,
    ) -> Option<EvalResult> {
        let cache = self.weather.as_ref()?;
        let index = cache.snapshot()?;
        match window {
            Some(w) => Some(evaluate_window(
                &index,
                w,
                &darkness.intervals,
                &self.weather_config,
            )),
            // No resolvable window: the night cannot pass, and the verdict
            // says why.
            None => Some(EvalResult::skipped(SkipReason::NoAstronomicalEdges)),
        }
    }

    /// Plan `nights` consecutive nights starting at `start`, in strictly
    /// increasing date order.
    pub fn plan_horizon(
        &self,
        start: NaiveDate,
        nights: u32,
        location: &Location,
        filter: &FilterConfig,
    ) -> PlanResult<Vec<NightResult>> {
        info!(%start, nights, lat = location.lat, lon = location.lon, "planning horizon");
        let mut results = Vec::with_capacity(nights as usize);
        for i in 0..i64::from(nights) {
            let date = timezone::walk_days(start, i)?;
            results.push(self.evaluate_single_night(date, location, filter)?);
        }
        Ok(results)
    }

    /// First night in `1..=within` days after `from` that passes the
    /// darkness filter and, when weather is evaluated, the weather filter.
    pub fn find_next_matching_night(
        &self,
        from: NaiveDate,
        within: u32,
        location: &Location,
        filter: &FilterConfig,
    ) -> PlanResult<Option<Match>> {
        for i in 1..=i64::from(within) {
            let date = timezone::walk_days(from, i)?;
            let night = self.evaluate_single_night(date, location, filter)?;
            if night.passes() {
                return Ok(Some(Match {
                    days_ahead: i,
                    date,
                    overlap_minutes: night.overlap_minutes,
                }));
            }
        }
        Ok(None)
    }

    /// Every forecast hour of the night's astronomical night, for the
    /// hourly detail table. Empty when the cache is not ready.
    pub fn all_astr_night_hours(&self, record: &NightRecord) -> Vec<HourSample> {
        let Some(index) = self.weather.as_ref().and_then(|c| c.snapshot()) else {
            return Vec::new();
        };
        let Some((start, end)) = record.astro_night() else {
            return Vec::new();
        };
        hours_between(&index, start, end, &self.weather_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};
    use dark_astro::{CivilDayEvents, Equatorial, MoonEvents, RiseSet, SunEvents};
    use dark_core::Instant;

    /// Sun below the astronomical threshold from 18h to 6h; moon alternates
    /// above/below across nights by date parity.
    struct ToyEphemeris;

    impl Ephemeris for ToyEphemeris {
        fn events_for_civil_day(&self, _: Instant, _: f64, _: f64) -> CivilDayEvents {
            CivilDayEvents {
                sun: SunEvents {
                    day: dark_astro::DayEvents {
                        rise: Some(8.0),
                        set: Some(16.0),
                        always_above: false,
                        always_below: false,
                    },
                    twilight_astro: RiseSet {
                        rise: Some(6.0),
                        set: Some(18.0),
                    },
                },
                moon: MoonEvents {
                    day: dark_astro::DayEvents::default(),
                },
            }
        }

        fn moon_equatorial(&self, at: Instant) -> Equatorial {
            // Below the horizon on even days of month, above on odd.
            let dec = if at.day() % 2 == 0 { -0.5 } else { 0.5 };
            Equatorial { ra: 0.0, dec }
        }

        fn local_sidereal_time(&self, _: Instant, _: f64) -> f64 {
            0.0
        }
    }

    fn planner() -> Planner {
        Planner::new(Arc::new(ToyEphemeris))
    }

    #[test]
    fn horizon_is_strictly_increasing_and_complete() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let loc = Location::new(48.0, 11.0);
        let nights = planner()
            .plan_horizon(start, DEFAULT_HORIZON_NIGHTS, &loc, &FilterConfig::default())
            .unwrap();
        assert_eq!(nights.len(), 30);
        for (i, pair) in nights.windows(2).enumerate() {
            assert_eq!(pair[0].date, start + Duration::days(i as i64));
            assert!(pair[1].date > pair[0].date);
        }
    }

    #[test]
    fn weather_is_absent_without_a_cache() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let night = planner()
            .evaluate_single_night(start, &Location::new(48.0, 11.0), &FilterConfig::default())
            .unwrap();
        assert!(night.weather.is_none());
        // Default filter is inactive, so darkness alone decides.
        assert!(night.passes() == night.darkness_pass);
    }

    #[test]
    fn find_next_skips_non_matching_nights() {
        // At the pole the toy moon is down during even-day evenings (6 h of
        // darkness before the 21:00-02:00 window closes, 180 min overlap)
        // and only after midnight on odd-day evenings (120 min overlap).
        let filter = FilterConfig {
            min_minutes: 150,
            ..Default::default()
        };
        let loc = Location::new(90.0, 0.0);
        let from = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();

        let m = planner()
            .find_next_matching_night(from, 30, &loc, &filter)
            .unwrap()
            .expect("some night matches");
        assert_eq!(m.days_ahead, 2);
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2025, 12, 12).unwrap());
        assert_eq!(m.overlap_minutes, 180);

        let night = planner()
            .evaluate_single_night(m.date, &loc, &filter)
            .unwrap();
        assert!(night.darkness_pass);
    }

    #[test]
    fn planning_is_idempotent() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let loc = Location::new(48.0, 11.0);
        let filter = FilterConfig {
            min_minutes: 120,
            ..Default::default()
        };
        let p = planner();
        let a = p.plan_horizon(start, 10, &loc, &filter).unwrap();
        let b = p.plan_horizon(start, 10, &loc, &filter).unwrap();
        assert_eq!(a, b);
    }
}
