//! Planner settings from a TOML file

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use dark_core::{
    timezone, wind_unit_to_ms, FilterConfig, FilterEdge, Location, WindUnit,
};
use dark_weather::WeatherConfig;

const CONFIG_ENV_VAR: &str = "DARK_PLANNER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "planner.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSettings {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// IANA zone id; unknown ids fall back to the host default at use.
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilterSettings {
    pub from_edge: Option<FilterEdge>,
    pub to_edge: Option<FilterEdge>,
    pub min_minutes: Option<u32>,
    /// Days of week as 0 = Sunday .. 6 = Saturday.
    pub allowed_days: Option<Vec<u8>>,
    pub hide_non_match: Option<bool>,
    pub highlight_match: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherSettings {
    pub max_cloud_pct: Option<f64>,
    pub max_wind: Option<f64>,
    /// Unit `max_wind` is written in; internal thresholds are m/s.
    pub wind_unit: Option<WindUnit>,
    pub max_humidity_pct: Option<f64>,
    pub min_consec_hours: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheSettings {
    pub path: Option<PathBuf>,
}

/// Planner configuration, loaded from `DARK_PLANNER_CONFIG` (TOML) if
/// present. Every section is optional; absent values use engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlannerSettings {
    pub location: Option<LocationSettings>,
    pub filter: Option<FilterSettings>,
    pub weather: Option<WeatherSettings>,
    pub cache: Option<CacheSettings>,
}

fn weekday_from_index(i: u8) -> Option<Weekday> {
    match i {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

impl PlannerSettings {
    pub fn load() -> Result<Self, SettingsError> {
        let path =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        if path.as_ref().exists() {
            let text = fs::read_to_string(path)?;
            Ok(toml::from_str(&text)?)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured observing site, if any. Unknown zone ids are dropped
    /// so the planner's fallback zone applies.
    pub fn location(&self) -> Option<Location> {
        let ls = self.location.as_ref()?;
        let mut loc = Location::new(ls.lat, ls.lon);
        if let Some(name) = &ls.name {
            loc = loc.with_name(name.clone());
        }
        if let Some(zone) = ls.zone.as_deref().and_then(|id| timezone::parse_zone(id).ok()) {
            loc = loc.with_zone(zone);
        }
        Some(loc)
    }

    pub fn filter_config(&self) -> FilterConfig {
        let defaults = FilterConfig::default();
        let Some(f) = self.filter.as_ref() else {
            return defaults;
        };
        FilterConfig {
            from_edge: f.from_edge.unwrap_or(defaults.from_edge),
            to_edge: f.to_edge.unwrap_or(defaults.to_edge),
            min_minutes: f.min_minutes.unwrap_or(defaults.min_minutes),
            allowed_days: f.allowed_days.as_ref().map(|days| {
                days.iter().copied().filter_map(weekday_from_index).collect()
            }),
            hide_non_match: f.hide_non_match.unwrap_or(defaults.hide_non_match),
            highlight_match: f.highlight_match.unwrap_or(defaults.highlight_match),
        }
    }

    pub fn weather_config(&self) -> WeatherConfig {
        let defaults = WeatherConfig::default();
        let Some(ws) = self.weather.as_ref() else {
            return defaults;
        };
        let max_wind_ms = match ws.max_wind {
            Some(v) => wind_unit_to_ms(v, ws.wind_unit.unwrap_or(WindUnit::Ms)),
            None => defaults.max_wind_ms,
        };
        WeatherConfig {
            max_cloud_pct: ws.max_cloud_pct.unwrap_or(defaults.max_cloud_pct),
            max_wind_ms,
            max_humidity_pct: ws.max_humidity_pct.unwrap_or(defaults.max_humidity_pct),
            min_consec_hours: ws.min_consec_hours.unwrap_or(defaults.min_consec_hours),
        }
    }

    /// Path for the file-backed weather cache (default `weather-cache.json`).
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .as_ref()
            .and_then(|c| c.path.clone())
            .unwrap_or_else(|| PathBuf::from("weather-cache.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file() {
        let settings = PlannerSettings::load_from("/nonexistent/planner.toml").unwrap();
        assert!(settings.location().is_none());
        assert_eq!(settings.filter_config(), FilterConfig::default());
        assert_eq!(settings.weather_config(), WeatherConfig::default());
    }

    #[test]
    fn full_settings_parse_and_map() {
        let text = r#"
            [location]
            name = "Munich"
            lat = 48.1351
            lon = 11.5820
            zone = "Europe/Berlin"

            [filter]
            from_edge = "astrStart"
            to_edge = { hour = 2 }
            min_minutes = 120
            allowed_days = [5, 6]

            [weather]
            max_cloud_pct = 20.0
            max_wind = 21.6
            wind_unit = "kmh"
            min_consec_hours = 4

            [cache]
            path = "/tmp/wx.json"
        "#;
        let settings: PlannerSettings = toml::from_str(text).unwrap();

        let loc = settings.location().unwrap();
        assert_eq!(loc.name.as_deref(), Some("Munich"));
        assert_eq!(loc.zone, Some(chrono_tz::Europe::Berlin));

        let filter = settings.filter_config();
        assert_eq!(filter.from_edge, FilterEdge::AstrStart);
        assert_eq!(filter.to_edge, FilterEdge::Hour(2));
        assert_eq!(filter.min_minutes, 120);
        assert_eq!(
            filter.allowed_days,
            Some(vec![Weekday::Fri, Weekday::Sat])
        );

        let weather = settings.weather_config();
        assert_eq!(weather.max_cloud_pct, 20.0);
        assert!((weather.max_wind_ms - 6.0).abs() < 1e-9);
        assert_eq!(weather.max_humidity_pct, 70.0);
        assert_eq!(weather.min_consec_hours, 4);

        assert_eq!(settings.cache_path(), PathBuf::from("/tmp/wx.json"));
    }

    #[test]
    fn unknown_zone_is_dropped() {
        let settings: PlannerSettings = toml::from_str(
            r#"
            [location]
            lat = 1.0
            lon = 2.0
            zone = "Mars/Olympus"
        "#,
        )
        .unwrap();
        assert_eq!(settings.location().unwrap().zone, None);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[filter]\nmin_minutes = 45").unwrap();

        let settings = PlannerSettings::load_from(&path).unwrap();
        assert_eq!(settings.filter_config().min_minutes, 45);
    }
}
