//! Plan the next 30 nights for a configured location and print a summary.
//!
//! Reads `DARK_PLANNER_CONFIG` (TOML) for the site, filter, and thresholds;
//! defaults to Munich with the stock filter when absent.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dark_astro::MeeusEphemeris;
use dark_core::Location;
use dark_planner::{Planner, PlannerSettings, DEFAULT_HORIZON_NIGHTS};
use dark_weather::{
    CancelToken, JsonFileStore, OpenMeteoClient, TimeZoneResolver, WeatherCache,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = PlannerSettings::load().context("Failed to load settings")?;
    let mut location = settings
        .location()
        .unwrap_or_else(|| Location::new(48.1351, 11.5820).with_name("Munich"));
    let filter = settings.filter_config();

    let provider = Arc::new(OpenMeteoClient::new().context("Failed to build HTTP client")?);

    if location.zone.is_none() {
        match provider.resolve_zone(location.lat, location.lon).await {
            Ok(Some(zone)) => {
                info!(%zone, "resolved time zone for location");
                location = location.with_zone(zone);
            }
            Ok(None) => warn!("provider returned no zone, using UTC"),
            Err(e) => warn!(error = %e, "zone lookup failed, using UTC"),
        }
    }

    let store = Arc::new(JsonFileStore::new(settings.cache_path()));
    let cache = Arc::new(WeatherCache::new(provider, store));

    if let Err(e) = cache
        .load(location.lat, location.lon, false, &CancelToken::never())
        .await
    {
        warn!(error = %e, "weather unavailable, planning darkness only");
    }
    if let Some(index) = cache.snapshot() {
        info!(
            hours = index.hours().len(),
            stale = !index.is_fresh(Utc::now().timestamp_millis()),
            "forecast ready"
        );
    }

    let planner = Planner::new(Arc::new(MeeusEphemeris::new()))
        .with_weather(cache, settings.weather_config());

    let start = Utc::now().date_naive();
    let nights = planner.plan_horizon(start, DEFAULT_HORIZON_NIGHTS, &location, &filter)?;

    for night in &nights {
        let weather = match &night.weather {
            Some(w) if w.ok => "clear run",
            Some(_) => "too poor",
            None => "no data",
        };
        println!(
            "{}  dark {:>4} min  overlap {:>4} min  {}  weather: {}",
            night.date,
            night.darkness.total_minutes,
            night.overlap_minutes,
            if night.darkness_pass { "PASS" } else { "----" },
            weather,
        );
    }

    if let Some(m) = planner.find_next_matching_night(start, DEFAULT_HORIZON_NIGHTS, &location, &filter)? {
        info!(date = %m.date, days_ahead = m.days_ahead, "next matching night");
    }

    Ok(())
}
