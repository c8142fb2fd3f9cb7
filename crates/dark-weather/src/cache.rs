//! Weather cache: TTL, in-flight deduplication, offline fallback
//!
//! States: empty, loading, ready-fresh, ready-stale. A failed fetch with a
//! prior cache entry lands in ready-stale with `from_cache` set; without one
//! the cache stays empty and `load` reports `NotReady`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use dark_core::{timezone, wind_unit_to_ms, Instant, WindUnit};

use crate::provider::ForecastProvider;
use crate::seeing::seeing_score;
use crate::store::{weather_key, CacheStore, CachedForecast, StoredHour};
use crate::{WeatherError, WeatherResult};

const TTL_MS: i64 = 60 * 60 * 1000;
const HOUR_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// How a successful `load` was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Cache entry within TTL, no network.
    FreshFromCache,
    /// Fetched and stored just now.
    FreshFromNetwork,
    /// Fetch failed; an expired entry was served instead.
    StaleFromCache,
}

impl LoadOutcome {
    pub fn from_cache(self) -> bool {
        !matches!(self, Self::FreshFromNetwork)
    }
}

/// Cooperative cancellation handle for an in-flight load.
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never fire, for callers without a cancel path.
    pub fn never() -> Self {
        static NEVER: std::sync::OnceLock<watch::Sender<bool>> = std::sync::OnceLock::new();
        let tx = NEVER.get_or_init(|| watch::channel(false).0);
        Self { rx: tx.subscribe() }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the source fires. Pends forever if the source is gone
    /// without having fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// One forecast hour with its wall-clock key and resolved instant.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedHour {
    pub iso: String,
    pub instant: Instant,
    pub cloud_pct: Option<f64>,
    pub wind_ms: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub aod: Option<f64>,
    pub seeing_score: Option<u8>,
}

/// Hour-indexed view over a normalised forecast, sorted by instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastIndex {
    pub zone: Option<Tz>,
    pub fetched_at_ms: i64,
    pub from_cache: bool,
    hours: Vec<IndexedHour>,
}

impl ForecastIndex {
    pub(crate) fn from_entry(entry: &CachedForecast, from_cache: bool) -> Self {
        let zone = entry
            .timezone
            .as_deref()
            .and_then(|id| id.parse::<Tz>().ok());
        let mut hours: Vec<IndexedHour> = entry
            .hours
            .iter()
            .filter_map(|h| {
                let instant = parse_hour_key(&h.iso, zone)?;
                Some(IndexedHour {
                    iso: h.iso.clone(),
                    instant,
                    cloud_pct: h.cloud_pct,
                    wind_ms: h.wind_ms,
                    humidity_pct: h.humidity_pct,
                    aod: h.aod,
                    seeing_score: h.seeing_score,
                })
            })
            .collect();
        hours.sort_by_key(|h| h.instant);
        Self {
            zone,
            fetched_at_ms: entry.fetched_at_ms,
            from_cache,
            hours,
        }
    }

    pub fn hours(&self) -> &[IndexedHour] {
        &self.hours
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms - self.fetched_at_ms <= TTL_MS
    }
}

/// Convert a provider hour key (wall clock in the forecast zone) into an
/// instant. Without a usable zone the wall clock is read as UTC.
fn parse_hour_key(iso: &str, zone: Option<Tz>) -> Option<Instant> {
    let naive = NaiveDateTime::parse_from_str(iso, HOUR_KEY_FORMAT).ok()?;
    match zone {
        Some(tz) => timezone::zoned_from_naive(tz, naive).ok(),
        None => Some(naive.and_utc()),
    }
}

type SharedOutcome = WeatherResult<LoadOutcome>;

#[derive(Default)]
struct CacheState {
    index: Option<Arc<ForecastIndex>>,
    in_flight: HashMap<String, watch::Receiver<Option<SharedOutcome>>>,
}

/// Role of one `load` call for its coordinate key.
enum Flight {
    Lead(watch::Sender<Option<SharedOutcome>>),
    Follow(watch::Receiver<Option<SharedOutcome>>),
}

/// Removes the in-flight marker even when the leading future is dropped
/// mid-fetch, so a later call can start a fresh load instead of waiting on
/// a sender that will never settle.
struct InFlightGuard<'a> {
    cache: &'a WeatherCache,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.cache.lock_state().in_flight.remove(self.key);
    }
}

/// The planner's single stateful subsystem.
pub struct WeatherCache {
    provider: Arc<dyn ForecastProvider>,
    store: Arc<dyn CacheStore>,
    state: Mutex<CacheState>,
}

impl WeatherCache {
    pub fn new(provider: Arc<dyn ForecastProvider>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            provider,
            store,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// True once any forecast (fresh or stale) has been installed.
    pub fn ready(&self) -> bool {
        self.lock_state().index.is_some()
    }

    /// The currently installed forecast view.
    pub fn snapshot(&self) -> Option<Arc<ForecastIndex>> {
        self.lock_state().index.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Load the forecast for a coordinate.
    ///
    /// Within the TTL a non-forced call is served from the store without
    /// network. Concurrent calls for the same rounded coordinate share one
    /// fetch and observe the same outcome.
    pub async fn load(
        &self,
        lat: f64,
        lon: f64,
        force: bool,
        cancel: &CancelToken,
    ) -> WeatherResult<LoadOutcome> {
        let key = weather_key(lat, lon);

        loop {
            // The state lock is scoped to this block; the rest of the call
            // only holds channel ends and stays spawnable.
            let flight = {
                let mut state = self.lock_state();
                match state.in_flight.get(&key) {
                    Some(rx) => Flight::Follow(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        state.in_flight.insert(key.clone(), rx);
                        Flight::Lead(tx)
                    }
                }
            };

            let mut rx = match flight {
                Flight::Lead(tx) => {
                    let _marker = InFlightGuard {
                        cache: self,
                        key: &key,
                    };
                    let outcome = self.do_load(lat, lon, force, cancel, &key).await;
                    let _ = tx.send(Some(outcome.clone()));
                    return outcome;
                }
                Flight::Follow(rx) => rx,
            };

            // Another load for this coordinate is in flight; wait for its
            // result.
            debug!(%key, "joining in-flight weather load");
            loop {
                let settled = rx.borrow().clone();
                if let Some(outcome) = settled {
                    return outcome;
                }
                if rx.changed().await.is_err() {
                    // The leading load was dropped before settling and its
                    // marker is gone; take over with a fresh attempt.
                    break;
                }
            }
        }
    }

    async fn do_load(
        &self,
        lat: f64,
        lon: f64,
        force: bool,
        cancel: &CancelToken,
        key: &str,
    ) -> WeatherResult<LoadOutcome> {
        let now_ms = Utc::now().timestamp_millis();

        if !force {
            if let Some(entry) = self.read_entry(key) {
                if now_ms - entry.fetched_at_ms <= TTL_MS {
                    debug!(key, age_min = (now_ms - entry.fetched_at_ms) / 60_000, "cache hit");
                    self.install(&entry, true);
                    return Ok(LoadOutcome::FreshFromCache);
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(WeatherError::Cancelled);
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return Err(WeatherError::Cancelled),
            res = self.fetch_and_normalise(lat, lon) => res,
        };

        match fetched {
            Ok(entry) => {
                match serde_json::to_string(&entry) {
                    Ok(text) => {
                        if let Err(e) = self.store.put(key, &text) {
                            warn!(key, error = %e, "could not persist forecast");
                        }
                    }
                    Err(e) => warn!(key, error = %e, "could not encode forecast"),
                }
                info!(key, hours = entry.hours.len(), "forecast updated");
                self.install(&entry, false);
                Ok(LoadOutcome::FreshFromNetwork)
            }
            Err(WeatherError::FetchFailed(reason)) => {
                warn!(key, %reason, "forecast fetch failed");
                match self.read_entry(key) {
                    Some(entry) => {
                        info!(key, "serving stale forecast");
                        self.install(&entry, true);
                        Ok(LoadOutcome::StaleFromCache)
                    }
                    None => Err(WeatherError::NotReady),
                }
            }
            Err(other) => Err(other),
        }
    }

    fn read_entry(&self, key: &str) -> Option<CachedForecast> {
        let text = match self.store.get(key) {
            Ok(v) => v?,
            Err(e) => {
                warn!(key, error = %e, "cache store read failed");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn install(&self, entry: &CachedForecast, from_cache: bool) {
        let index = Arc::new(ForecastIndex::from_entry(entry, from_cache));
        self.lock_state().index = Some(index);
    }

    /// Fetch the three streams concurrently and join them on the basic
    /// weather's hour keys. AOD or upper-air failure is tolerated; basic
    /// weather failure aborts.
    async fn fetch_and_normalise(&self, lat: f64, lon: f64) -> WeatherResult<CachedForecast> {
        let (weather, air, upper) = tokio::join!(
            self.provider.fetch_weather(lat, lon),
            self.provider.fetch_air_quality(lat, lon),
            self.provider.fetch_upper_air(lat, lon),
        );

        let weather = weather?;
        weather.validate()?;

        let aod_by_iso: HashMap<String, f64> = match air {
            Ok(p) => {
                let mut map = HashMap::new();
                for (i, iso) in p.hourly.time.iter().enumerate() {
                    if let Some(v) = series_at(&p.hourly.aerosol_optical_depth, i) {
                        map.insert(iso.clone(), v);
                    }
                }
                map
            }
            Err(e) => {
                warn!(error = %e, "air-quality stream unavailable");
                HashMap::new()
            }
        };

        let seeing_by_iso: HashMap<String, u8> = match upper {
            Ok(p) => {
                let mut map = HashMap::new();
                for (i, iso) in p.hourly.time.iter().enumerate() {
                    let score = seeing_score(
                        series_at(&p.hourly.wind_speed_200h_pa, i),
                        series_at(&p.hourly.wind_speed_300h_pa, i),
                        series_at(&p.hourly.wind_speed_500h_pa, i),
                        series_at(&p.hourly.wind_speed_700h_pa, i),
                    );
                    if let Some(s) = score {
                        map.insert(iso.clone(), s);
                    }
                }
                map
            }
            Err(e) => {
                warn!(error = %e, "upper-air stream unavailable");
                HashMap::new()
            }
        };

        let timezone = match weather.timezone.as_deref() {
            Some(id) if id.parse::<Tz>().is_ok() => Some(id.to_string()),
            Some(id) => {
                warn!(zone = id, "provider returned unknown zone id");
                None
            }
            None => None,
        };

        let hours = weather
            .hourly
            .time
            .iter()
            .enumerate()
            .map(|(i, iso)| StoredHour {
                iso: iso.clone(),
                cloud_pct: series_at(&weather.hourly.cloud_cover, i),
                wind_ms: series_at(&weather.hourly.wind_speed_10m, i)
                    .map(|kmh| wind_unit_to_ms(kmh, WindUnit::Kmh)),
                humidity_pct: series_at(&weather.hourly.relative_humidity_2m, i),
                aod: aod_by_iso.get(iso).copied(),
                seeing_score: seeing_by_iso.get(iso).copied(),
            })
            .collect();

        Ok(CachedForecast {
            fetched_at_ms: Utc::now().timestamp_millis(),
            timezone,
            hours,
        })
    }
}

fn series_at(series: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    series.as_ref().and_then(|v| v.get(i).copied().flatten())
}
