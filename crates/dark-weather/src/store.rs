//! Durable key/value persistence for normalised forecasts
//!
//! The planner treats the store as an opaque JSON key/value map; the only
//! keys it owns are the versioned per-coordinate weather entries. The rest of
//! the map (user prefs, saved locations) belongs to the application shell.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{WeatherError, WeatherResult};

const KEY_PREFIX: &str = "darkplanner.v1.wx";

/// Store key for the weather entry of a coordinate, rounded to 3 decimals.
pub fn weather_key(lat: f64, lon: f64) -> String {
    format!("{KEY_PREFIX}.{:.3},{:.3}", lat, lon)
}

/// One normalised forecast hour, keyed by the provider's wall-clock string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHour {
    pub iso: String,
    pub cloud_pct: Option<f64>,
    /// Converted from the provider's km/h at normalisation time.
    pub wind_ms: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub aod: Option<f64>,
    pub seeing_score: Option<u8>,
}

/// A cached forecast for one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedForecast {
    pub fetched_at_ms: i64,
    /// IANA zone the hour keys are expressed in; absent when the provider
    /// did not echo a usable zone.
    pub timezone: Option<String>,
    pub hours: Vec<StoredHour>,
}

/// Durable string-keyed JSON storage.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> WeatherResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> WeatherResult<()>;
    fn remove(&self, key: &str) -> WeatherResult<()>;
}

/// Volatile store for tests and cache-less operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> WeatherResult<Option<String>> {
        let map = self.map.lock().map_err(|e| WeatherError::Store(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> WeatherResult<()> {
        let mut map = self.map.lock().map_err(|e| WeatherError::Store(e.to_string()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> WeatherResult<()> {
        let mut map = self.map.lock().map_err(|e| WeatherError::Store(e.to_string()))?;
        map.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object per file, written atomically by
/// renaming a sibling temp file over the target.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> WeatherResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                serde_json::from_str(&text).map_err(|e| WeatherError::Store(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(WeatherError::Store(e.to_string())),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> WeatherResult<()> {
        let text = serde_json::to_string(map).map_err(|e| WeatherError::Store(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| WeatherError::Store(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| WeatherError::Store(e.to_string()))?;
        Ok(())
    }
}

impl CacheStore for JsonFileStore {
    fn get(&self, key: &str) -> WeatherResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|e| WeatherError::Store(e.to_string()))?;
        Ok(self.read_map()?.remove(key))
    }

    fn put(&self, key: &str, value: &str) -> WeatherResult<()> {
        let _guard = self.lock.lock().map_err(|e| WeatherError::Store(e.to_string()))?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> WeatherResult<()> {
        let _guard = self.lock.lock().map_err(|e| WeatherError::Store(e.to_string()))?;
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_key_rounds_coordinates() {
        assert_eq!(
            weather_key(48.137394, 11.575512),
            "darkplanner.v1.wx.48.137,11.576"
        );
        assert_eq!(weather_key(0.0, -0.0004), "darkplanner.v1.wx.0.000,-0.000");
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        {
            let store = JsonFileStore::new(&path);
            store.put("a", "1").unwrap();
            store.put("b", "2").unwrap();
        }
        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.get("b").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn cached_forecast_serde_round_trip() {
        let entry = CachedForecast {
            fetched_at_ms: 1_766_000_000_000,
            timezone: Some("Europe/Berlin".into()),
            hours: vec![StoredHour {
                iso: "2025-12-21T23:00".into(),
                cloud_pct: Some(5.0),
                wind_ms: Some(2.5),
                humidity_pct: Some(60.0),
                aod: None,
                seeing_score: Some(72),
            }],
        };
        let text = serde_json::to_string(&entry).unwrap();
        let back: CachedForecast = serde_json::from_str(&text).unwrap();
        assert_eq!(back, entry);
    }
}
