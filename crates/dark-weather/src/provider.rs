//! Forecast provider trait and the Open-Meteo HTTP client

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{WeatherError, WeatherResult};

/// Hourly series as delivered by the provider. `time` entries are wall-clock
/// strings (`YYYY-MM-DDTHH:MM`) in the payload's own zone; value series are
/// index-aligned with `time` and may be absent wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub cloud_cover: Option<Vec<Option<f64>>>,
    /// km/h at 10 m, per the provider's unit convention.
    #[serde(default)]
    pub wind_speed_10m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub relative_humidity_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub aerosol_optical_depth: Option<Vec<Option<f64>>>,
    #[serde(default, rename = "wind_speed_200hPa")]
    pub wind_speed_200h_pa: Option<Vec<Option<f64>>>,
    #[serde(default, rename = "wind_speed_300hPa")]
    pub wind_speed_300h_pa: Option<Vec<Option<f64>>>,
    #[serde(default, rename = "wind_speed_500hPa")]
    pub wind_speed_500h_pa: Option<Vec<Option<f64>>>,
    #[serde(default, rename = "wind_speed_700hPa")]
    pub wind_speed_700h_pa: Option<Vec<Option<f64>>>,
}

/// One forecast response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastPayload {
    /// IANA zone id echoed back by `timezone=auto`.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hourly: HourlySeries,
}

impl ForecastPayload {
    /// Reject payloads without an hourly key space.
    pub fn validate(&self) -> WeatherResult<()> {
        if self.hourly.time.is_empty() {
            return Err(WeatherError::InvalidPayload(
                "missing hourly.time array".into(),
            ));
        }
        Ok(())
    }
}

/// Source of hourly forecasts for a coordinate.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Basic hourly weather: cloud cover, 10 m wind, humidity. 14 days.
    async fn fetch_weather(&self, lat: f64, lon: f64) -> WeatherResult<ForecastPayload>;

    /// Aerosol optical depth. 7 days.
    async fn fetch_air_quality(&self, lat: f64, lon: f64) -> WeatherResult<ForecastPayload>;

    /// Pressure-level wind speeds for the seeing score. 14 days.
    async fn fetch_upper_air(&self, lat: f64, lon: f64) -> WeatherResult<ForecastPayload>;
}

/// Resolves the IANA zone of a coordinate, used when persisting a location.
#[async_trait]
pub trait TimeZoneResolver: Send + Sync {
    /// `Ok(None)` when the provider answered but without a usable zone id;
    /// callers fall back to the host zone.
    async fn resolve_zone(&self, lat: f64, lon: f64) -> WeatherResult<Option<Tz>>;
}

const FORECAST_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const AIR_QUALITY_BASE_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// HTTP client for the Open-Meteo forecast and air-quality APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    forecast_url: String,
    air_quality_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> WeatherResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| WeatherError::FetchFailed(e.to_string()))?;
        Ok(Self {
            client,
            forecast_url: FORECAST_BASE_URL.to_string(),
            air_quality_url: AIR_QUALITY_BASE_URL.to_string(),
        })
    }

    /// Point the client at alternate endpoints (mirrors, test servers).
    pub fn with_base_urls(mut self, forecast: impl Into<String>, air_quality: impl Into<String>) -> Self {
        self.forecast_url = forecast.into();
        self.air_quality_url = air_quality.into();
        self
    }

    async fn get_payload(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> WeatherResult<ForecastPayload> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| WeatherError::FetchFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(WeatherError::FetchFailed(format!(
                "{url} returned {}",
                resp.status()
            )));
        }
        resp.json::<ForecastPayload>()
            .await
            .map_err(|e| WeatherError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn fetch_weather(&self, lat: f64, lon: f64) -> WeatherResult<ForecastPayload> {
        self.get_payload(
            &self.forecast_url,
            &[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "hourly",
                    "cloud_cover,wind_speed_10m,relative_humidity_2m".into(),
                ),
                ("models", "best_match".into()),
                ("timezone", "auto".into()),
                ("forecast_days", "14".into()),
            ],
        )
        .await
    }

    async fn fetch_air_quality(&self, lat: f64, lon: f64) -> WeatherResult<ForecastPayload> {
        self.get_payload(
            &self.air_quality_url,
            &[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("hourly", "aerosol_optical_depth".into()),
                ("timezone", "auto".into()),
                ("forecast_days", "7".into()),
            ],
        )
        .await
    }

    async fn fetch_upper_air(&self, lat: f64, lon: f64) -> WeatherResult<ForecastPayload> {
        self.get_payload(
            &self.forecast_url,
            &[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "hourly",
                    "wind_speed_200hPa,wind_speed_300hPa,wind_speed_500hPa,wind_speed_700hPa"
                        .into(),
                ),
                ("models", "gem_seamless".into()),
                ("timezone", "auto".into()),
                ("forecast_days", "14".into()),
            ],
        )
        .await
    }
}

#[async_trait]
impl TimeZoneResolver for OpenMeteoClient {
    async fn resolve_zone(&self, lat: f64, lon: f64) -> WeatherResult<Option<Tz>> {
        let payload = self
            .get_payload(
                &self.forecast_url,
                &[
                    ("latitude", lat.to_string()),
                    ("longitude", lon.to_string()),
                    ("timezone", "auto".into()),
                    ("forecast_days", "1".into()),
                ],
            )
            .await?;
        Ok(payload
            .timezone
            .as_deref()
            .and_then(|id| id.parse::<Tz>().ok()))
    }
}
