//! Forecast acquisition, durable caching, and per-night weather evaluation
//!
//! The cache is the only stateful subsystem of the planner. It speaks to an
//! Open-Meteo-compatible provider through the [`ForecastProvider`] trait,
//! persists normalised forecasts through a [`CacheStore`], and hands the
//! evaluator an hour-indexed view keyed by the forecast's own wall clock.

pub mod cache;
pub mod evaluate;
pub mod provider;
pub mod seeing;
pub mod store;

pub use cache::{CancelSource, CancelToken, ForecastIndex, IndexedHour, LoadOutcome, WeatherCache};
pub use evaluate::{
    evaluate_window, hours_between, EvalResult, HourRun, HourSample, SkipReason, WeatherConfig,
};
pub use provider::{ForecastPayload, ForecastProvider, OpenMeteoClient, TimeZoneResolver};
pub use seeing::{seeing_score, SeeingLabel};
pub use store::{weather_key, CacheStore, CachedForecast, JsonFileStore, MemoryStore, StoredHour};

use thiserror::Error;

/// Errors of the weather subsystem.
///
/// Cloneable so a deduplicated in-flight load can broadcast the same outcome
/// to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("forecast fetch failed: {0}")]
    FetchFailed(String),

    #[error("forecast payload invalid: {0}")]
    InvalidPayload(String),

    #[error("weather cache not ready")]
    NotReady,

    #[error("weather load cancelled")]
    Cancelled,

    #[error("cache store error: {0}")]
    Store(String),
}

pub type WeatherResult<T> = Result<T, WeatherError>;
