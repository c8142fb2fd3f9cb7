//! Per-night weather evaluation over the forecast index
//!
//! The evaluator answers one question: inside the night's filter window and
//! its darkness spans, is there a long enough run of consecutive clear,
//! calm, dry hours? "Consecutive" means adjacent positions on the provider's
//! hourly grid, not instant subtraction.

use serde::{Deserialize, Serialize};

use dark_core::{inside_any, Instant, Interval};

use crate::cache::{ForecastIndex, IndexedHour};
use crate::seeing::SeeingLabel;

/// Weather pass thresholds. Wind is internal m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub max_cloud_pct: f64,
    pub max_wind_ms: f64,
    pub max_humidity_pct: f64,
    pub min_consec_hours: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            max_cloud_pct: 10.0,
            max_wind_ms: 6.0,
            max_humidity_pct: 70.0,
            min_consec_hours: 3,
        }
    }
}

/// One forecast hour as the UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSample {
    pub iso: String,
    pub instant: Instant,
    pub cloud_pct: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_ms: Option<f64>,
    pub aod: Option<f64>,
    pub seeing_score: Option<u8>,
    pub seeing_label: Option<SeeingLabel>,
    pub pass_weather: bool,
}

/// A maximal run of consecutive passing hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourRun {
    pub start: Instant,
    pub end: Instant,
    pub length_hours: u32,
}

/// Why a night carries a weather verdict without any evaluated hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The filter window could not be resolved for this night.
    NoAstronomicalEdges,
}

/// Outcome of evaluating one night's window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub ok: bool,
    pub runs: Vec<HourRun>,
    pub hours: Vec<HourSample>,
    pub reason: Option<SkipReason>,
}

impl EvalResult {
    /// A failing verdict that records why nothing was evaluated.
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            reason: Some(reason),
            ..Self::default()
        }
    }
}

fn sample(hour: &IndexedHour, cfg: &WeatherConfig) -> HourSample {
    // An hour with a missing basic field cannot be shown to pass.
    let pass = matches!(hour.cloud_pct, Some(c) if c <= cfg.max_cloud_pct)
        && matches!(hour.wind_ms, Some(w) if w <= cfg.max_wind_ms)
        && matches!(hour.humidity_pct, Some(h) if h <= cfg.max_humidity_pct);
    HourSample {
        iso: hour.iso.clone(),
        instant: hour.instant,
        cloud_pct: hour.cloud_pct,
        humidity_pct: hour.humidity_pct,
        wind_ms: hour.wind_ms,
        aod: hour.aod,
        seeing_score: hour.seeing_score,
        seeing_label: hour.seeing_score.map(SeeingLabel::from_score),
        pass_weather: pass,
    }
}

fn find_runs(hours: &[HourSample]) -> Vec<HourRun> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, h) in hours.iter().enumerate() {
        match (h.pass_weather, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(run_of(&hours[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(run_of(&hours[s..]));
    }
    runs
}

fn run_of(hours: &[HourSample]) -> HourRun {
    HourRun {
        start: hours[0].instant,
        end: hours[hours.len() - 1].instant,
        length_hours: hours.len() as u32,
    }
}

/// Evaluate the hours that fall inside `window` and inside some darkness
/// span. Hours beyond the forecast horizon simply do not exist in the index,
/// so a night out of range yields an empty, failing result.
pub fn evaluate_window(
    index: &ForecastIndex,
    window: &Interval,
    darkness: &[Interval],
    cfg: &WeatherConfig,
) -> EvalResult {
    let hours: Vec<HourSample> = index
        .hours()
        .iter()
        .filter(|h| window.contains(h.instant) && inside_any(h.instant, darkness))
        .map(|h| sample(h, cfg))
        .collect();

    let runs = find_runs(&hours);
    let ok = runs.iter().any(|r| r.length_hours >= cfg.min_consec_hours);

    EvalResult {
        ok,
        runs,
        hours,
        reason: None,
    }
}

/// Every forecast hour inside `[start, end]`, without darkness intersection
/// or threshold filtering. Backs the hourly detail table.
pub fn hours_between(
    index: &ForecastIndex,
    start: Instant,
    end: Instant,
    cfg: &WeatherConfig,
) -> Vec<HourSample> {
    index
        .hours()
        .iter()
        .filter(|h| h.instant >= start && h.instant <= end)
        .map(|h| sample(h, cfg))
        .collect()
}
