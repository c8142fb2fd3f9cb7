//! Night planner orchestration
//!
//! Ties the stack together: for each night in a horizon, assemble the
//! astronomy record, compute moon-free darkness, resolve the user's filter
//! window, evaluate the darkness filter, and (when the weather cache is
//! ready) the weather thresholds.

pub mod assemble;
pub mod config;
pub mod planner;
pub mod window;

pub use assemble::assemble_night;
pub use config::{PlannerSettings, SettingsError};
pub use planner::{Match, NightResult, Planner, DEFAULT_HORIZON_NIGHTS};
pub use window::{evaluate_darkness_filter, resolve_window, DarknessVerdict};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Time(#[from] dark_core::TimeError),

    #[error(transparent)]
    Weather(#[from] dark_weather::WeatherError),
}

pub type PlanResult<T> = Result<T, PlanError>;
