//! Core data types, interval arithmetic, and time-zone service for the
//! darkness planner
//!
//! This crate provides the shared data model for night planning: locations,
//! filter configuration, night records, and the instant/wall-clock boundary.
//! All internal arithmetic uses UTC instants; wall-clock values exist only at
//! the edges (user input, forecast index keys, formatting).

pub mod interval;
pub mod timezone;
pub mod types;
pub mod units;

pub use interval::*;
pub use timezone::*;
pub use types::*;
pub use units::*;
