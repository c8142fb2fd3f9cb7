//! Filter window resolution and the darkness filter verdict

use chrono::{Datelike, Duration};

use dark_core::{overlap_with_window, FilterConfig, FilterEdge, Instant, Interval, NightRecord};

/// Outcome of the darkness filter for one night.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DarknessVerdict {
    /// Absent when an astronomical edge the filter refers to is missing.
    pub window: Option<Interval>,
    pub overlap_minutes: i64,
    pub day_of_week_match: bool,
    pub darkness_pass: bool,
}

fn edge_instant(edge: FilterEdge, record: &NightRecord) -> Option<Instant> {
    match edge {
        FilterEdge::AstrStart => record.astr_start,
        FilterEdge::AstrEnd => record.astr_end,
        FilterEdge::Hour(h) => Some(record.mid0 + Duration::hours(i64::from(h))),
    }
}

/// Build the evaluation window for a night.
///
/// `None` when a referenced astronomical edge is absent (polar nights,
/// bright summer nights). A window ending at or before its start is a
/// cross-midnight window and gets 24 hours added to the end.
pub fn resolve_window(filter: &FilterConfig, record: &NightRecord) -> Option<Interval> {
    let start = edge_instant(filter.from_edge, record)?;
    let mut end = edge_instant(filter.to_edge, record)?;
    if end <= start {
        end += Duration::hours(24);
    }
    Some(Interval::new(start, end))
}

/// Apply the darkness filter: day-of-week predicate plus minimum overlap of
/// full darkness with the window.
pub fn evaluate_darkness_filter(
    filter: &FilterConfig,
    record: &NightRecord,
    darkness: &[Interval],
) -> DarknessVerdict {
    let window = resolve_window(filter, record);
    let overlap_minutes = window
        .as_ref()
        .map(|w| overlap_with_window(darkness, w))
        .unwrap_or(0);
    let day_of_week_match = filter.day_allowed(record.date.weekday());
    let darkness_pass = day_of_week_match && overlap_minutes >= i64::from(filter.min_minutes);

    DarknessVerdict {
        window,
        overlap_minutes,
        day_of_week_match,
        darkness_pass,
    }
}
