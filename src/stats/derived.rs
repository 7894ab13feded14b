//! Derived statistics over a track session.
//!
//! Every function here takes a shared reference to a session and returns
//! fresh values; none of them can change the samples. All of them are safe
//! to call on an empty session.

use crate::tracking::types::TrackSession;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default stride for the elevation chart (every 5th sample).
pub const DEFAULT_CHART_STRIDE: usize = 5;

/// Minimum number of samples needed to summarise a session.
pub const MIN_SUMMARY_SAMPLES: usize = 2;

/// One point of the elevation chart.
///
/// Unknown altitude or speed is drawn as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    /// Index of the sample in the session
    pub index: usize,
    /// Altitude in meters, 0 when unknown
    pub altitude: f64,
    /// Speed in meters per second, 0 when unknown
    pub speed: f64,
}

/// Altitude information for a summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AltitudeRange {
    /// At least one sample reported altitude
    Range {
        /// Lowest altitude in meters
        min: f64,
        /// Highest altitude in meters
        max: f64,
    },
    /// No sample reported altitude
    Unavailable,
}

/// Summary statistics handed to the narrative service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session duration in seconds
    pub duration_seconds: f64,
    /// First `(lat, lng)` of the path
    pub start: (f64, f64),
    /// Last `(lat, lng)` of the path
    pub end: (f64, f64),
    /// Altitude span over samples that reported one
    pub altitude: AltitudeRange,
    /// Number of samples summarised
    pub sample_count: usize,
}

impl SessionSummary {
    /// Duration in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}

/// Input for narrative generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SummaryContext {
    /// Too few samples to say anything about the trip
    InsufficientData {
        /// Samples available
        sample_count: usize,
    },
    /// Enough data for a summary
    Ready(SessionSummary),
}

impl SummaryContext {
    /// Whether the context carries a usable summary.
    pub fn is_ready(&self) -> bool {
        matches!(self, SummaryContext::Ready(_))
    }
}

/// Altitude of the last sample, if it reported one.
pub fn current_altitude(session: &TrackSession) -> Option<f64> {
    session.last().and_then(|sample| sample.altitude())
}

/// Highest altitude among samples that reported one.
pub fn peak_altitude(session: &TrackSession) -> Option<f64> {
    session
        .samples()
        .iter()
        .filter_map(|sample| sample.altitude())
        .fold(None, |peak, alt| match peak {
            Some(p) if p >= alt => Some(p),
            _ => Some(alt),
        })
}

/// Lowest and highest altitude among samples that reported one.
pub fn altitude_range(session: &TrackSession) -> AltitudeRange {
    let mut altitudes = session.samples().iter().filter_map(|s| s.altitude());

    match altitudes.next() {
        Some(first) => {
            let (min, max) = altitudes.fold((first, first), |(min, max), alt| {
                (min.min(alt), max.max(alt))
            });
            AltitudeRange::Range { min, max }
        }
        None => AltitudeRange::Unavailable,
    }
}

/// Every `stride`-th sample as a chart point, starting from the first.
///
/// A stride of zero is treated as one.
pub fn elevation_series(session: &TrackSession, stride: usize) -> Vec<ElevationPoint> {
    session
        .samples()
        .iter()
        .enumerate()
        .step_by(stride.max(1))
        .map(|(index, sample)| ElevationPoint {
            index,
            altitude: sample.altitude().unwrap_or(0.0),
            speed: sample.speed().unwrap_or(0.0),
        })
        .collect()
}

/// Session duration in seconds, up to the end time or `now_ms` if still open.
pub fn duration_seconds_at(session: &TrackSession, now_ms: i64) -> f64 {
    let end = session.end_time_ms().unwrap_or(now_ms);
    (end - session.start_time_ms()).max(0) as f64 / 1000.0
}

/// Build the narrative context as of now.
pub fn summary_context(session: &TrackSession) -> SummaryContext {
    summary_context_at(session, Utc::now().timestamp_millis())
}

/// Build the narrative context as of `now_ms`.
pub fn summary_context_at(session: &TrackSession, now_ms: i64) -> SummaryContext {
    let (first, last) = match (session.first(), session.last()) {
        (Some(first), Some(last)) if session.len() >= MIN_SUMMARY_SAMPLES => (first, last),
        _ => {
            return SummaryContext::InsufficientData {
                sample_count: session.len(),
            }
        }
    };

    SummaryContext::Ready(SessionSummary {
        duration_seconds: duration_seconds_at(session, now_ms),
        start: first.coordinate(),
        end: last.coordinate(),
        altitude: altitude_range(session),
        sample_count: session.len(),
    })
}

/// Format an altitude for display: whole meters, or "-" when unknown.
pub fn format_altitude(altitude: Option<f64>) -> String {
    match altitude {
        Some(alt) => format!("{:.0}", alt),
        None => "-".to_string(),
    }
}
