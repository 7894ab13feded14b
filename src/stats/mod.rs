//! Statistics derived from a track session, and the data renderers consume.

pub mod derived;
pub mod map;

pub use derived::{
    altitude_range, current_altitude, duration_seconds_at, elevation_series, format_altitude,
    peak_altitude, summary_context, summary_context_at, AltitudeRange, ElevationPoint,
    SessionSummary, SummaryContext, DEFAULT_CHART_STRIDE, MIN_SUMMARY_SAMPLES,
};
pub use map::{map_path, MapPath, DEFAULT_MAP_CENTER};
