//! Path data for the map renderer.

use crate::tracking::types::{LocationSample, TrackSession};
use serde::{Deserialize, Serialize};

/// Map centre used before any position is known (San Francisco).
pub const DEFAULT_MAP_CENTER: (f64, f64) = (37.7749, -122.4194);

/// What the map renderer draws: the travelled path and a position marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPath {
    /// `(lat, lng)` pairs in capture order
    pub points: Vec<(f64, f64)>,
    /// Marker for the most recent position
    pub current: Option<(f64, f64)>,
    /// Where the map should be centred
    pub center: (f64, f64),
}

/// Build the map data for a session and the latest observed position.
pub fn map_path(session: Option<&TrackSession>, current: Option<&LocationSample>) -> MapPath {
    let points = session
        .map(|s| s.samples().iter().map(LocationSample::coordinate).collect())
        .unwrap_or_default();
    let current = current.map(LocationSample::coordinate);

    MapPath {
        points,
        current,
        center: current.unwrap_or(DEFAULT_MAP_CENTER),
    }
}
