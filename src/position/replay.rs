//! GPX-backed position source.
//!
//! Replays the fixes of a recorded GPX file as if they were arriving from a
//! live location stream, one fix per interval on a background thread.

use crate::position::source::{PositionSource, Subscription, SubscriptionFeed};
use crate::position::types::{PositionError, PositionEvent, RawPosition, WatchOptions};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;

/// Convert gpx Time to chrono DateTime
fn gpx_time_to_chrono(time: gpx::Time) -> Option<DateTime<Utc>> {
    // gpx::Time wraps time::OffsetDateTime, convert via string format
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn waypoint_to_raw(point: &gpx::Waypoint) -> (RawPosition, bool) {
    let timestamp = point.time.clone().and_then(gpx_time_to_chrono);
    let raw = RawPosition {
        latitude: point.point().y(),
        longitude: point.point().x(),
        altitude: point.elevation,
        speed: point.speed,
        timestamp_ms: timestamp.map(|t| t.timestamp_millis()).unwrap_or(0),
    };
    (raw, timestamp.is_some())
}

/// Parse GPX content into raw fixes.
///
/// Track points are preferred, then route points, then loose waypoints.
/// Fixes without a time are stamped at one-second spacing after the last
/// timed fix (or the Unix epoch when none are timed).
pub fn parse_gpx(content: &[u8]) -> Result<Vec<RawPosition>, PositionError> {
    let gpx_data: gpx::Gpx =
        gpx::read(content).map_err(|e| PositionError::Parse(format!("GPX parse error: {}", e)))?;

    let mut points: Vec<(RawPosition, bool)> = gpx_data
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(waypoint_to_raw)
        .collect();

    if points.is_empty() {
        points = gpx_data
            .routes
            .iter()
            .flat_map(|route| route.points.iter())
            .map(waypoint_to_raw)
            .collect();
    }

    if points.is_empty() {
        points = gpx_data.waypoints.iter().map(waypoint_to_raw).collect();
    }

    if points.is_empty() {
        return Err(PositionError::Parse(
            "No GPS points found in GPX file".to_string(),
        ));
    }

    let mut last_ms: Option<i64> = None;
    let fixes = points
        .into_iter()
        .map(|(mut raw, timed)| {
            if !timed {
                raw.timestamp_ms = last_ms.map(|ms| ms + 1000).unwrap_or(0);
            }
            last_ms = Some(raw.timestamp_ms);
            raw
        })
        .collect();

    Ok(fixes)
}

/// A position source that replays a recorded track.
#[derive(Debug, Clone)]
pub struct GpxReplaySource {
    fixes: Vec<RawPosition>,
    interval: Duration,
}

impl GpxReplaySource {
    /// Build a replay source from already-parsed fixes.
    pub fn new(fixes: Vec<RawPosition>, interval: Duration) -> Self {
        Self { fixes, interval }
    }

    /// Load a replay source from a GPX file on disk.
    pub fn from_path(path: &Path, interval: Duration) -> Result<Self, PositionError> {
        let content = std::fs::read(path)?;
        let fixes = parse_gpx(&content)?;
        tracing::info!(
            "Loaded {} fixes from {} for replay",
            fixes.len(),
            path.display()
        );
        Ok(Self::new(fixes, interval))
    }

    /// Number of fixes this source will deliver.
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Whether there is nothing to replay.
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    fn replay(fixes: Vec<RawPosition>, interval: Duration, feed: SubscriptionFeed) {
        for fix in fixes {
            if !feed.send(PositionEvent::Sample(fix)) {
                tracing::debug!("Replay stopped: subscription released");
                return;
            }
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        tracing::debug!("Replay finished");
    }
}

impl PositionSource for GpxReplaySource {
    fn is_available(&self) -> bool {
        !self.fixes.is_empty()
    }

    fn subscribe(&self, options: &WatchOptions) -> Result<Subscription, PositionError> {
        if !self.is_available() {
            return Err(PositionError::Unavailable);
        }

        // A replayed track is as accurate as it will ever be, so only the
        // pacing is honoured here.
        tracing::debug!(
            "Replaying track (high_accuracy={}, timeout={:?})",
            options.high_accuracy,
            options.timeout()
        );

        let (subscription, feed) = Subscription::channel();
        let fixes = self.fixes.clone();
        let interval = self.interval;

        std::thread::Builder::new()
            .name("gpx-replay".to_string())
            .spawn(move || Self::replay(fixes, interval, feed))
            .map_err(|e| PositionError::SourceFailed(e.to_string()))?;

        Ok(subscription)
    }
}
