//! Tracking types for session capture.
//!
//! Defines the immutable `LocationSample`, the append-only `TrackSession`,
//! the tracker status and the errors raised while capturing.

use crate::position::types::{PositionError, RawPosition};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Status of the session tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingStatus {
    /// No position stream attached
    #[default]
    Idle,
    /// Consuming the position stream
    Tracking,
    /// Stream released, session still open for viewing
    Stopped,
    /// Session closed with an end time
    Finalized,
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingStatus::Idle => write!(f, "Idle"),
            TrackingStatus::Tracking => write!(f, "Tracking"),
            TrackingStatus::Stopped => write!(f, "Stopped"),
            TrackingStatus::Finalized => write!(f, "Finalized"),
        }
    }
}

/// A single observed position.
///
/// Samples are validated on construction and cannot be changed afterwards.
/// `None` altitude or speed means the platform did not report one; zero is a
/// real reading. Deserializing goes through the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition", into = "RawPosition")]
pub struct LocationSample {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    speed: Option<f64>,
    captured_at_ms: i64,
}

impl LocationSample {
    /// Create a validated sample.
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        speed: Option<f64>,
        captured_at_ms: i64,
    ) -> Result<Self, TrackingError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TrackingError::InvalidSample(format!(
                "latitude {} out of range",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TrackingError::InvalidSample(format!(
                "longitude {} out of range",
                longitude
            )));
        }

        // Non-finite readings carry no information; treat them as unreported.
        Ok(Self {
            latitude,
            longitude,
            altitude: altitude.filter(|a| a.is_finite()),
            speed: speed.filter(|s| s.is_finite()),
            captured_at_ms,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude in meters, if reported.
    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    /// Speed in meters per second, if reported.
    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    /// Capture time in milliseconds since the Unix epoch.
    pub fn captured_at_ms(&self) -> i64 {
        self.captured_at_ms
    }

    /// The `(lat, lng)` pair for drawing.
    pub fn coordinate(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl TryFrom<RawPosition> for LocationSample {
    type Error = TrackingError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        LocationSample::new(
            raw.latitude,
            raw.longitude,
            raw.altitude,
            raw.speed,
            raw.timestamp_ms,
        )
    }
}

impl From<LocationSample> for RawPosition {
    fn from(sample: LocationSample) -> Self {
        RawPosition {
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: sample.altitude,
            speed: sample.speed,
            timestamp_ms: sample.captured_at_ms,
        }
    }
}

/// One continuous tracking run.
///
/// Only the session store mutates a session; everyone else sees it through
/// shared references.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSession {
    id: String,
    start_time_ms: i64,
    end_time_ms: Option<i64>,
    samples: Vec<LocationSample>,
    summary: Option<String>,
}

impl TrackSession {
    /// Create an empty session starting now.
    pub fn new() -> Self {
        Self::starting_at(Utc::now().timestamp_millis())
    }

    /// Create an empty session with an explicit start time.
    pub fn starting_at(start_time_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start_time_ms,
            end_time_ms: None,
            samples: Vec::new(),
            summary: None,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Start time in milliseconds since the Unix epoch.
    pub fn start_time_ms(&self) -> i64 {
        self.start_time_ms
    }

    /// End time, once the session has been finalized.
    pub fn end_time_ms(&self) -> Option<i64> {
        self.end_time_ms
    }

    /// Whether the session has been closed.
    pub fn is_finalized(&self) -> bool {
        self.end_time_ms.is_some()
    }

    /// Samples in capture order.
    pub fn samples(&self) -> &[LocationSample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been captured.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First captured sample.
    pub fn first(&self) -> Option<&LocationSample> {
        self.samples.first()
    }

    /// Most recently captured sample.
    pub fn last(&self) -> Option<&LocationSample> {
        self.samples.last()
    }

    /// Narrative summary, if one has been generated.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub(crate) fn push(&mut self, sample: LocationSample) -> Result<(), TrackingError> {
        if let Some(last) = self.samples.last() {
            if sample.captured_at_ms < last.captured_at_ms {
                return Err(TrackingError::OutOfOrder {
                    captured_at_ms: sample.captured_at_ms,
                    last_ms: last.captured_at_ms,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub(crate) fn close(&mut self, end_time_ms: i64) {
        self.end_time_ms = Some(end_time_ms.max(self.start_time_ms));
    }

    pub(crate) fn set_summary(&mut self, summary: String) {
        self.summary = Some(summary);
    }
}

impl Default for TrackSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from the session tracker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    /// No location capability to track with
    #[error("Location tracking is not available: {0}")]
    CapabilityUnavailable(String),

    /// Sample coordinates are outside the valid range
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// Sample is older than the last one captured
    #[error("Sample at {captured_at_ms} ms is older than last sample at {last_ms} ms")]
    OutOfOrder {
        /// Capture time of the rejected sample
        captured_at_ms: i64,
        /// Capture time of the newest accepted sample
        last_ms: i64,
    },

    /// Operation needs a session but none exists
    #[error("No tracking session")]
    NoSession,
}

impl From<PositionError> for TrackingError {
    fn from(err: PositionError) -> Self {
        TrackingError::CapabilityUnavailable(err.to_string())
    }
}
