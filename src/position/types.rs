//! Position stream types.
//!
//! Raw fixes as the platform reports them, the watch options a stream is
//! opened with, and the errors a stream can surface.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A raw position fix as delivered by a position stream.
///
/// Altitude and speed are `None` when the platform does not report them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: Option<f64>,
    /// Ground speed in meters per second
    pub speed: Option<f64>,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

/// Options a position stream is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Ask the platform for its most accurate fixes
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back, in milliseconds
    pub maximum_age_ms: u64,
    /// How long to wait for a fix before reporting a timeout, in milliseconds
    pub timeout_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 0,
            timeout_ms: 10_000,
        }
    }
}

impl WatchOptions {
    /// The no-response timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// An event delivered through a subscription.
#[derive(Debug, Clone)]
pub enum PositionEvent {
    /// A new position fix
    Sample(RawPosition),
    /// The stream reported a (non-fatal) failure
    Error(PositionError),
}

/// Errors reported by a position stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    /// The platform has no location capability
    #[error("Location services are not available on this device")]
    Unavailable,

    /// The user denied or revoked location permission
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix arrived within the configured timeout
    #[error("Timed out waiting for a position fix after {0} ms")]
    Timeout(u64),

    /// The stream failed for another reason
    #[error("Position source failed: {0}")]
    SourceFailed(String),

    /// A backing file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// A backing file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<std::io::Error> for PositionError {
    fn from(err: std::io::Error) -> Self {
        PositionError::Io(err.to_string())
    }
}
