//! Trekline - Location Tracking Core
//!
//! Records geographic positions during a tracking session, derives altitude
//! statistics and an elevation profile, prepares path data for a map, and
//! asks a generative-text API for a short journal entry about the trip.

pub mod narrative;
pub mod position;
pub mod stats;
pub mod storage;
pub mod tracking;

// Re-export commonly used types
pub use narrative::{GeminiClient, NarrativeService};
pub use position::{GpxReplaySource, PositionSource};
pub use storage::config::AppConfig;
pub use tracking::{LocationSample, SessionStore, TrackSession};
