//! Tracking module for session capture.

pub mod store;
pub mod types;

pub use store::{PumpReport, SessionStore};
pub use types::{LocationSample, TrackSession, TrackingError, TrackingStatus};
