//! Shared narrative types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when a session is too short to describe.
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Not enough data to generate a journal.";

/// Shown when the API answered with no text.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Journal generation failed.";

/// Shown when the API call failed.
pub const UNAVAILABLE_MESSAGE: &str = "Could not generate journal at this time.";

/// Error types for narrative generation.
///
/// These never reach the display layer: the narrative service replaces each
/// of them with a fixed message.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// No API key configured
    #[error("API key not configured")]
    ApiKeyMissing,

    /// Request could not be sent or timed out
    #[error("HTTP error: {0}")]
    Http(String),

    /// API answered with an error
    #[error("Generative API error: {0}")]
    Api(String),

    /// Rate limited by the API
    #[error("Rate limited - try again later")]
    RateLimited,

    /// API answered without any text
    #[error("Generative API returned no text")]
    EmptyResponse,

    /// Response could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NarrativeError {
    fn from(err: serde_json::Error) -> Self {
        NarrativeError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NarrativeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NarrativeError::Serialization(err.to_string())
        } else {
            NarrativeError::Http(err.to_string())
        }
    }
}

/// Progress of journal generation, for the in-flight indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NarrativeStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A request is running
    Generating,
    /// The latest request has finished
    Ready,
}

/// A finished journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Request that produced this entry
    pub request_id: u64,
    /// Session the entry describes
    pub session_id: String,
    /// Prose to display
    pub text: String,
}
