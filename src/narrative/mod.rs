//! Narrative module: AI-written journal entries for tracked sessions.

pub mod client;
pub mod prompt;
pub mod service;
pub mod types;

pub use client::{GeminiClient, NarrativeClient};
pub use prompt::build_prompt;
pub use service::NarrativeService;
pub use types::{
    JournalEntry, NarrativeError, NarrativeStatus, EMPTY_RESPONSE_MESSAGE,
    INSUFFICIENT_DATA_MESSAGE, UNAVAILABLE_MESSAGE,
};
