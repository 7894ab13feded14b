//! Journal generation with fallbacks and in-flight tracking.
//!
//! Generation runs as a tokio task so sample ingestion is never held up by
//! a slow API. Only one request is live at a time: a new request supersedes
//! (aborts) the one in flight, and a superseded result is never surfaced.

use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;

use super::client::NarrativeClient;
use super::prompt::build_prompt;
use super::types::{
    JournalEntry, NarrativeStatus, EMPTY_RESPONSE_MESSAGE, INSUFFICIENT_DATA_MESSAGE,
    UNAVAILABLE_MESSAGE,
};
use crate::stats::derived::{summary_context, SummaryContext};
use crate::tracking::store::SessionStore;
use crate::tracking::types::{TrackSession, TrackingError};

struct PendingRequest {
    id: u64,
    session_id: String,
    handle: JoinHandle<String>,
}

/// Produces journal entries for sessions.
pub struct NarrativeService<C: NarrativeClient + 'static> {
    client: Arc<C>,
    pending: Option<PendingRequest>,
    latest: Option<JournalEntry>,
    next_request_id: u64,
}

impl<C: NarrativeClient + 'static> NarrativeService<C> {
    /// Create a service around a client.
    pub fn new(client: C) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    /// Create a service around a shared client.
    pub fn with_shared_client(client: Arc<C>) -> Self {
        Self {
            client,
            pending: None,
            latest: None,
            next_request_id: 1,
        }
    }

    /// Generate a journal entry for a context. Never fails.
    ///
    /// With insufficient data the client is not called at all.
    pub async fn generate(&self, context: &SummaryContext) -> String {
        generate_with(self.client.as_ref(), context).await
    }

    /// Start generating a journal entry for a snapshot of `session`.
    ///
    /// Any request still in flight is aborted. Returns the id of the new
    /// request. Outside a tokio runtime the request finishes at once with
    /// the unavailable message.
    pub fn request(&mut self, session: &TrackSession) -> u64 {
        let context = summary_context(session);

        if let Some(previous) = self.pending.take() {
            tracing::info!("Journal request {} superseded", previous.id);
            previous.handle.abort();
        }

        let id = self.next_request_id;
        self.next_request_id += 1;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Journal request {} not started: {}", id, e);
                self.finish(id, session.id().to_string(), UNAVAILABLE_MESSAGE.to_string());
                return id;
            }
        };

        let client = self.client.clone();
        let handle = runtime.spawn(async move { generate_with(client.as_ref(), &context).await });

        tracing::debug!("Journal request {} started for session {}", id, session.id());
        self.pending = Some(PendingRequest {
            id,
            session_id: session.id().to_string(),
            handle,
        });
        id
    }

    /// Collect the result of the request in flight if it has finished.
    ///
    /// Does not wait.
    pub fn poll(&mut self) -> Option<&JournalEntry> {
        let finished = self
            .pending
            .as_ref()
            .map_or(false, |pending| pending.handle.is_finished());
        if !finished {
            return None;
        }

        let mut pending = self.pending.take()?;
        let outcome = (&mut pending.handle).now_or_never();
        let text = match outcome {
            Some(result) => result.unwrap_or_else(|e| {
                tracing::warn!("Journal task failed: {}", e);
                UNAVAILABLE_MESSAGE.to_string()
            }),
            None => {
                self.pending = Some(pending);
                return None;
            }
        };

        self.finish(pending.id, pending.session_id, text)
    }

    /// Wait for the request in flight to finish.
    pub async fn wait(&mut self) -> Option<&JournalEntry> {
        let pending = self.pending.take()?;
        let text = pending.handle.await.unwrap_or_else(|e| {
            tracing::warn!("Journal task failed: {}", e);
            UNAVAILABLE_MESSAGE.to_string()
        });

        self.finish(pending.id, pending.session_id, text)
    }

    /// Abort the request in flight, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            tracing::debug!("Journal request {} cancelled", pending.id);
        }
    }

    /// State for the in-flight indicator.
    ///
    /// Follows the task itself: a request that has finished but not yet
    /// been collected reads as ready.
    pub fn status(&self) -> NarrativeStatus {
        if self.is_generating() {
            NarrativeStatus::Generating
        } else if self.pending.is_some() || self.latest.is_some() {
            NarrativeStatus::Ready
        } else {
            NarrativeStatus::Idle
        }
    }

    /// Whether a request is still running.
    pub fn is_generating(&self) -> bool {
        self.pending
            .as_ref()
            .map_or(false, |pending| !pending.handle.is_finished())
    }

    /// The most recently collected entry.
    pub fn latest(&self) -> Option<&JournalEntry> {
        self.latest.as_ref()
    }

    fn finish(&mut self, id: u64, session_id: String, text: String) -> Option<&JournalEntry> {
        tracing::info!("Journal request {} finished", id);
        self.latest = Some(JournalEntry {
            request_id: id,
            session_id,
            text,
        });
        self.latest.as_ref()
    }
}

impl<C: NarrativeClient + 'static> Drop for NarrativeService<C> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl JournalEntry {
    /// Store this entry as the summary of the session it describes.
    ///
    /// Returns `Ok(false)` when the store has moved on to another session.
    pub fn apply_to(&self, store: &mut SessionStore) -> Result<bool, TrackingError> {
        let current = store.session().ok_or(TrackingError::NoSession)?;
        if current.id() != self.session_id {
            tracing::debug!("Journal for session {} no longer current", self.session_id);
            return Ok(false);
        }
        store.set_summary(self.text.clone())?;
        Ok(true)
    }
}

async fn generate_with<C: NarrativeClient>(client: &C, context: &SummaryContext) -> String {
    let summary = match context {
        SummaryContext::InsufficientData { sample_count } => {
            tracing::info!("Skipping journal: only {} samples", sample_count);
            return INSUFFICIENT_DATA_MESSAGE.to_string();
        }
        SummaryContext::Ready(summary) => summary,
    };

    let prompt = build_prompt(summary);

    match client.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!("Journal generation returned no text");
            EMPTY_RESPONSE_MESSAGE.to_string()
        }
        Err(e) => {
            tracing::warn!("Journal generation failed: {}", e);
            UNAVAILABLE_MESSAGE.to_string()
        }
    }
}
