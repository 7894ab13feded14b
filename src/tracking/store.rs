//! Session store: the single owner of tracking state.
//!
//! Holds the tracking flag, the current session and the most recent sample,
//! and the subscription to the position stream while tracking. Every change
//! to a session goes through here; callers only ever get shared references.

use crate::position::source::{PositionSource, Subscription};
use crate::position::types::{PositionError, PositionEvent, RawPosition, WatchOptions};
use crate::tracking::types::{LocationSample, TrackSession, TrackingError, TrackingStatus};
use chrono::Utc;
use std::sync::Arc;

/// Outcome of draining the position stream once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Samples appended to the session
    pub recorded: usize,
    /// Samples dropped because tracking was off
    pub discarded: usize,
    /// Samples refused as invalid or out of order
    pub rejected: usize,
    /// Error events reported by the stream
    pub errors: usize,
}

/// Owner of the tracking flag and the current session.
pub struct SessionStore {
    /// Options used when opening the position stream
    options: WatchOptions,
    /// Location capability, if the platform has one
    source: Option<Arc<dyn PositionSource>>,
    /// Active watch while tracking
    subscription: Option<Subscription>,
    /// Current tracker status
    status: TrackingStatus,
    /// Current session
    session: Option<TrackSession>,
    /// Most recently accepted sample
    current_location: Option<LocationSample>,
    /// Last error reported by the stream
    last_source_error: Option<PositionError>,
    source_error_count: u32,
    rejected_count: u32,
}

impl SessionStore {
    /// Create a store with no location capability attached.
    pub fn new(options: WatchOptions) -> Self {
        Self {
            options,
            source: None,
            subscription: None,
            status: TrackingStatus::Idle,
            session: None,
            current_location: None,
            last_source_error: None,
            source_error_count: 0,
            rejected_count: 0,
        }
    }

    /// Create a store backed by a position source.
    pub fn with_source(options: WatchOptions, source: Arc<dyn PositionSource>) -> Self {
        let mut store = Self::new(options);
        store.source = Some(source);
        store
    }

    /// Attach or replace the position source.
    ///
    /// Takes effect at the next `start_tracking`.
    pub fn set_source(&mut self, source: Arc<dyn PositionSource>) {
        self.source = Some(source);
    }

    /// Start tracking.
    ///
    /// Does nothing if already tracking. Opens a new session when there is
    /// none or the current one has been finalized; otherwise keeps appending
    /// to the open session.
    pub fn start_tracking(&mut self) -> Result<(), TrackingError> {
        if self.is_tracking() {
            return Ok(());
        }

        let source = self.source.as_ref().ok_or_else(|| {
            tracing::warn!("Cannot start tracking: no position source attached");
            TrackingError::CapabilityUnavailable("no position source attached".to_string())
        })?;

        if !source.is_available() {
            tracing::warn!("Cannot start tracking: position source unavailable");
            return Err(TrackingError::CapabilityUnavailable(
                PositionError::Unavailable.to_string(),
            ));
        }

        let subscription = source.subscribe(&self.options).map_err(|e| {
            tracing::warn!("Cannot start tracking: {}", e);
            TrackingError::from(e)
        })?;

        let needs_session = self
            .session
            .as_ref()
            .map_or(true, |session| session.is_finalized());
        if needs_session {
            let session = TrackSession::new();
            tracing::info!("Started tracking session {}", session.id());
            self.session = Some(session);
            self.current_location = None;
        } else {
            tracing::info!("Resumed tracking");
        }

        self.subscription = Some(subscription);
        self.status = TrackingStatus::Tracking;
        Ok(())
    }

    /// Stop tracking and release the position stream.
    ///
    /// Samples stay in the session so they remain viewable. Calling this
    /// when not tracking is a no-op.
    pub fn stop_tracking(&mut self) {
        self.release_subscription();

        if self.status == TrackingStatus::Tracking {
            self.status = TrackingStatus::Stopped;
            tracing::info!(
                "Stopped tracking with {} samples",
                self.session.as_ref().map_or(0, |s| s.len())
            );
        }
    }

    /// Append a sample to the current session.
    ///
    /// Returns `Ok(false)` when tracking is off; the sample is discarded.
    /// Samples older than the last accepted one are rejected.
    pub fn record_sample(&mut self, sample: LocationSample) -> Result<bool, TrackingError> {
        if !self.is_tracking() {
            tracing::debug!("Discarding sample received while not tracking");
            return Ok(false);
        }

        let session = self.session.as_mut().ok_or(TrackingError::NoSession)?;

        if let Err(e) = session.push(sample) {
            self.rejected_count += 1;
            tracing::warn!("Rejected sample: {}", e);
            return Err(e);
        }

        self.current_location = Some(sample);
        tracing::debug!(
            "Recorded sample {} at ({:.5}, {:.5})",
            session.len(),
            sample.latitude(),
            sample.longitude()
        );
        Ok(true)
    }

    /// Validate a raw fix and record it.
    pub fn record_position(&mut self, raw: RawPosition) -> Result<bool, TrackingError> {
        if !self.is_tracking() {
            tracing::debug!("Discarding fix received while not tracking");
            return Ok(false);
        }

        let sample = LocationSample::try_from(raw).map_err(|e| {
            self.rejected_count += 1;
            tracing::warn!("Rejected fix: {}", e);
            e
        })?;
        self.record_sample(sample)
    }

    /// Report a stream error.
    ///
    /// Logged and remembered for display only; tracking continues and the
    /// session is untouched.
    pub fn on_source_error(&mut self, error: PositionError) {
        tracing::warn!("Position source error: {}", error);
        self.source_error_count += 1;
        self.last_source_error = Some(error);
    }

    /// React to every event the position stream has delivered so far.
    pub fn pump(&mut self) -> PumpReport {
        let events = self
            .subscription
            .as_ref()
            .map(|subscription| subscription.drain())
            .unwrap_or_default();

        let mut report = PumpReport::default();
        for event in events {
            match event {
                PositionEvent::Sample(raw) => match self.record_position(raw) {
                    Ok(true) => report.recorded += 1,
                    Ok(false) => report.discarded += 1,
                    Err(_) => report.rejected += 1,
                },
                PositionEvent::Error(error) => {
                    self.on_source_error(error);
                    report.errors += 1;
                }
            }
        }
        report
    }

    /// Stop tracking and close the current session with an end time.
    pub fn finalize_session(&mut self) -> Result<&TrackSession, TrackingError> {
        self.stop_tracking();

        let session = self.session.as_mut().ok_or(TrackingError::NoSession)?;
        if !session.is_finalized() {
            session.close(Utc::now().timestamp_millis());
            tracing::info!("Finalized session {} ({} samples)", session.id(), session.len());
        }
        self.status = TrackingStatus::Finalized;
        Ok(&*session)
    }

    /// Discard the current session and open a fresh, empty one.
    ///
    /// The tracking flag is left as it is.
    pub fn new_session(&mut self) -> &TrackSession {
        if let Some(old) = &self.session {
            tracing::info!("Discarding session {} ({} samples)", old.id(), old.len());
        }

        self.current_location = None;
        if self.status != TrackingStatus::Tracking {
            self.status = TrackingStatus::Stopped;
        }
        self.session.insert(TrackSession::new())
    }

    /// Attach a narrative summary to the current session.
    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), TrackingError> {
        let session = self.session.as_mut().ok_or(TrackingError::NoSession)?;
        session.set_summary(summary.into());
        Ok(())
    }

    /// Whether the position stream is being consumed.
    pub fn is_tracking(&self) -> bool {
        self.status == TrackingStatus::Tracking
    }

    /// Current tracker status.
    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    /// Read-only view of the current session.
    pub fn session(&self) -> Option<&TrackSession> {
        self.session.as_ref()
    }

    /// Most recently accepted sample.
    pub fn current_location(&self) -> Option<&LocationSample> {
        self.current_location.as_ref()
    }

    /// Last error reported by the position stream.
    pub fn last_source_error(&self) -> Option<&PositionError> {
        self.last_source_error.as_ref()
    }

    /// Number of stream errors seen.
    pub fn source_error_count(&self) -> u32 {
        self.source_error_count
    }

    /// Number of samples refused as invalid or out of order.
    pub fn rejected_count(&self) -> u32 {
        self.rejected_count
    }

    /// Whether a position watch is currently held.
    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    fn release_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(WatchOptions::default())
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.release_subscription();
    }
}
