//! Position source abstraction and subscription handles.
//!
//! A source hands out a [`Subscription`] when it is watched. The source keeps
//! the matching [`SubscriptionFeed`] and pushes events into it from whatever
//! thread or callback the platform uses; the owner of the subscription drains
//! them on its own schedule.

use crate::position::types::{PositionError, PositionEvent, WatchOptions};
use crossbeam::channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A continuous location stream.
pub trait PositionSource: Send + Sync {
    /// Whether the platform offers a location stream at all.
    fn is_available(&self) -> bool;

    /// Start watching position with the given options.
    ///
    /// Returns `PositionError::Unavailable` when there is no capability.
    fn subscribe(&self, options: &WatchOptions) -> Result<Subscription, PositionError>;
}

/// Handle to an active position watch.
///
/// Cancelling is idempotent and also happens on drop, so a subscription can
/// never outlive its owner.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    events: Receiver<PositionEvent>,
    cancelled: Arc<AtomicBool>,
}

/// Producer half of a [`Subscription`], held by the source.
#[derive(Debug, Clone)]
pub struct SubscriptionFeed {
    events: Sender<PositionEvent>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    /// Create a subscription and the feed a source delivers into.
    pub fn channel() -> (Subscription, SubscriptionFeed) {
        let (tx, rx) = crossbeam::channel::unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));

        let subscription = Subscription {
            id: Uuid::new_v4(),
            events: rx,
            cancelled: cancelled.clone(),
        };
        let feed = SubscriptionFeed {
            events: tx,
            cancelled,
        };

        (subscription, feed)
    }

    /// Identifier of this watch.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop the watch. Safe to call any number of times.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("Position subscription {} released", self.id);
        }
    }

    /// Whether the watch has been stopped.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Take every event delivered so far without blocking.
    ///
    /// A cancelled subscription yields nothing, even if events were queued
    /// before the cancel.
    pub fn drain(&self) -> Vec<PositionEvent> {
        if self.is_cancelled() {
            return Vec::new();
        }
        self.events.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl SubscriptionFeed {
    /// Deliver an event. Returns `false` once the watch is gone.
    pub fn send(&self, event: PositionEvent) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.events.send(event).is_ok()
    }

    /// Whether the consumer has released the watch.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
