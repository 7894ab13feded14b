//! Scriptable position source for integration tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use trekline::position::{
    PositionError, PositionEvent, PositionSource, RawPosition, Subscription, SubscriptionFeed,
    WatchOptions,
};

/// Position source driven by the test: fixes and errors are pushed by hand.
pub struct MockPositionSource {
    available: AtomicBool,
    feed: Mutex<Option<SubscriptionFeed>>,
    subscribe_count: AtomicUsize,
}

impl MockPositionSource {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            feed: Mutex::new(None),
            subscribe_count: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        let source = Self::new();
        source.available.store(false, Ordering::SeqCst);
        source
    }

    /// Deliver a fix. Returns `false` if no one is watching.
    pub fn push_fix(&self, latitude: f64, longitude: f64, altitude: Option<f64>, ts: i64) -> bool {
        self.push(PositionEvent::Sample(RawPosition {
            latitude,
            longitude,
            altitude,
            speed: Some(1.2),
            timestamp_ms: ts,
        }))
    }

    pub fn push_error(&self, error: PositionError) -> bool {
        self.push(PositionEvent::Error(error))
    }

    /// Whether the last watch handed out has been released.
    pub fn is_released(&self) -> bool {
        self.feed
            .lock()
            .unwrap()
            .as_ref()
            .map_or(true, |feed| feed.is_cancelled())
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }

    fn push(&self, event: PositionEvent) -> bool {
        self.feed
            .lock()
            .unwrap()
            .as_ref()
            .map_or(false, |feed| feed.send(event))
    }
}

impl PositionSource for MockPositionSource {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn subscribe(&self, _options: &WatchOptions) -> Result<Subscription, PositionError> {
        if !self.is_available() {
            return Err(PositionError::Unavailable);
        }
        let (subscription, feed) = Subscription::channel();
        *self.feed.lock().unwrap() = Some(feed);
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        Ok(subscription)
    }
}
