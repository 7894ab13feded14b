//! Integration tests for journal generation against a scripted client

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trekline::narrative::{
    NarrativeClient, NarrativeError, NarrativeService, NarrativeStatus, EMPTY_RESPONSE_MESSAGE,
    INSUFFICIENT_DATA_MESSAGE, UNAVAILABLE_MESSAGE,
};
use trekline::position::WatchOptions;
use trekline::stats::summary_context;
use trekline::tracking::{LocationSample, SessionStore, TrackSession};

use super::position_mock::MockPositionSource;

/// Client answering every prompt with a fixed reply, or an error.
struct ScriptedClient {
    reply: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedClient {
    fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    fn slow(text: &str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::replying(text)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NarrativeClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.reply
            .clone()
            .ok_or_else(|| NarrativeError::Api("service unavailable".to_string()))
    }
}

fn store_with_samples(count: usize) -> SessionStore {
    let mut store =
        SessionStore::with_source(WatchOptions::default(), Arc::new(MockPositionSource::new()));
    store.start_tracking().unwrap();
    for i in 0..count {
        let sample = LocationSample::new(
            35.3606 + i as f64 * 0.001,
            138.7274,
            Some(2300.0 + i as f64 * 50.0),
            Some(0.9),
            1_700_000_000_000 + i as i64 * 60_000,
        )
        .unwrap();
        store.record_sample(sample).unwrap();
    }
    store
}

fn session(store: &SessionStore) -> &TrackSession {
    store.session().unwrap()
}

#[tokio::test]
async fn test_short_session_skips_client() {
    let client = Arc::new(ScriptedClient::replying("unused"));
    let service = NarrativeService::with_shared_client(client.clone());
    let store = store_with_samples(1);

    let text = service.generate(&summary_context(session(&store))).await;

    assert_eq!(text, INSUFFICIENT_DATA_MESSAGE);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_reply_is_trimmed() {
    let client = Arc::new(ScriptedClient::replying("  Snow gave way to cedar forest.\n"));
    let service = NarrativeService::with_shared_client(client.clone());
    let store = store_with_samples(3);

    let text = service.generate(&summary_context(session(&store))).await;

    assert_eq!(text, "Snow gave way to cedar forest.");
    assert_eq!(client.calls(), 1);

    let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("35.3606"));
    assert!(prompt.contains("2400.0m"));
}

#[tokio::test]
async fn test_blank_reply_uses_fallback() {
    let service = NarrativeService::new(ScriptedClient::replying("   "));
    let store = store_with_samples(2);

    let text = service.generate(&summary_context(session(&store))).await;
    assert_eq!(text, EMPTY_RESPONSE_MESSAGE);
}

#[tokio::test]
async fn test_client_error_uses_fallback() {
    let service = NarrativeService::new(ScriptedClient::failing());
    let store = store_with_samples(2);

    let text = service.generate(&summary_context(session(&store))).await;
    assert_eq!(text, UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn test_status_follows_request() {
    let mut service = NarrativeService::new(ScriptedClient::replying("A fine morning."));
    let store = store_with_samples(2);
    assert_eq!(service.status(), NarrativeStatus::Idle);

    service.request(session(&store));
    assert_eq!(service.status(), NarrativeStatus::Generating);
    assert!(service.is_generating());

    let entry = service.wait().await.unwrap();
    assert_eq!(entry.text, "A fine morning.");
    assert_eq!(service.status(), NarrativeStatus::Ready);
    assert!(!service.is_generating());
}

#[tokio::test]
async fn test_status_ready_once_task_finishes() {
    let mut service = NarrativeService::new(ScriptedClient::replying("Quick one."));
    let store = store_with_samples(2);

    service.request(session(&store));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!service.is_generating());
    assert_eq!(service.status(), NarrativeStatus::Ready);
    assert!(service.latest().is_none());

    let entry = service.poll().unwrap();
    assert_eq!(entry.text, "Quick one.");
}

#[test]
fn test_request_outside_runtime_falls_back() {
    let client = Arc::new(ScriptedClient::replying("unused"));
    let mut service = NarrativeService::with_shared_client(client.clone());
    let store = store_with_samples(2);

    let id = service.request(session(&store));

    let entry = service.latest().unwrap();
    assert_eq!(entry.request_id, id);
    assert_eq!(entry.text, UNAVAILABLE_MESSAGE);
    assert_eq!(service.status(), NarrativeStatus::Ready);
    assert!(!service.is_generating());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_poll_collects_finished_request() {
    let mut service = NarrativeService::new(ScriptedClient::replying("Done."));
    let store = store_with_samples(2);
    service.request(session(&store));

    let mut collected = None;
    for _ in 0..100 {
        if let Some(entry) = service.poll() {
            collected = Some(entry.text.clone());
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(collected.as_deref(), Some("Done."));
    assert_eq!(service.status(), NarrativeStatus::Ready);
}

#[tokio::test]
async fn test_new_request_supersedes_old() {
    let client = Arc::new(ScriptedClient::slow("Second pass.", Duration::from_millis(20)));
    let mut service = NarrativeService::with_shared_client(client);
    let store = store_with_samples(3);

    let first = service.request(session(&store));
    let second = service.request(session(&store));
    assert!(second > first);

    let entry = service.wait().await.unwrap();
    assert_eq!(entry.request_id, second);
    assert!(service.wait().await.is_none());
    assert_eq!(service.latest().unwrap().request_id, second);
}

#[tokio::test]
async fn test_cancel_drops_request() {
    let mut service = NarrativeService::new(ScriptedClient::slow(
        "Never shown.",
        Duration::from_millis(50),
    ));
    let store = store_with_samples(2);

    service.request(session(&store));
    service.cancel();

    assert_eq!(service.status(), NarrativeStatus::Idle);
    assert!(service.wait().await.is_none());
    assert!(service.latest().is_none());
}

#[tokio::test]
async fn test_tracking_continues_while_generating() {
    let mut service = NarrativeService::new(ScriptedClient::slow(
        "Climbing steadily.",
        Duration::from_millis(30),
    ));
    let mut store = store_with_samples(3);

    service.request(session(&store));
    let extra = LocationSample::new(35.37, 138.73, Some(2600.0), None, 1_800_000_000_000).unwrap();
    assert!(store.record_sample(extra).unwrap());
    assert!(service.is_generating());
    assert_eq!(session(&store).len(), 4);

    let entry = service.wait().await.unwrap().clone();
    assert!(entry.apply_to(&mut store).unwrap());
    assert_eq!(session(&store).summary(), Some("Climbing steadily."));
}

#[tokio::test]
async fn test_entry_for_discarded_session_not_applied() {
    let mut service = NarrativeService::new(ScriptedClient::replying("Old news."));
    let mut store = store_with_samples(2);

    service.request(session(&store));
    let entry = service.wait().await.unwrap().clone();

    store.new_session();
    assert!(!entry.apply_to(&mut store).unwrap());
    assert_eq!(session(&store).summary(), None);
}
