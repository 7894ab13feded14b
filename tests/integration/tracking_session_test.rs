//! Integration tests for a full tracking session driven by a position stream

use std::sync::Arc;

use trekline::position::{PositionError, WatchOptions};
use trekline::stats::{elevation_series, map_path, peak_altitude, summary_context};
use trekline::tracking::{SessionStore, TrackingStatus};

use super::position_mock::MockPositionSource;

fn store_with(source: &Arc<MockPositionSource>) -> SessionStore {
    SessionStore::with_source(WatchOptions::default(), source.clone())
}

#[test]
fn test_stream_fills_session() {
    let source = Arc::new(MockPositionSource::new());
    let mut store = store_with(&source);
    store.start_tracking().unwrap();
    assert_eq!(source.subscribe_count(), 1);

    for i in 0..10 {
        assert!(source.push_fix(
            27.9881 + i as f64 * 0.0001,
            86.9250,
            Some(5000.0 + i as f64 * 10.0),
            1_700_000_000_000 + i * 1000,
        ));
    }

    let report = store.pump();
    assert_eq!(report.recorded, 10);
    assert_eq!(report.rejected, 0);

    let session = store.session().unwrap();
    assert_eq!(session.len(), 10);
    assert_eq!(peak_altitude(session), Some(5090.0));
    assert_eq!(elevation_series(session, 5).len(), 2);
    assert!(summary_context(session).is_ready());

    let path = map_path(Some(session), store.current_location());
    assert_eq!(path.points.len(), 10);
    assert_eq!(path.current, path.points.last().copied());
}

#[test]
fn test_late_fixes_after_stop_are_ignored() {
    let source = Arc::new(MockPositionSource::new());
    let mut store = store_with(&source);
    store.start_tracking().unwrap();

    source.push_fix(10.0, 10.0, None, 1000);
    store.pump();
    store.stop_tracking();

    assert!(source.is_released());
    assert!(!source.push_fix(10.1, 10.1, None, 2000));

    let report = store.pump();
    assert_eq!(report.recorded, 0);
    assert_eq!(store.session().unwrap().len(), 1);
    assert_eq!(store.status(), TrackingStatus::Stopped);
}

#[test]
fn test_dropping_store_releases_watch() {
    let source = Arc::new(MockPositionSource::new());
    {
        let mut store = store_with(&source);
        store.start_tracking().unwrap();
        assert!(!source.is_released());
    }
    assert!(source.is_released());
}

#[test]
fn test_stream_errors_keep_tracking() {
    let source = Arc::new(MockPositionSource::new());
    let mut store = store_with(&source);
    store.start_tracking().unwrap();

    source.push_fix(-1.2921, 36.8219, Some(1795.0), 1000);
    source.push_error(PositionError::Timeout(10_000));
    source.push_fix(-1.2922, 36.8220, Some(1797.0), 2000);

    let report = store.pump();
    assert_eq!(report.recorded, 2);
    assert_eq!(report.errors, 1);
    assert!(store.is_tracking());
    assert_eq!(store.session().unwrap().len(), 2);
    assert_eq!(store.source_error_count(), 1);
}

#[test]
fn test_out_of_order_fix_counted_as_rejected() {
    let source = Arc::new(MockPositionSource::new());
    let mut store = store_with(&source);
    store.start_tracking().unwrap();

    source.push_fix(0.0, 0.0, None, 5000);
    source.push_fix(0.0, 0.0, None, 4000);
    source.push_fix(0.0, 0.0, None, 5000);

    let report = store.pump();
    assert_eq!(report.recorded, 2);
    assert_eq!(report.rejected, 1);
}

#[test]
fn test_unavailable_source_never_tracks() {
    let source = Arc::new(MockPositionSource::unavailable());
    let mut store = store_with(&source);

    assert!(store.start_tracking().is_err());
    assert!(!store.is_tracking());
    assert_eq!(source.subscribe_count(), 0);
    assert_eq!(store.pump().recorded, 0);
}

#[test]
fn test_finalize_then_start_opens_new_session() {
    let source = Arc::new(MockPositionSource::new());
    let mut store = store_with(&source);
    store.start_tracking().unwrap();

    source.push_fix(51.5074, -0.1278, Some(11.0), 1000);
    store.pump();
    let first = store.finalize_session().unwrap().id().to_string();
    assert!(source.is_released());

    store.start_tracking().unwrap();
    assert_eq!(source.subscribe_count(), 2);
    source.push_fix(51.5075, -0.1279, Some(12.0), 500);
    store.pump();

    let session = store.session().unwrap();
    assert_ne!(session.id(), first);
    assert_eq!(session.len(), 1);
    assert_eq!(session.end_time_ms(), None);
}
