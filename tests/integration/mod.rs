//! Integration test modules.

mod narrative_test;
mod position_mock;
mod tracking_session_test;
