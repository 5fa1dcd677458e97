//! Daily engagement recorder tests.
//!
//! Tests cover: the presence rule, duplicate-submission semantics, explicit
//! day routing, input validation, and card-type inference.

use chrono::{DateTime, NaiveDate, Utc};
use engage_core::{
    clock::EngageClock,
    config::EngageConfig,
    content::{CardType, StaticContentProvider},
    engagement_subsystem::{EngagementKind, TrackEngagement},
    engine::EngageEngine,
    error::EngageError,
    store::EngageStore,
};

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid test timestamp")
        .with_timezone(&Utc)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

fn build_at(now: &str) -> EngageEngine {
    let store = EngageStore::in_memory().expect("open in-memory store");
    store.migrate().expect("apply migrations");
    EngageEngine::new(store, EngageConfig::default(), EngageClock::fixed(ts(now)))
}

fn view(user_id: &str, card_id: &str, duration: i64) -> TrackEngagement {
    TrackEngagement {
        user_id: user_id.to_string(),
        card_id: card_id.to_string(),
        kind: EngagementKind::CardView,
        duration: Some(duration),
        is_complete: false,
        day: None,
        card_type: Some(CardType::CurrentAffairs),
    }
}

fn attempt(user_id: &str, card_id: &str, correct: bool) -> TrackEngagement {
    TrackEngagement {
        user_id: user_id.to_string(),
        card_id: card_id.to_string(),
        kind: EngagementKind::McqAttempt,
        duration: None,
        is_complete: correct,
        day: None,
        card_type: Some(CardType::Mcq),
    }
}

/// One 25-second view qualifies the day on its own.
#[test]
fn qualifying_view_marks_day_present() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let status = engine.track_engagement(view("u1", "ca-1", 25)).unwrap();
    assert!(status.is_present);
    assert_eq!(status.card_view_count, 1);
    assert_eq!(status.mcq_attempt_count, 0);
    assert_eq!(status.total_engagement_duration, 25);
}

/// A view below the 20-second bar counts for duration but not presence.
#[test]
fn short_view_does_not_mark_present() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let status = engine.track_engagement(view("u1", "ca-1", 10)).unwrap();
    assert!(!status.is_present);
    assert_eq!(status.card_view_count, 0);
    assert_eq!(status.total_engagement_duration, 10);
}

/// Three attempts with one correct is 33.33% — below the 50% bar.
#[test]
fn low_accuracy_quiz_day_is_absent() {
    let engine = build_at("2024-06-12T09:00:00Z");

    engine.track_engagement(attempt("u1", "m1", true)).unwrap();
    engine.track_engagement(attempt("u1", "m2", false)).unwrap();
    let status = engine.track_engagement(attempt("u1", "m3", false)).unwrap();

    assert_eq!(status.mcq_attempt_count, 3);
    assert_eq!(status.mcq_correct_count, 1);
    assert_eq!(status.mcq_accuracy, 33.33);
    assert!(!status.is_present, "33.33% accuracy is below the bar");
}

/// Two attempts with one correct is exactly 50% — the bar is inclusive.
#[test]
fn half_accuracy_quiz_day_is_present() {
    let engine = build_at("2024-06-12T09:00:00Z");

    engine.track_engagement(attempt("u1", "m1", true)).unwrap();
    let status = engine.track_engagement(attempt("u1", "m2", false)).unwrap();

    assert_eq!(status.mcq_accuracy, 50.0);
    assert!(status.is_present);
}

/// Submitting the same view twice doubles the counters and the duration —
/// the rollup sums whatever rows exist — but presence does not flip back.
#[test]
fn duplicate_submission_doubles_counts_not_presence() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let first = engine.track_engagement(view("u1", "ca-1", 25)).unwrap();
    let second = engine.track_engagement(view("u1", "ca-1", 25)).unwrap();

    assert!(first.is_present && second.is_present);
    assert_eq!(second.card_view_count, 2);
    assert_eq!(second.total_engagement_duration, 50);

    let stored = engine
        .store
        .daily_status_for_day("u1", date("2024-06-12"))
        .unwrap()
        .expect("status row exists");
    assert_eq!(stored, second, "the stored row matches the last rollup");
}

/// An explicit day parameter routes the engagement to that calendar day.
#[test]
fn explicit_day_routes_to_that_day() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let mut req = view("u1", "ca-1", 30);
    req.day = Some(date("2024-06-10"));
    let status = engine.track_engagement(req).unwrap();

    assert_eq!(status.day, date("2024-06-10"));
    assert!(engine
        .store
        .daily_status_for_day("u1", date("2024-06-12"))
        .unwrap()
        .is_none(),
        "today gets no row");
    assert!(engine
        .store
        .daily_status_for_day("u1", date("2024-06-10"))
        .unwrap()
        .is_some());
}

/// Negative durations are rejected before anything is written.
#[test]
fn negative_duration_is_rejected_before_write() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let err = engine.track_engagement(view("u1", "ca-1", -5)).unwrap_err();
    assert!(
        matches!(err, EngageError::InvalidDuration { value: -5 }),
        "unexpected error: {err}"
    );
    assert!(engine
        .store
        .daily_status_for_day("u1", date("2024-06-12"))
        .unwrap()
        .is_none(),
        "no rollup row after a rejected write");
}

/// Providers are probed in registration order; the first match wins.
#[test]
fn card_type_inference_respects_provider_order() {
    let mut engine = build_at("2024-06-12T09:00:00Z");
    engine.register_provider(Box::new(StaticContentProvider::new(
        "current-affairs",
        CardType::CurrentAffairs,
        ["shared-id"],
    )));
    engine.register_provider(Box::new(StaticContentProvider::new(
        "general-knowledge",
        CardType::GeneralKnowledge,
        ["shared-id", "gk-1"],
    )));

    let mut req = view("u1", "shared-id", 25);
    req.card_type = None;
    engine.track_engagement(req).unwrap();

    let mut req = view("u1", "gk-1", 25);
    req.card_type = None;
    engine.track_engagement(req).unwrap();

    let rows = engine
        .store
        .digest_rows_for_day("u1", date("2024-06-12"))
        .unwrap();
    assert_eq!(rows[0].card_type, CardType::CurrentAffairs, "first provider wins");
    assert_eq!(rows[1].card_type, CardType::GeneralKnowledge);
}

/// With no provider claiming the id, the configured default applies.
#[test]
fn card_type_falls_back_to_default() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let mut req = view("u1", "mystery-card", 25);
    req.card_type = None;
    engine.track_engagement(req).unwrap();

    let rows = engine
        .store
        .digest_rows_for_day("u1", date("2024-06-12"))
        .unwrap();
    assert_eq!(rows[0].card_type, CardType::CurrentAffairs);
}
