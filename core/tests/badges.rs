//! Badge subsystem tests.
//!
//! Tests cover: the tier ladder over the trailing window, achievement
//! eligibility (OR semantics, streaks, event counts), grant idempotence,
//! and per-badge progress.

use chrono::{DateTime, Days, NaiveDate, Utc};
use engage_core::{
    badge_subsystem::{Badge, BadgeCriteria},
    clock::EngageClock,
    config::EngageConfig,
    engagement_subsystem::DailyStatus,
    engine::EngageEngine,
    error::EngageError,
    event::EventKind,
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

fn present_status(user_id: &str, day: NaiveDate) -> DailyStatus {
    DailyStatus {
        user_id: user_id.to_string(),
        day,
        is_present: true,
        card_view_count: 1,
        mcq_attempt_count: 0,
        mcq_correct_count: 0,
        mcq_accuracy: 0.0,
        total_engagement_duration: 30,
    }
}

/// Seed `n` consecutive present days ending at `end`.
fn seed_present_days(engine: &EngageEngine, user_id: &str, n: u64, end: NaiveDate) {
    for offset in 0..n {
        engine
            .store
            .upsert_daily_status(&present_status(user_id, end - Days::new(offset)))
            .expect("seed status row");
    }
}

#[test]
fn tier_ladder_is_monotonic_at_the_boundaries() {
    let today = date("2024-06-12");
    for (days, expected) in [
        (29u64, None),
        (30, Some("rookie")),
        (179, Some("champion")),
        (180, Some("legend")),
    ] {
        let engine = build_at("2024-06-12T09:00:00Z");
        seed_present_days(&engine, "u1", days, today);

        let status = engine.badge_status("u1").unwrap();
        assert_eq!(status.days_active, days as i64);
        assert_eq!(
            status.current_badge.as_deref(),
            expected,
            "{days} present days"
        );
    }
}

/// Present days older than the trailing window do not count.
#[test]
fn tier_window_is_trailing_180_days() {
    let engine = build_at("2024-06-12T09:00:00Z");
    let today = date("2024-06-12");

    // 30 present days, all of them well outside the window.
    seed_present_days(&engine, "u1", 30, today - Days::new(200));

    let status = engine.badge_status("u1").unwrap();
    assert_eq!(status.days_active, 0);
    assert_eq!(status.current_badge, None);
}

/// The tier result is cached with a calculation timestamp.
#[test]
fn badge_status_persists_the_cache_row() {
    let engine = build_at("2024-06-12T09:00:00Z");
    seed_present_days(&engine, "u1", 35, date("2024-06-12"));

    let status = engine.badge_status("u1").unwrap();
    let cached = engine
        .store
        .get_badge_status("u1")
        .unwrap()
        .expect("cache row written");
    assert_eq!(cached, status);
    assert_eq!(cached.last_calculated_at, ts("2024-06-12T09:00:00Z").timestamp());
}

/// A satisfied score criterion grants once; the second check is a no-op.
#[test]
fn badge_grants_are_idempotent() {
    let engine = build_at("2024-06-12T09:00:00Z");

    // 4 social posts = 120 points, clearing first-steps (100).
    for _ in 0..4 {
        engine
            .record_event("u1", EventKind::SocialPost, None)
            .unwrap();
    }

    let first = engine.check_badge_eligibility("u1").unwrap();
    assert!(
        first.iter().any(|b| b.id == "first-steps"),
        "first check grants first-steps"
    );

    let second = engine.check_badge_eligibility("u1").unwrap();
    assert!(
        second.is_empty(),
        "second check must grant nothing new, got {:?}",
        second.iter().map(|b| b.id.as_str()).collect::<Vec<_>>()
    );

    let grants = engine.my_badges("u1").unwrap();
    assert_eq!(
        grants.iter().filter(|g| g.badge_id == "first-steps").count(),
        1,
        "exactly one grant row"
    );
}

/// Any single criterion is enough — 10 connections satisfy connector's
/// event-count criterion regardless of the rest.
#[test]
fn eligibility_is_or_across_criteria() {
    let engine = build_at("2024-06-12T09:00:00Z");

    for _ in 0..10 {
        engine
            .record_event("u1", EventKind::Connection, None)
            .unwrap();
    }

    let granted = engine.check_badge_eligibility("u1").unwrap();
    assert!(
        granted.iter().any(|b| b.id == "connector"),
        "10 connection events satisfy connector"
    );
}

/// Seven consecutive present days satisfy the streak badge.
#[test]
fn streak_badge_needs_consecutive_days() {
    let engine = build_at("2024-06-12T09:00:00Z");
    seed_present_days(&engine, "u1", 7, date("2024-06-12"));

    let granted = engine.check_badge_eligibility("u1").unwrap();
    assert!(
        granted.iter().any(|b| b.id == "week-streak"),
        "7 consecutive present days satisfy week-streak"
    );
}

/// A gap resets the streak even when the total present-day count is enough.
#[test]
fn gapped_days_do_not_form_a_streak() {
    let engine = build_at("2024-06-12T09:00:00Z");
    let today = date("2024-06-12");

    // 3 consecutive days ending today, then a gap, then 4 older days.
    seed_present_days(&engine, "u1", 3, today);
    seed_present_days(&engine, "u1", 4, today - Days::new(4));

    let granted = engine.check_badge_eligibility("u1").unwrap();
    assert!(
        !granted.iter().any(|b| b.id == "week-streak"),
        "a gapped run of 7 present days is not a 7-day streak"
    );
}

/// An unknown badge id is a client error, not a silent empty result.
#[test]
fn progress_for_unknown_badge_is_not_found() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let err = engine
        .badge_progress("u1", "no-such-badge")
        .unwrap_err();
    assert!(
        matches!(err, EngageError::BadgeNotFound { ref id } if id == "no-such-badge"),
        "unexpected error: {err}"
    );
}

/// Progress reports the current value against each criterion's target.
#[test]
fn progress_reports_partial_completion() {
    let engine = build_at("2024-06-12T09:00:00Z");

    // 45 points of 100 needed for first-steps.
    engine.record_event("u1", EventKind::Login, None).unwrap();
    engine.record_event("u1", EventKind::Login, None).unwrap();
    engine
        .record_event("u1", EventKind::QuizCorrect, None)
        .unwrap();

    let progress = engine
        .badge_progress("u1", "first-steps")
        .unwrap();
    assert!(!progress.earned);
    assert_eq!(progress.percent, 45.0);
    assert_eq!(progress.criteria.len(), 1);
    assert_eq!(progress.criteria[0].metric, "score");
    assert_eq!(progress.criteria[0].current, 45);
    assert_eq!(progress.criteria[0].target, 100);
}

/// An earned badge reports 100% regardless of current counters.
#[test]
fn progress_of_earned_badge_is_complete() {
    let engine = build_at("2024-06-12T09:00:00Z");

    for _ in 0..4 {
        engine
            .record_event("u1", EventKind::SocialPost, None)
            .unwrap();
    }
    engine.check_badge_eligibility("u1").unwrap();

    let progress = engine
        .badge_progress("u1", "first-steps")
        .unwrap();
    assert!(progress.earned);
    assert_eq!(progress.percent, 100.0);
}

/// A catalog badge with several criteria needs only one of them satisfied.
#[test]
fn custom_badge_grants_on_any_single_criterion() {
    let engine = build_at("2024-06-12T09:00:00Z");
    engine
        .store
        .insert_badge(&Badge {
            id: "night-owl".to_string(),
            name: "Night Owl".to_string(),
            tier: "gold".to_string(),
            criteria: BadgeCriteria {
                min_score: Some(1_000_000),
                min_streak_days: None,
                event_kind: Some("login".to_string()),
                min_event_count: Some(3),
            },
        })
        .unwrap();

    for _ in 0..3 {
        engine.record_event("u1", EventKind::Login, None).unwrap();
    }

    let granted = engine.check_badge_eligibility("u1").unwrap();
    assert!(
        granted.iter().any(|b| b.id == "night-owl"),
        "3 logins satisfy the event-count criterion even with the score criterion far off"
    );
}

/// The seeded catalog is readable and the listing is stable.
#[test]
fn catalog_lists_seeded_badges() {
    let engine = build_at("2024-06-12T09:00:00Z");

    let badges = engine.list_badges().unwrap();
    assert!(badges.len() >= 8, "seeded catalog present, got {}", badges.len());
    assert!(badges.iter().any(|b| b.id == "first-steps"));
    assert!(badges.iter().any(|b| b.id == "quiz-machine"));
}
