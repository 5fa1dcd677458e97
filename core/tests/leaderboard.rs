//! Leaderboard tests.
//!
//! Tests cover: descending order, deterministic tie-breaking, the limit,
//! and the profile join.

use chrono::{DateTime, Utc};
use engage_core::{
    clock::EngageClock,
    config::EngageConfig,
    engine::EngageEngine,
    event::EventKind,
    store::EngageStore,
};

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid test timestamp")
        .with_timezone(&Utc)
}

fn build_at(now: &str) -> EngageEngine {
    let store = EngageStore::in_memory().expect("open in-memory store");
    store.migrate().expect("apply migrations");
    EngageEngine::new(store, EngageConfig::default(), EngageClock::fixed(ts(now)))
}

fn give_logins(engine: &EngageEngine, user_id: &str, n: usize) {
    for _ in 0..n {
        engine.record_event(user_id, EventKind::Login, None).unwrap();
    }
    // The leaderboard reads the cache; materialize it.
    engine.compute_total_score(user_id).unwrap();
}

#[test]
fn orders_by_total_descending() {
    let engine = build_at("2024-06-12T09:00:00Z");

    give_logins(&engine, "alice", 3);
    give_logins(&engine, "bob", 5);
    give_logins(&engine, "carol", 1);

    let board = engine.leaderboard(10).unwrap();
    let order: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(order, vec!["bob", "alice", "carol"]);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].total_score, 50);
    assert_eq!(board[2].rank, 3);
}

/// Equal totals order by user id ascending, so repeated reads agree.
#[test]
fn ties_break_by_user_id() {
    let engine = build_at("2024-06-12T09:00:00Z");

    give_logins(&engine, "zoe", 2);
    give_logins(&engine, "amy", 2);

    let board = engine.leaderboard(10).unwrap();
    let order: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(order, vec!["amy", "zoe"]);
}

#[test]
fn limit_caps_the_result() {
    let engine = build_at("2024-06-12T09:00:00Z");

    for (user, n) in [("u1", 1), ("u2", 2), ("u3", 3), ("u4", 4)] {
        give_logins(&engine, user, n);
    }

    let board = engine.leaderboard(2).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, "u4");
}

#[test]
fn display_name_joins_from_the_profile() {
    let engine = build_at("2024-06-12T09:00:00Z");

    give_logins(&engine, "u1", 1);
    engine.upsert_profile("u1", "Maya Patel").unwrap();
    give_logins(&engine, "u2", 1);

    let board = engine.leaderboard(10).unwrap();
    let maya = board.iter().find(|e| e.user_id == "u1").unwrap();
    assert_eq!(maya.display_name.as_deref(), Some("Maya Patel"));

    let anon = board.iter().find(|e| e.user_id == "u2").unwrap();
    assert_eq!(anon.display_name, None, "no profile means no name");
}
