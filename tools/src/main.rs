//! engage-runner: headless demo/ops runner for the engagement engine.
//!
//! Seeds a deterministic population of activity and engagement into a
//! database, then prints the derived views back out.
//!
//! Usage:
//!   engage-runner --seed 12345 --users 8 --days 30 --db demo.db
//!   engage-runner --seed 12345 --config engage.json --end-day 2024-06-12

use anyhow::Result;
use chrono::{Days, NaiveDate, NaiveTime};
use engage_core::{
    clock::{self, EngageClock},
    config::EngageConfig,
    content::{CardType, StaticContentProvider},
    engagement_subsystem::{EngagementKind, TrackEngagement},
    engine::EngageEngine,
    event::EventKind,
    store::EngageStore,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::env;
use std::path::Path;

const DEMO_NAMES: &[&str] = &[
    "Maya Patel", "Arjun Rao", "Sofia Alvarez", "Liam Chen", "Amara Okafor",
    "Noah Fischer", "Priya Nair", "Lucas Moreau", "Hana Sato", "Omar Haddad",
];

const CA_CARDS: &[&str] = &["ca-101", "ca-102", "ca-103", "ca-104"];
const GK_CARDS: &[&str] = &["gk-201", "gk-202", "gk-203"];
const MCQ_CARDS: &[&str] = &["mcq-301", "mcq-302", "mcq-303", "mcq-304"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let users = parse_arg(&args, "--users", 6usize);
    let days = parse_arg(&args, "--days", 45u64);
    let limit = parse_arg(&args, "--limit", 10u32);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());
    // --end-day pins the clock so repeated runs seed identical windows.
    let end_day = args
        .windows(2)
        .find(|w| w[0] == "--end-day")
        .map(|w| clock::parse_day(&w[1]))
        .transpose()?;

    println!("engage-runner");
    println!("  seed:   {seed}");
    println!("  users:  {users}");
    println!("  days:   {days}");
    println!("  db:     {db}");
    println!();

    let store = if db == ":memory:" {
        EngageStore::in_memory()?
    } else {
        EngageStore::open(db)?
    };
    store.migrate()?;

    let config = match config_path {
        Some(p) => EngageConfig::load(Path::new(p))?,
        None => EngageConfig::default(),
    };

    let clock = match end_day {
        Some(day) => EngageClock::fixed(day.and_time(NaiveTime::MIN).and_utc()),
        None => EngageClock::system(),
    };
    let today = clock.today();

    let mut engine = EngageEngine::new(store, config, clock);
    engine.register_provider(Box::new(StaticContentProvider::new(
        "current-affairs",
        CardType::CurrentAffairs,
        CA_CARDS.iter().copied(),
    )));
    engine.register_provider(Box::new(StaticContentProvider::new(
        "general-knowledge",
        CardType::GeneralKnowledge,
        GK_CARDS.iter().copied(),
    )));
    engine.register_provider(Box::new(StaticContentProvider::new(
        "mcq",
        CardType::Mcq,
        MCQ_CARDS.iter().copied(),
    )));

    let user_ids = seed_population(&engine, seed, users, days, today)?;

    for user_id in &user_ids {
        engine.compute_total_score(user_id)?;
        engine.weekly_score(user_id)?;
        engine.monthly_score(user_id)?;
        let granted = engine.check_badge_eligibility(user_id)?;
        if !granted.is_empty() {
            log::info!(
                "user={user_id} earned: {}",
                granted
                    .iter()
                    .map(|b| b.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    print_summary(&engine, &user_ids, limit)?;
    Ok(())
}

/// Deterministic demo activity: same seed, same database.
fn seed_population(
    engine: &EngageEngine,
    seed: u64,
    users: usize,
    days: u64,
    today: NaiveDate,
) -> Result<Vec<String>> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let user_ids: Vec<String> = (0..users).map(|i| format!("user-{i:03}")).collect();
    for (i, user_id) in user_ids.iter().enumerate() {
        engine.upsert_profile(user_id, DEMO_NAMES[i % DEMO_NAMES.len()])?;
    }

    for offset in (0..days).rev() {
        let day = today - Days::new(offset);
        for user_id in &user_ids {
            if !rng.gen_bool(0.75) {
                continue; // user skipped this day entirely
            }
            let at = day.and_time(NaiveTime::MIN).and_utc();
            engine.record_event_at(user_id, EventKind::Login, None, at)?;

            for _ in 0..rng.gen_range(0..3) {
                let card = if rng.gen_bool(0.7) {
                    CA_CARDS[rng.gen_range(0..CA_CARDS.len())]
                } else {
                    GK_CARDS[rng.gen_range(0..GK_CARDS.len())]
                };
                engine.track_engagement(TrackEngagement {
                    user_id: user_id.clone(),
                    card_id: card.to_string(),
                    kind: EngagementKind::CardView,
                    duration: Some(rng.gen_range(5..90)),
                    is_complete: false,
                    day: Some(day),
                    card_type: None,
                })?;
                engine.record_event_at(user_id, EventKind::ContentView, None, at)?;
            }

            if rng.gen_bool(0.5) {
                for _ in 0..rng.gen_range(1..4) {
                    let card = MCQ_CARDS[rng.gen_range(0..MCQ_CARDS.len())];
                    let correct = rng.gen_bool(0.6);
                    engine.track_engagement(TrackEngagement {
                        user_id: user_id.clone(),
                        card_id: card.to_string(),
                        kind: EngagementKind::McqAttempt,
                        duration: None,
                        is_complete: correct,
                        day: Some(day),
                        card_type: None,
                    })?;
                    engine.record_event_at(user_id, EventKind::QuizAttempt, None, at)?;
                    if correct {
                        engine.record_event_at(user_id, EventKind::QuizCorrect, None, at)?;
                    }
                }
            }

            if rng.gen_bool(0.2) {
                engine.record_event_at(
                    user_id,
                    EventKind::SocialPost,
                    Some(serde_json::json!({ "source": "demo-feed" })),
                    at,
                )?;
            }
            if rng.gen_bool(0.1) {
                engine.record_event_at(user_id, EventKind::Connection, None, at)?;
            }
        }
    }

    Ok(user_ids)
}

fn print_summary(engine: &EngageEngine, user_ids: &[String], limit: u32) -> Result<()> {
    println!("=== LEADERBOARD (top {limit}) ===");
    for entry in engine.leaderboard(limit)? {
        let name = entry.display_name.unwrap_or_else(|| entry.user_id.clone());
        println!(
            "  #{:<2} {:<16} {:>6} pts  ({})",
            entry.rank, name, entry.total_score, entry.user_id
        );
    }

    if let Some(first) = user_ids.first() {
        println!();
        println!("=== WEEKLY METER: {first} ===");
        let meter = engine.weekly_meter(first)?;
        for d in &meter.days {
            println!(
                "  {}  {}  views={} attempts={} accuracy={:.1}%",
                d.day,
                if d.is_present { "present" } else { "   -   " },
                d.card_view_count,
                d.mcq_attempt_count,
                d.mcq_accuracy
            );
        }
        println!("  days completed: {}/7", meter.days_completed);
    }

    println!();
    println!("=== BADGES ===");
    for user_id in user_ids {
        let status = engine.badge_status(user_id)?;
        let grants = engine.my_badges(user_id)?;
        let score = engine.get_score(user_id)?;
        println!(
            "  {user_id}: tier={} days_active={} score={} badges=[{}]",
            status.current_badge.as_deref().unwrap_or("none"),
            status.days_active,
            score.total_score,
            grants
                .iter()
                .map(|g| g.badge_id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
