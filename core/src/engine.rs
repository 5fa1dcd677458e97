//! The engine facade — wires the store, clock, config, and content
//! providers into the API surface the backend exposes.
//!
//! RULES:
//!   - Every operation is synchronous, triggered by an inbound call.
//!   - Data is user-partitioned; operations on different users never
//!     contend. Within one user the per-day rollup is the only write
//!     contention point, and it self-corrects on the next write.
//!   - Upstream feature modules emit activity through `record_event`; the
//!     engine never mutates the event log beyond appending there.

use crate::{
    badge_subsystem::{Badge, BadgeGrant, BadgeProgress, BadgeStatus, BadgeSubsystem},
    clock::EngageClock,
    config::EngageConfig,
    content::ContentProvider,
    engagement_subsystem::{DailyStatus, EngagementSubsystem, TrackEngagement},
    error::EngageResult,
    event::{ActivityEvent, EventKind},
    meter_subsystem::{MeterSubsystem, WeeklyMeter},
    score_subsystem::{LeaderboardEntry, ScoreSubsystem, UserScore},
    store::EngageStore,
};

pub struct EngageEngine {
    pub store: EngageStore,
    clock: EngageClock,
    providers: Vec<Box<dyn ContentProvider>>,
    scores: ScoreSubsystem,
    engagement: EngagementSubsystem,
    meter: MeterSubsystem,
    badges: BadgeSubsystem,
}

impl EngageEngine {
    /// Build a fully wired engine over an opened (and migrated) store.
    pub fn new(store: EngageStore, config: EngageConfig, clock: EngageClock) -> Self {
        Self {
            scores: ScoreSubsystem::new(&config),
            engagement: EngagementSubsystem::new(&config),
            meter: MeterSubsystem::new(),
            badges: BadgeSubsystem::new(&config),
            providers: Vec::new(),
            store,
            clock,
        }
    }

    /// Register a content provider. Call in probe-priority order.
    pub fn register_provider(&mut self, provider: Box<dyn ContentProvider>) {
        self.providers.push(provider);
    }

    // ── Collaborator hooks ─────────────────────────────────────

    /// Append an activity event stamped with the engine clock.
    pub fn record_event(
        &self,
        user_id: &str,
        kind: EventKind,
        metadata: Option<serde_json::Value>,
    ) -> EngageResult<ActivityEvent> {
        self.record_event_at(user_id, kind, metadata, self.clock.now())
    }

    /// Append an activity event with an explicit timestamp. `created_at` is
    /// authoritative, so late or out-of-order arrivals land in the right
    /// window.
    pub fn record_event_at(
        &self,
        user_id: &str,
        kind: EventKind,
        metadata: Option<serde_json::Value>,
        at: chrono::DateTime<chrono::Utc>,
    ) -> EngageResult<ActivityEvent> {
        self.store.upsert_user(user_id, None)?;
        let mut event = ActivityEvent::new(user_id, kind, at);
        if let Some(m) = metadata {
            event = event.with_metadata(m);
        }
        self.store.append_event(&event)?;
        Ok(event)
    }

    pub fn upsert_profile(&self, user_id: &str, display_name: &str) -> EngageResult<()> {
        self.store.upsert_user(user_id, Some(display_name))
    }

    // ── Score ──────────────────────────────────────────────────

    pub fn get_score(&self, user_id: &str) -> EngageResult<UserScore> {
        self.scores.get_score(&self.store, user_id, self.clock.now())
    }

    pub fn compute_total_score(&self, user_id: &str) -> EngageResult<i64> {
        self.scores
            .compute_total_score(&self.store, user_id, self.clock.now())
    }

    pub fn weekly_score(&self, user_id: &str) -> EngageResult<i64> {
        self.scores
            .compute_weekly_score(&self.store, user_id, self.clock.now())
    }

    pub fn monthly_score(&self, user_id: &str) -> EngageResult<i64> {
        self.scores
            .compute_monthly_score(&self.store, user_id, self.clock.now())
    }

    pub fn leaderboard(&self, limit: u32) -> EngageResult<Vec<LeaderboardEntry>> {
        self.scores.leaderboard(&self.store, limit)
    }

    // ── Engagement ─────────────────────────────────────────────

    pub fn track_engagement(&self, req: TrackEngagement) -> EngageResult<DailyStatus> {
        self.engagement
            .track(&self.store, &self.providers, req, self.clock.today())
    }

    pub fn weekly_meter(&self, user_id: &str) -> EngageResult<WeeklyMeter> {
        self.meter
            .weekly_meter(&self.store, user_id, self.clock.today())
    }

    // ── Badges ─────────────────────────────────────────────────

    pub fn badge_status(&self, user_id: &str) -> EngageResult<BadgeStatus> {
        self.badges.badge_status(&self.store, user_id, self.clock.now())
    }

    pub fn list_badges(&self) -> EngageResult<Vec<Badge>> {
        self.store.all_badges()
    }

    pub fn my_badges(&self, user_id: &str) -> EngageResult<Vec<BadgeGrant>> {
        self.store.user_badges(user_id)
    }

    pub fn check_badge_eligibility(&self, user_id: &str) -> EngageResult<Vec<Badge>> {
        self.badges
            .check_eligibility(&self.store, &self.scores, user_id, self.clock.now())
    }

    pub fn badge_progress(&self, user_id: &str, badge_id: &str) -> EngageResult<BadgeProgress> {
        self.badges
            .progress(&self.store, &self.scores, user_id, badge_id, self.clock.now())
    }
}
