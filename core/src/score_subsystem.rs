//! Score subsystem — weighted point totals over the activity event log.
//!
//! Every total is a full recomputation: the store groups the user's events
//! by kind, the weight table folds the counts, and the result overwrites the
//! cached `user_score` row. O(event count), idempotent, safe to repeat.
//! The cache is a read model, not a source of truth — `computed_at` stamps
//! it and the TTL policy decides when a read recomputes first.

use crate::{
    clock,
    config::EngageConfig,
    error::EngageResult,
    store::EngageStore,
    types::UserId,
    weights::WeightTable,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The cached score row, one per user, lazily created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserScore {
    pub user_id: UserId,
    pub total_score: i64,
    pub weekly_score: i64,
    pub monthly_score: i64,
    pub computed_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub total_score: i64,
}

pub struct ScoreSubsystem {
    weights: WeightTable,
    cache_ttl_secs: i64,
}

impl ScoreSubsystem {
    pub fn new(config: &EngageConfig) -> Self {
        Self {
            weights: WeightTable::from_config(config),
            cache_ttl_secs: config.score_cache_ttl_secs,
        }
    }

    /// Recompute the all-time total from the event log and overwrite the
    /// cached value. A store failure propagates before any write, so the
    /// previous cached row survives a failed recompute.
    pub fn compute_total_score(
        &self,
        store: &EngageStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<i64> {
        let counts = store.event_kind_counts(user_id)?;
        let total = self.weights.weighted_total(&counts);
        store.upsert_total_score(user_id, total, now.timestamp())?;
        log::debug!("user={user_id} score: total recomputed to {total}");
        Ok(total)
    }

    /// Serve the cached row, recomputing first when it is absent or older
    /// than the configured TTL. TTL 0 recomputes on every read.
    pub fn get_score(
        &self,
        store: &EngageStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<UserScore> {
        if let Some(cached) = store.get_user_score(user_id)? {
            let fresh = self.cache_ttl_secs > 0
                && now.timestamp() - cached.computed_at < self.cache_ttl_secs;
            if fresh {
                return Ok(cached);
            }
        }
        self.compute_total_score(store, user_id, now)?;
        let row = store.get_user_score(user_id)?;
        Ok(row.unwrap_or_else(|| UserScore {
            user_id: user_id.to_string(),
            total_score: 0,
            weekly_score: 0,
            monthly_score: 0,
            computed_at: now.timestamp(),
        }))
    }

    /// Weighted sum over events since the most recent start-of-week
    /// (Sunday 00:00:00 UTC). Overwrites the cached weekly field.
    pub fn compute_weekly_score(
        &self,
        store: &EngageStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<i64> {
        let start = clock::day_start_ts(clock::start_of_week(now.date_naive()));
        let counts = store.event_kind_counts_since(user_id, start)?;
        let score = self.weights.weighted_total(&counts);
        store.update_weekly_score(user_id, score)?;
        Ok(score)
    }

    /// Weighted sum over events since day 1 of the current month at
    /// 00:00:00 UTC. Overwrites the cached monthly field.
    pub fn compute_monthly_score(
        &self,
        store: &EngageStore,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> EngageResult<i64> {
        let start = clock::day_start_ts(clock::start_of_month(now.date_naive()));
        let counts = store.event_kind_counts_since(user_id, start)?;
        let score = self.weights.weighted_total(&counts);
        store.update_monthly_score(user_id, score)?;
        Ok(score)
    }

    /// Top `limit` cached totals. Ties order by user id ascending so the
    /// ranking is stable across reads.
    pub fn leaderboard(
        &self,
        store: &EngageStore,
        limit: u32,
    ) -> EngageResult<Vec<LeaderboardEntry>> {
        store.leaderboard(limit)
    }
}
